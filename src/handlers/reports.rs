// src/handlers/reports.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_scoped_connection,
        error::{ApiError, AppError},
        query::optional_limit,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireAdmin},
    models::reports::{
        DailyHours, DailyHoursParams, Report, ReportFilter, ReportFilterParams, ReportPayload, ReportRow,
    },
    services::report_service::ReportScope,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Máximo de linhas; 0 ou ausente = todas
    #[serde(default, deserialize_with = "optional_limit")]
    pub limit: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "Reports",
    request_body = ReportPayload,
    responses(
        (status = 201, description = "Intervenção registrada", body = Report),
        (status = 400, description = "Máquina/comissão ou supervisor inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<ReportPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .report_service
        .create_report(&mut *conn, ReportScope::for_user(&user.0), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    params(LimitParams),
    responses((status = 200, description = "Todas as intervenções, mais recentes primeiro", body = [ReportRow])),
    security(("api_jwt" = []))
)]
pub async fn list_all_reports(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ReportRow>>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .report_service
        .list_all(&mut *conn, ReportScope::for_user(&user.0), params.limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

/// Tabela com ordenação (`sort_by`, `sort_order`) e os filtros comuns.
#[utoipa::path(
    get,
    path = "/api/reports/table",
    tag = "Reports",
    params(ReportFilterParams),
    responses((status = 200, description = "Intervenções ordenadas", body = [ReportRow])),
    security(("api_jwt" = []))
)]
pub async fn list_table(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<ReportFilterParams>,
) -> Result<Json<Vec<ReportRow>>, ApiError> {
    let filter = ReportFilter::try_from(params).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .report_service
        .list_table(&mut *conn, ReportScope::for_user(&user.0), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

/// Listagem mensal (`month`) ou por intervalo (`start_date` / `end_date`).
#[utoipa::path(
    get,
    path = "/api/reports/monthly",
    tag = "Reports",
    params(ReportFilterParams),
    responses(
        (status = 200, description = "Intervenções do período", body = [ReportRow]),
        (status = 400, description = "Data ou mês inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_monthly(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<ReportFilterParams>,
) -> Result<Json<Vec<ReportRow>>, ApiError> {
    let filter = ReportFilter::try_from(params).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .report_service
        .list_reports(&mut *conn, ReportScope::for_user(&user.0), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/reports/months",
    tag = "Reports",
    params(ReportFilterParams),
    responses((status = 200, description = "Meses distintos (MM/AAAA), em ordem cronológica", body = [String])),
    security(("api_jwt" = []))
)]
pub async fn list_months(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<ReportFilterParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let filter = ReportFilter::try_from(params).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let months = app_state
        .report_service
        .months(&mut *conn, ReportScope::for_user(&user.0), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(months))
}

#[utoipa::path(
    get,
    path = "/api/reports/daily-hours",
    tag = "Reports",
    params(DailyHoursParams),
    responses((status = 200, description = "Uma entrada por dia do mês", body = [DailyHours])),
    security(("api_jwt" = []))
)]
pub async fn daily_hours(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Query(params): Query<DailyHoursParams>,
) -> Result<Json<Vec<DailyHours>>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let days = app_state
        .report_service
        .daily_hours(&mut *conn, ReportScope::for_user(&user.0), &params.month, params.operator_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(days))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = i32, Path, description = "ID da intervenção")),
    responses(
        (status = 200, description = "Intervenção", body = ReportRow),
        (status = 403, description = "Intervenção de outro operador"),
        (status = 404, description = "Intervenção não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<ReportRow>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let row = app_state
        .report_service
        .get_report(&mut *conn, ReportScope::for_user(&user.0), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(row))
}

#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    tag = "Reports",
    request_body = ReportPayload,
    params(("id" = i32, Path, description = "ID da intervenção")),
    responses(
        (status = 200, description = "Intervenção atualizada", body = Report),
        (status = 403, description = "Intervenção de outro operador")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<ReportPayload>,
) -> Result<Json<Report>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .report_service
        .update_report(&mut *conn, ReportScope::for_user(&user.0), id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = i32, Path, description = "ID da intervenção")),
    responses(
        (status = 204, description = "Intervenção excluída"),
        (status = 403, description = "Intervenção de outro operador")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .report_service
        .delete_report(&mut *conn, ReportScope::for_user(&user.0), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
