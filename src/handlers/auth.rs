// src/handlers/auth.rs

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::{
    common::{
        db_utils::get_scoped_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        auth::{AuthResponse, ChangePasswordPayload, LoginUserPayload, User},
        reports::{ReportFilter, ReportFilterParams, ReportRow},
    },
    services::report_service::ReportScope,
};

// Handler de login
#[utoipa::path(
    post,
    path = "/api/auth/token",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token emitido", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let token = app_state
        .auth_service
        .login_user(payload.username.trim(), &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuthResponse::bearer(token)))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Me",
    responses((status = 200, description = "Usuário autenticado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// Filtros de /me: o operador é sempre quem chama, mesmo para admin
fn own_filter(params: ReportFilterParams, caller_id: i32) -> Result<ReportFilter, AppError> {
    let mut filter = ReportFilter::try_from(params)?;
    filter.operator_id = Some(caller_id);
    Ok(filter)
}

/// As intervenções do próprio usuário, com os mesmos filtros da listagem geral.
#[utoipa::path(
    get,
    path = "/api/me/reports",
    tag = "Me",
    params(ReportFilterParams),
    responses((status = 200, description = "Minhas intervenções", body = [ReportRow])),
    security(("api_jwt" = []))
)]
pub async fn my_reports(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<ReportFilterParams>,
) -> Result<Json<Vec<ReportRow>>, ApiError> {
    let filter = own_filter(params, user.id()).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

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

#[utoipa::path(
    get,
    path = "/api/me/months",
    tag = "Me",
    params(ReportFilterParams),
    responses((status = 200, description = "Meses com intervenções (MM/AAAA)", body = [String])),
    security(("api_jwt" = []))
)]
pub async fn my_months(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<ReportFilterParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let filter = own_filter(params, user.id()).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

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
    put,
    path = "/api/me/password",
    tag = "Me",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Senha alterada", body = User),
        (status = 400, description = "Senha atual incorreta")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<User>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .auth_service
        .change_password(&user, &payload.old_password, &payload.new_password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("🔒 Usuário {} trocou a senha", updated.id);
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_filter_keeps_client_and_forces_caller() {
        let params = ReportFilterParams {
            operator_id: Some(5),
            client_id: Some(3),
            ..Default::default()
        };
        let filter = own_filter(params, 42).unwrap();
        assert_eq!(filter.operator_id, Some(42));
        assert_eq!(filter.client_id, Some(3));
    }
}
