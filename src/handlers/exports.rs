// src/handlers/exports.rs

// Arquivos gerados por requisição e devolvidos direto na resposta.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{db_utils::get_scoped_connection, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::reports::{ReportFilter, ReportFilterParams},
    services::{
        export_service::{reports_csv, CsvLayout},
        report_service::{period_label, ReportScope},
    },
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportIdsPayload {
    /// Intervenções a juntar num único PDF, na ordem pedida
    pub ids: Vec<i32>,
}

/// "interventi_03_2024_<id>.csv"; sem período, só o id gerado.
pub fn export_filename(prefix: &str, period: Option<String>, extension: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match period {
        Some(period) => format!("{prefix}_{period}_{}.{extension}", &id[..8]),
        None => format!("{prefix}_{id}.{extension}"),
    }
}

fn attachment(content_type: &'static str, filename: String, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        [(header::CONTENT_TYPE, content_type.to_string()), (header::CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/reports/export/csv",
    tag = "Exports",
    params(ReportFilterParams),
    responses((status = 200, description = "CSV (';', vírgula decimal) com o total de horas", content_type = "text/csv")),
    security(("api_jwt" = []))
)]
pub async fn export_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<ReportFilterParams>,
) -> Result<Response, ApiError> {
    let filter = ReportFilter::try_from(params).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let scope = ReportScope::for_user(&user.0);
    let rows = app_state
        .report_service
        .list_reports(&mut *conn, scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // O layout segue o tipo efetivamente filtrado (inclusive o padrão configurado)
    let layout = CsvLayout::for_work_type(scope.criteria(&filter, Some(app_state.config.default_work_type)).work_type);
    let bytes = reports_csv(&rows, layout).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("📤 CSV exportado por {} ({} intervenções)", user.id(), rows.len());
    Ok(attachment(
        "text/csv; charset=utf-8",
        export_filename("interventi", period_label(&filter.period), "csv"),
        bytes,
    ))
}

#[utoipa::path(
    get,
    path = "/api/reports/export/pdf",
    tag = "Exports",
    params(ReportFilterParams),
    responses((status = 200, description = "PDF com uma página por intervenção", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn export_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<ReportFilterParams>,
) -> Result<Response, ApiError> {
    let filter = ReportFilter::try_from(params).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .report_service
        .list_reports(&mut *conn, ReportScope::for_user(&user.0), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = app_state
        .document_service
        .reports_pdf(rows)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment(
        "application/pdf",
        export_filename("interventi", period_label(&filter.period), "pdf"),
        bytes,
    ))
}

#[utoipa::path(
    post,
    path = "/api/reports/pdf",
    tag = "Exports",
    request_body = ReportIdsPayload,
    responses(
        (status = 200, description = "PDF combinado das intervenções escolhidas", content_type = "application/pdf"),
        (status = 403, description = "Alguma intervenção é de outro operador")
    ),
    security(("api_jwt" = []))
)]
pub async fn merged_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<ReportIdsPayload>,
) -> Result<Response, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .report_service
        .get_reports(&mut *conn, ReportScope::for_user(&user.0), &payload.ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = app_state
        .document_service
        .reports_pdf(rows)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment("application/pdf", export_filename("interventi", None, "pdf"), bytes))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/pdf",
    tag = "Exports",
    params(("id" = i32, Path, description = "ID da intervenção")),
    responses(
        (status = 200, description = "PDF da intervenção", content_type = "application/pdf"),
        (status = 404, description = "Intervenção não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn report_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let row = app_state
        .report_service
        .get_report(&mut *conn, ReportScope::for_user(&user.0), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bytes = app_state
        .document_service
        .reports_pdf(vec![row])
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment("application/pdf", format!("intervento_{id}.pdf"), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_carries_period_and_generated_id() {
        let name = export_filename("interventi", Some("03_2024".into()), "csv");
        assert!(name.starts_with("interventi_03_2024_"));
        assert!(name.ends_with(".csv"));
        assert_ne!(name, export_filename("interventi", Some("03_2024".into()), "csv"));
    }

    #[test]
    fn filename_without_period_is_just_the_id() {
        let name = export_filename("interventi", None, "pdf");
        assert_eq!(name.len(), "interventi_".len() + 32 + ".pdf".len());
    }
}
