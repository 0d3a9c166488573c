// src/handlers/invoices.rs

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    services::invoice_service::invoice_to_csv,
};

/// Upload de uma fatura eletrônica (XML FatturaPA) devolvida como CSV.
#[utoipa::path(
    post,
    path = "/api/invoices/csv",
    tag = "Invoices",
    request_body(content_type = "multipart/form-data", description = "Campo `file` com o XML"),
    responses(
        (status = 200, description = "CSV normalizado da fatura", content_type = "text/csv"),
        (status = 400, description = "Arquivo ausente, grande demais, extensão errada ou XML ilegível")
    ),
    security(("api_jwt" = []))
)]
pub async fn invoice_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let (filename, bytes) = read_file(&mut multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let csv = invoice_to_csv(&filename, &bytes).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("🧾 Fatura '{}' convertida por {}", filename, user.id());
    let stem = filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(filename.as_str());
    let disposition = format!("attachment; filename=\"{stem}.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

async fn read_file(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(upload_error)?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(AppError::InvalidInvoice("campo 'file' ausente".to_string()))
}

fn upload_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::from_multipart("file", &err)
    } else {
        AppError::InvalidInvoice(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::DefaultBodyLimit, http::Request, routing::post, Router};
    use tower::ServiceExt;

    async fn read_upload(mut multipart: Multipart) -> StatusCode {
        match read_file(&mut multipart).await {
            Ok(_) => StatusCode::OK,
            Err(AppError::ValidationError(errors)) if errors.field_errors().contains_key("file") => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Err(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn upload(len: usize) -> Request<Body> {
        let mut body = b"--b\r\nContent-Disposition: form-data; name=\"file\"; filename=\"fattura.xml\"\r\n\r\n".to_vec();
        body.extend(vec![b' '; len]);
        body.extend(b"\r\n--b--\r\n");
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=b")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn xml_over_the_limit_is_a_size_error_not_a_parse_error() {
        let app = Router::new().route("/", post(read_upload)).layer(DefaultBodyLimit::max(1024));
        let response = app.oneshot(upload(4096)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let app = Router::new().route("/", post(read_upload)).layer(DefaultBodyLimit::max(64 * 1024));
        let response = app.oneshot(upload(4096)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
