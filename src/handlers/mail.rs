// src/handlers/mail.rs

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use validator::ValidateEmail;

use crate::{
    common::{
        db_utils::get_scoped_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireAdmin},
    services::{
        mail_service::{report_body, report_subject, OutgoingMail},
        report_service::ReportScope,
    },
};

// Campos do formulário: destinatário + arquivo anexo
#[derive(Debug, Default)]
struct EmailForm {
    email: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

impl EmailForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = EmailForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::from_multipart("file", &e))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "email" => {
                    let text = field.text().await.map_err(|e| AppError::from_multipart("email", &e))?;
                    form.email = Some(text.trim().to_string());
                }
                "file" => {
                    let filename = field.file_name().unwrap_or("intervento.pdf").to_string();
                    let bytes = field.bytes().await.map_err(|e| AppError::from_multipart("file", &e))?;
                    form.file = Some((filename, bytes.to_vec()));
                }
                _ => {}
            }
        }
        Ok(form)
    }

    fn into_parts(self) -> Result<(String, String, Vec<u8>), AppError> {
        let email = match self.email {
            Some(email) if email.validate_email() => email,
            Some(_) => return Err(AppError::field("email", "email")),
            None => return Err(AppError::field("email", "required")),
        };
        let (filename, bytes) = self.file.ok_or_else(|| AppError::field("file", "required"))?;
        Ok((email, filename, bytes))
    }
}

/// Envia a intervenção por e-mail ao cliente e marca a data de envio.
/// O envio roda em segundo plano: a resposta não espera o SMTP.
#[utoipa::path(
    post,
    path = "/api/reports/{id}/email",
    tag = "Reports",
    params(("id" = i32, Path, description = "ID da intervenção")),
    request_body(content_type = "multipart/form-data", description = "Campos `email` e `file`"),
    responses(
        (status = 202, description = "E-mail agendado; email_date registrado"),
        (status = 400, description = "E-mail ou arquivo ausente, ou arquivo acima do limite"),
        (status = 404, description = "Intervenção não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_report_email(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    let (to, attachment_name, attachment) = EmailForm::read(&mut multipart)
        .await
        .and_then(EmailForm::into_parts)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let row = app_state
        .report_service
        .get_report(&mut *conn, ReportScope::for_user(&user.0), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .report_service
        .mark_emailed(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state.mail_service.send_in_background(OutgoingMail {
        to,
        subject: report_subject(&row),
        body: report_body(&row, &app_state.config.mail.from_name),
        attachment_name,
        attachment,
    });

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::DefaultBodyLimit,
        http::{header, Request},
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "interventi-boundary";
    const THREE_MIB: usize = 3 * 1024 * 1024;

    // Lê o formulário como o handler faz e devolve o tamanho do anexo ou o código do erro
    async fn read_form(mut multipart: Multipart) -> (StatusCode, String) {
        match EmailForm::read(&mut multipart).await.and_then(EmailForm::into_parts) {
            Ok((_, _, bytes)) => (StatusCode::OK, bytes.len().to_string()),
            Err(AppError::ValidationError(errors)) => {
                let code = errors
                    .field_errors()
                    .get("file")
                    .and_then(|errors| errors.first())
                    .map(|error| error.code.to_string())
                    .unwrap_or_default();
                (StatusCode::BAD_REQUEST, code)
            }
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
        }
    }

    fn email_request(attachment_len: usize) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"email\"\r\n\r\ncliente@example.com\r\n\
             --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"interventi_03-2024.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend(vec![b'x'; attachment_len]);
        body.extend(format!("\r\n--{BOUNDARY}--\r\n").into_bytes());

        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, attachment_len: usize) -> (StatusCode, String) {
        let response = app.oneshot(email_request(attachment_len)).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn attachment_above_default_limit_is_accepted_with_configured_limit() {
        let app = Router::new()
            .route("/", post(read_form))
            .layer(DefaultBodyLimit::max(25 * 1024 * 1024));

        let (status, body) = send(app, THREE_MIB).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, THREE_MIB.to_string());
    }

    #[tokio::test]
    async fn oversized_attachment_is_reported_as_too_large() {
        let app = Router::new()
            .route("/", post(read_form))
            .layer(DefaultBodyLimit::max(1024 * 1024));

        let (status, body) = send(app, THREE_MIB).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "file_too_large");
    }

    #[test]
    fn form_requires_valid_email_and_file() {
        let form = EmailForm { email: Some("non-e-mail".into()), file: Some(("a.pdf".into(), vec![1])) };
        assert!(matches!(form.into_parts(), Err(AppError::ValidationError(_))));

        let form = EmailForm { email: Some("cliente@example.com".into()), file: None };
        assert!(matches!(form.into_parts(), Err(AppError::ValidationError(_))));

        let form = EmailForm {
            email: Some("cliente@example.com".into()),
            file: Some(("intervento_3.pdf".into(), vec![1, 2])),
        };
        let (to, name, bytes) = form.into_parts().unwrap();
        assert_eq!(to, "cliente@example.com");
        assert_eq!(name, "intervento_3.pdf");
        assert_eq!(bytes, vec![1, 2]);
    }
}
