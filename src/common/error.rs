// src/common/error.rs

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

/// Entidades que podem faltar numa busca por ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Client,
    Plant,
    Machine,
    Commission,
    Report,
}

impl Entity {
    pub fn slug(self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Client => "client",
            Entity::Plant => "plant",
            Entity::Machine => "machine",
            Entity::Commission => "commission",
            Entity::Report => "report",
        }
    }
}

// Erros de domínio. Cada variante sabe qual chave de tradução e qual status usar.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Data inválida: {0}")]
    InvalidDate(String),

    #[error("Mês inválido: {0}")]
    InvalidMonth(String),

    #[error("Filtro por mês e por intervalo ao mesmo tempo")]
    ConflictingPeriod,

    #[error("Referência de trabalho inexistente: {0}")]
    InvalidWorkReference(String),

    #[error("Supervisor inexistente: {0}")]
    InvalidSupervisor(i32),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Senha atual incorreta")]
    WrongPassword,

    #[error("{} não encontrado", .0.slug())]
    ResourceNotFound(Entity),

    #[error("Username já existe")]
    UsernameAlreadyExists,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Cliente já existe")]
    ClientNameAlreadyExists,

    #[error("Código de comissão já existe")]
    CommissionCodeAlreadyExists,

    // A string é a chave de tradução do motivo (ex: "delete_blocked.plant_has_machines")
    #[error("Exclusão bloqueada: {0}")]
    DeletionBlocked(&'static str),

    #[error("Este usuário não pode ser excluído")]
    CannotDeleteUser,

    #[error("Fatura eletrônica inválida: {0}")]
    InvalidInvoice(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de CSV: {0}")]
    CsvError(#[from] csv::Error),
}

/// O erro que efetivamente sai na resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Erro de validação de um único campo, com o código usado na tradução (`validation.<code>`).
    pub fn field(field: &'static str, code: &'static str) -> Self {
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, validator::ValidationError::new(code));
        AppError::ValidationError(errors)
    }

    /// Falha lendo um upload multipart: corpo acima do limite vira `file_too_large`, o resto `required`.
    pub fn from_multipart(field: &'static str, err: &MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::field(field, "file_too_large")
        } else {
            AppError::field(field, "required")
        }
    }

    /// Status HTTP de cada categoria: 404 não encontrado, 400 conflito/validação,
    /// 403 proibido, 401 não autenticado, 500 o resto.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidMonth(_)
            | AppError::ConflictingPeriod
            | AppError::InvalidWorkReference(_)
            | AppError::InvalidSupervisor(_)
            | AppError::WrongPassword
            | AppError::UsernameAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::ClientNameAlreadyExists
            | AppError::CommissionCodeAlreadyExists
            | AppError::DeletionBlocked(_)
            | AppError::InvalidInvoice(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::CannotDeleteUser => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::CsvError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(&e.code);
                            Value::String(i18n.translate(lang, &format!("validation.{code}")))
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                (i18n.translate(lang, "validation.failed"), Some(Value::Object(details)))
            }
            AppError::InvalidDate(raw) => (i18n.translate_with(lang, "input.invalid_date", &raw), None),
            AppError::InvalidMonth(raw) => (i18n.translate_with(lang, "input.invalid_month", &raw), None),
            AppError::ConflictingPeriod => (i18n.translate(lang, "input.conflicting_period"), None),
            AppError::InvalidWorkReference(raw) => {
                (i18n.translate_with(lang, "input.invalid_work_reference", &raw), None)
            }
            AppError::InvalidSupervisor(id) => {
                (i18n.translate_with(lang, "input.invalid_supervisor", &id.to_string()), None)
            }
            AppError::InvalidCredentials => (i18n.translate(lang, "auth.invalid_credentials"), None),
            AppError::InvalidToken => (i18n.translate(lang, "auth.invalid_token"), None),
            AppError::Forbidden => (i18n.translate(lang, "auth.forbidden"), None),
            AppError::WrongPassword => (i18n.translate(lang, "auth.wrong_password"), None),
            AppError::ResourceNotFound(entity) => {
                (i18n.translate(lang, &format!("not_found.{}", entity.slug())), None)
            }
            AppError::UsernameAlreadyExists => (i18n.translate(lang, "conflict.username"), None),
            AppError::EmailAlreadyExists => (i18n.translate(lang, "conflict.email"), None),
            AppError::ClientNameAlreadyExists => (i18n.translate(lang, "conflict.client_name"), None),
            AppError::CommissionCodeAlreadyExists => {
                (i18n.translate(lang, "conflict.commission_code"), None)
            }
            AppError::DeletionBlocked(reason) => (i18n.translate(lang, reason), None),
            AppError::CannotDeleteUser => (i18n.translate(lang, "user.cannot_delete"), None),
            AppError::InvalidInvoice(reason) => {
                tracing::warn!("Fatura rejeitada: {}", reason);
                (i18n.translate(lang, "invoice.invalid"), None)
            }

            // Todos os outros erros viram 500. O detalhe vai só para o log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (i18n.translate(lang, "internal.error"), None)
            }
        };

        ApiError { status, error, details }
    }
}

// Atalho para quando não há locale à mão (ex: rejeição de extractors sem estado).
impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error(&Locale::default(), &I18nStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn it() -> Locale {
        Locale("it".to_string())
    }

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(AppError::ResourceNotFound(Entity::Client).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::ClientNameAlreadyExists.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DeletionBlocked("delete_blocked.client_has_plants").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::InvalidDate("2024-13-01".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn translates_not_found_per_entity() {
        let store = I18nStore::new();
        let api = AppError::ResourceNotFound(Entity::Machine).to_api_error(&it(), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Macchina non trovata.");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let store = I18nStore::new();
        let api = AppError::InternalServerError(anyhow::anyhow!("segredo do banco"))
            .to_api_error(&Locale("en".to_string()), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
    }

    #[test]
    fn invalid_date_carries_raw_value() {
        let store = I18nStore::new();
        let api = AppError::InvalidDate("31/02".into()).to_api_error(&it(), &store);
        assert!(api.error.contains("31/02"));
    }
}
