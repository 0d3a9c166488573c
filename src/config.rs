// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{RegistryRepository, ReportRepository, UserRepository},
    models::reports::WorkType,
    services::{
        auth::AuthService,
        document_service::DocumentService,
        mail_service::{LogMailer, MailService, Mailer, SmtpMailer},
        registry_service::RegistryService,
        report_service::ReportService,
        user_service::UserService,
    },
};

/// Tipo de trabalho assumido quando a listagem não diz nem `type` nem `plant_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTypeDefault {
    Only(WorkType),
    Any,
}

impl WorkTypeDefault {
    pub fn as_filter(self) -> Option<WorkType> {
        match self {
            WorkTypeDefault::Only(work_type) => Some(work_type),
            WorkTypeDefault::Any => None,
        }
    }
}

impl Default for WorkTypeDefault {
    fn default() -> Self {
        WorkTypeDefault::Only(WorkType::Machine)
    }
}

impl FromStr for WorkTypeDefault {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "any" | "" => Ok(WorkTypeDefault::Any),
            other => WorkType::from_str(other)
                .map(WorkTypeDefault::Only)
                .map_err(|_| anyhow::anyhow!("REPORTS_DEFAULT_WORK_TYPE inválido: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    // None: as mensagens só vão para o log
    pub smtp: Option<SmtpConfig>,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bind_addr: SocketAddr,
    pub default_work_type: WorkTypeDefault,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub mail: MailConfig,
    // Limite do corpo dos uploads multipart (anexo do e-mail, XML da fatura)
    pub max_upload_bytes: usize,
    // Conta criada na primeira subida, se ainda não houver usuários
    pub bootstrap_admin: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let token_ttl_hours = parse_or("ACCESS_TOKEN_EXPIRE_HOURS", 12)?;
        let bind_addr = parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let default_work_type = parse_or("REPORTS_DEFAULT_WORK_TYPE", WorkTypeDefault::default())?;

        let smtp = match optional_var("MAIL_SERVER") {
            Some(server) => Some(SmtpConfig {
                server,
                port: parse_or("MAIL_PORT", 587)?,
                username: optional_var("MAIL_USERNAME"),
                password: optional_var("MAIL_PASSWORD"),
            }),
            None => None,
        };

        let mail = MailConfig {
            from_address: optional_var("MAIL_FROM")
                .or_else(|| smtp.as_ref().and_then(|s| s.username.clone()))
                .unwrap_or_else(|| "noreply@localhost".to_string()),
            from_name: optional_var("MAIL_FROM_NAME").unwrap_or_else(|| "Team Manutenzione".to_string()),
            smtp,
        };

        let max_upload_mb: usize = parse_or("MAX_UPLOAD_MB", 25)?;

        let bootstrap_admin = optional_var("ADMIN_USERNAME").zip(optional_var("ADMIN_PASSWORD"));

        Ok(Self {
            database_url,
            jwt_secret,
            token_ttl_hours,
            bind_addr,
            default_work_type,
            fonts_dir: optional_var("PDF_FONTS_DIR").map(PathBuf::from).unwrap_or_else(|| "./fonts".into()),
            font_family: optional_var("PDF_FONT_FAMILY").unwrap_or_else(|| "Roboto".to_string()),
            mail,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            bootstrap_admin,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} inválido ({raw}): {e}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub registry_service: RegistryService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
    pub mail_service: MailService,
}

impl AppState {
    // Conecta ao banco e monta o estado
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let mailer: Arc<dyn Mailer> = match &config.mail.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.mail)?),
            None => {
                tracing::warn!("MAIL_SERVER não definido: os e-mails serão apenas registrados no log");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::with_pool(config, db_pool, mailer))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: AppConfig, db_pool: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let registry_repo = RegistryRepository::new();
        let report_repo = ReportRepository::new();

        let auth_service = AuthService::new(user_repo.clone(), config.jwt_secret.clone(), config.token_ttl_hours);
        let user_service = UserService::new(user_repo.clone());
        let registry_service = RegistryService::new(registry_repo, report_repo.clone());
        let report_service = ReportService::new(report_repo, user_repo, config.default_work_type);
        let document_service = DocumentService::new(config.fonts_dir.clone(), config.font_family.clone());
        let mail_service = MailService::new(mailer);

        Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            user_service,
            registry_service,
            report_service,
            document_service,
            mail_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_type_default_parses_known_values() {
        assert_eq!("machine".parse::<WorkTypeDefault>().unwrap(), WorkTypeDefault::Only(WorkType::Machine));
        assert_eq!("Commission".parse::<WorkTypeDefault>().unwrap(), WorkTypeDefault::Only(WorkType::Commission));
        assert_eq!("any".parse::<WorkTypeDefault>().unwrap(), WorkTypeDefault::Any);
        assert!("robot".parse::<WorkTypeDefault>().is_err());
    }

    #[test]
    fn default_is_machine_branch() {
        assert_eq!(WorkTypeDefault::default().as_filter(), Some(WorkType::Machine));
        assert_eq!(WorkTypeDefault::Any.as_filter(), None);
    }
}
