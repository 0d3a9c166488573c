// src/services/mail_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::{MailConfig, SmtpConfig},
    models::reports::ReportRow,
};

/// Uma mensagem pronta para envio, com um único anexo.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

// --- SMTP (STARTTLS) ---
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, mail: &MailConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)?.port(smtp.port);
        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = Mailbox::new(Some(mail.from_name.clone()), mail.from_address.parse()?);

        Ok(Self { transport: builder.build(), from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        let content_type = ContentType::parse("application/octet-stream")?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(mail.body))
                    .singlepart(Attachment::new(mail.attachment_name).body(mail.attachment, content_type)),
            )?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Sem servidor configurado: registra a mensagem e descarta.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            attachment = %mail.attachment_name,
            bytes = mail.attachment.len(),
            "📭 E-mail não enviado (SMTP não configurado)"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct MailService {
    mailer: Arc<dyn Mailer>,
}

impl MailService {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Dispara o envio numa task separada. Falhas só vão para o log.
    pub fn send_in_background(&self, mail: OutgoingMail) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let to = mail.to.clone();
            match mailer.send(mail).await {
                Ok(()) => tracing::info!("📧 E-mail enviado para {}", to),
                Err(e) => tracing::error!("Falha ao enviar e-mail para {}: {:?}", to, e),
            }
        });
    }
}

pub fn report_subject(row: &ReportRow) -> String {
    format!(
        "{} - Intervento {} {}",
        operator_name(row),
        row.client_name.as_deref().unwrap_or_default(),
        format_day(row.report.date)
    )
}

pub fn report_body(row: &ReportRow, signature: &str) -> String {
    format!(
        "Buongiorno,\n\n\
         in allegato l'intervento di {} in data {} presso {}.\n\
         Il presente intervento è da ritenersi accettato se non vi saranno comunicazioni entro 3 giorni lavorativi.\n\n\
         Cordiali saluti,\n{}",
        operator_name(row),
        format_day(row.report.date),
        row.client_name.as_deref().unwrap_or_default(),
        signature
    )
}

// "COGNOME NOME", sempre maiúsculo
fn operator_name(row: &ReportRow) -> String {
    format!("{} {}", row.last_name.to_uppercase(), row.first_name.to_uppercase())
}

fn format_day(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reports::{Report, WorkType};
    use std::sync::Mutex;

    fn row() -> ReportRow {
        ReportRow {
            report: Report {
                id: 3,
                operator_id: 2,
                work_type: WorkType::Machine,
                work_id: 4,
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                intervention_duration: "4".into(),
                intervention_type: "Manutenzione straordinaria".into(),
                intervention_location: None,
                supervisor_id: None,
                description: None,
                notes: None,
                trip_kms: "0.0".into(),
                cost: "0.0".into(),
                date_created: chrono::Utc::now(),
                email_date: None,
            },
            first_name: "Mario".into(),
            last_name: "Rossi".into(),
            supervisor_first_name: None,
            supervisor_last_name: None,
            client_id: Some(1),
            client_name: Some("Officine Srl".into()),
            plant_id: Some(2),
            plant_name: None,
            plant_city: None,
            plant_address: None,
            machine_name: Some("Pressa".into()),
            machine_code: None,
            cost_center: None,
            commission_code: None,
            commission_description: None,
        }
    }

    #[test]
    fn subject_names_operator_client_and_day() {
        assert_eq!(report_subject(&row()), "ROSSI MARIO - Intervento Officine Srl 05/03/2024");
    }

    #[test]
    fn body_uses_fixed_template() {
        let body = report_body(&row(), "Team Manutenzione");
        assert!(body.starts_with("Buongiorno,"));
        assert!(body.contains("l'intervento di ROSSI MARIO in data 05/03/2024 presso Officine Srl."));
        assert!(body.contains("entro 3 giorni lavorativi"));
        assert!(body.ends_with("Cordiali saluti,\nTeam Manutenzione"));
    }

    struct Recorder(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Mailer for Recorder {
        async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(mail.to);
            Ok(())
        }
    }

    #[tokio::test]
    async fn background_send_reaches_the_mailer() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = MailService::new(Arc::new(Recorder(sent.clone())));

        service.send_in_background(OutgoingMail {
            to: "cliente@example.com".into(),
            subject: "s".into(),
            body: "b".into(),
            attachment_name: "intervento.pdf".into(),
            attachment: vec![1, 2, 3],
        });

        for _ in 0..50 {
            if !sent.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(sent.lock().unwrap().as_slice(), ["cliente@example.com".to_string()]);
    }
}
