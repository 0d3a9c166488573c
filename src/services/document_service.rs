// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Element};

use crate::{
    common::error::AppError,
    models::reports::{ReportRow, WorkType},
    services::export_service::decimal_comma,
};

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

// Gera os PDFs das intervenções em memória
#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
    font_family: String,
}

impl DocumentService {
    pub fn new(fonts_dir: PathBuf, font_family: String) -> Self {
        Self { fonts_dir, font_family }
    }

    /// Uma ou mais intervenções no mesmo documento, uma por página.
    pub async fn reports_pdf(&self, rows: Vec<ReportRow>) -> Result<Vec<u8>, AppError> {
        let service = self.clone();
        // genpdf é síncrono e pesado: roda fora do runtime
        tokio::task::spawn_blocking(move || service.render_reports(&rows))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de PDF: {}", e))?
    }

    fn new_document(&self, title: &str) -> Result<genpdf::Document, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None).map_err(|_| {
            AppError::FontNotFound(format!(
                "Fonte '{}' não encontrada em {}",
                self.font_family,
                self.fonts_dir.display()
            ))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(title);
        doc.set_font_size(10);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }

    fn render_reports(&self, rows: &[ReportRow]) -> Result<Vec<u8>, AppError> {
        let title = match rows {
            [single] => format!("Intervento {}", single.report.id),
            _ => "Interventi".to_string(),
        };
        let mut doc = self.new_document(&title)?;

        if rows.is_empty() {
            doc.push(elements::Paragraph::new("Nessun intervento nel periodo selezionato."));
        }

        for (index, row) in rows.iter().enumerate() {
            if index > 0 {
                doc.push(elements::PageBreak::new());
            }
            push_report(&mut doc, row)?;
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }
}

fn push_report(doc: &mut genpdf::Document, row: &ReportRow) -> Result<(), AppError> {
    let report = &row.report;

    doc.push(
        elements::Paragraph::new("RAPPORTO DI INTERVENTO").styled(style::Style::new().bold().with_font_size(16)),
    );
    doc.push(elements::Paragraph::new(format!(
        "N. {} del {}",
        report.id,
        report.date.format("%d/%m/%Y")
    )));
    doc.push(elements::Break::new(1.5));

    let mut table = elements::TableLayout::new(vec![1, 3]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    for (label, value) in report_fields(row) {
        table
            .row()
            .element(elements::Paragraph::new(label).styled(style::Style::new().bold()))
            .element(elements::Paragraph::new(value))
            .push()
            .map_err(pdf_error)?;
    }
    doc.push(table);

    if let Some(notes) = report.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        doc.push(elements::Break::new(1));
        doc.push(elements::Paragraph::new("Note").styled(style::Style::new().bold()));
        doc.push(elements::Paragraph::new(notes));
    }

    doc.push(elements::Break::new(3));
    doc.push(elements::Paragraph::new("Firma operatore ______________________      Firma cliente ______________________"));
    Ok(())
}

/// Pares rótulo/valor do cabeçalho de uma intervenção; o bloco muda com o tipo de trabalho.
pub fn report_fields(row: &ReportRow) -> Vec<(&'static str, String)> {
    let report = &row.report;
    let mut fields = vec![
        ("Operatore", row.operator_name()),
        ("Cliente", row.client_name.clone().unwrap_or_default()),
    ];

    match report.work_type {
        WorkType::Machine => {
            fields.push(("Stabilimento", row.plant_label()));
            let machine = match (&row.machine_code, &row.machine_name) {
                (Some(code), Some(name)) => format!("{code} - {name}"),
                (None, Some(name)) => name.clone(),
                _ => String::new(),
            };
            fields.push(("Macchina", machine));
            fields.push(("Centro di costo", row.cost_center.clone().unwrap_or_default()));
        }
        WorkType::Commission => fields.push(("Commessa", row.commission_label())),
    }

    fields.extend([
        ("Tipo intervento", report.intervention_type.clone()),
        ("Luogo", report.intervention_location.clone().unwrap_or_default()),
        ("Durata (ore)", decimal_comma(&report.intervention_duration)),
        ("Supervisore", row.supervisor_name().unwrap_or_default()),
        ("Km", decimal_comma(&report.trip_kms)),
        ("Costo", decimal_comma(&report.cost)),
        ("Descrizione", report.description.clone().unwrap_or_default()),
    ]);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reports::Report;
    use chrono::NaiveDate;

    fn commission_row() -> ReportRow {
        ReportRow {
            report: Report {
                id: 12,
                operator_id: 2,
                work_type: WorkType::Commission,
                work_id: 3,
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                intervention_duration: "3.5".into(),
                intervention_type: "Installazione".into(),
                intervention_location: None,
                supervisor_id: Some(9),
                description: None,
                notes: None,
                trip_kms: "12.5".into(),
                cost: "0.0".into(),
                date_created: chrono::Utc::now(),
                email_date: None,
            },
            first_name: "Luca".into(),
            last_name: "Bianchi".into(),
            supervisor_first_name: Some("Anna".into()),
            supervisor_last_name: Some("Verdi".into()),
            client_id: Some(5),
            client_name: Some("Officine Srl".into()),
            plant_id: None,
            plant_name: None,
            plant_city: None,
            plant_address: None,
            machine_name: None,
            machine_code: None,
            cost_center: None,
            commission_code: Some("C-17".into()),
            commission_description: Some("Revamping".into()),
        }
    }

    #[test]
    fn commission_report_has_no_machine_block() {
        let fields = report_fields(&commission_row());
        let labels: Vec<_> = fields.iter().map(|(label, _)| *label).collect();
        assert!(labels.contains(&"Commessa"));
        assert!(!labels.contains(&"Macchina"));
        assert!(fields.contains(&("Supervisore", "Anna Verdi".to_string())));
        assert!(fields.contains(&("Km", "12,5".to_string())));
    }

    #[test]
    fn missing_font_is_reported() {
        let service = DocumentService::new(PathBuf::from("/caminho/que/nao/existe"), "Roboto".into());
        let err = service.render_reports(&[commission_row()]).unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }
}
