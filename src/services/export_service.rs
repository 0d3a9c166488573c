// src/services/export_service.rs

// Exportação CSV das intervenções: separador ';', vírgula decimal,
// linha em branco e o total de horas no fim. Tudo em memória, por requisição.

use csv::{Writer, WriterBuilder};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::reports::{parse_hours, ReportRow, WorkType},
};

const MACHINE_HEADERS: [&str; 10] = [
    "Operatore",
    "Data",
    "Cliente",
    "Stabilimento",
    "Durata",
    "Tipo",
    "Macchina",
    "Centro di costo",
    "Location",
    "Descrizione",
];

const COMMISSION_HEADERS: [&str; 8] = [
    "Operatore",
    "Data",
    "Cliente",
    "Commessa",
    "Durata",
    "Tipo",
    "Location",
    "Descrizione",
];

// Coluna "Durata" nos dois layouts
const DURATION_COLUMN: usize = 4;

/// Layout das colunas, escolhido pelo tipo de trabalho da listagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    Machine,
    Commission,
}

impl CsvLayout {
    pub fn for_work_type(work_type: Option<WorkType>) -> Self {
        match work_type {
            Some(WorkType::Commission) => CsvLayout::Commission,
            _ => CsvLayout::Machine,
        }
    }

    fn headers(self) -> &'static [&'static str] {
        match self {
            CsvLayout::Machine => &MACHINE_HEADERS,
            CsvLayout::Commission => &COMMISSION_HEADERS,
        }
    }

    fn record(self, row: &ReportRow) -> Vec<String> {
        let report = &row.report;
        let operator = row.operator_name();
        let date = report.date.format("%d/%m/%Y").to_string();
        let client = row.client_name.clone().unwrap_or_default();
        let duration = decimal_comma(&report.intervention_duration);
        let location = report.intervention_location.clone().unwrap_or_default();
        let description = report.description.clone().unwrap_or_default();

        match self {
            CsvLayout::Machine => vec![
                operator,
                date,
                client,
                row.plant_label(),
                duration,
                report.intervention_type.clone(),
                row.machine_name.clone().unwrap_or_default(),
                row.cost_center.clone().unwrap_or_default(),
                location,
                description,
            ],
            CsvLayout::Commission => vec![
                operator,
                date,
                client,
                row.commission_label(),
                duration,
                report.intervention_type.clone(),
                location,
                description,
            ],
        }
    }
}

/// Soma das durações; valores ilegíveis contam como zero.
pub fn total_hours(rows: &[ReportRow]) -> Decimal {
    rows.iter()
        .filter_map(|row| parse_hours(&row.report.intervention_duration))
        .sum()
}

/// Horas com pelo menos uma casa decimal e vírgula: 10 -> "10,0", 7.25 -> "7,25".
pub fn format_hours(hours: Decimal) -> String {
    let normalized = hours.normalize();
    let text = if normalized.scale() == 0 {
        format!("{normalized}.0")
    } else {
        normalized.to_string()
    };
    text.replace('.', ",")
}

pub fn decimal_comma(value: &str) -> String {
    value.trim().replace('.', ",")
}

pub(crate) fn semicolon_writer() -> Writer<Vec<u8>> {
    semicolon_writer_over(Vec::new())
}

// Continua escrevendo depois do que já está no buffer
fn semicolon_writer_over(buffer: Vec<u8>) -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_writer(buffer)
}

pub(crate) fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Falha ao finalizar o CSV: {}", e.error())))
}

pub fn reports_csv(rows: &[ReportRow], layout: CsvLayout) -> Result<Vec<u8>, AppError> {
    let headers = layout.headers();
    let mut writer = semicolon_writer();

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(layout.record(row))?;
    }

    // Linha vazia crua, fora do writer, e depois "Totale ore" embaixo da duração
    let mut buffer = finish(writer)?;
    buffer.push(b'\n');
    let mut writer = semicolon_writer_over(buffer);

    let mut total = vec![String::new(); headers.len()];
    total[0] = "Totale ore".to_string();
    total[DURATION_COLUMN] = format_hours(total_hours(rows));
    writer.write_record(&total)?;

    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reports::Report;
    use chrono::NaiveDate;

    fn row(duration: &str, work_type: WorkType) -> ReportRow {
        ReportRow {
            report: Report {
                id: 1,
                operator_id: 2,
                work_type,
                work_id: 3,
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                intervention_duration: duration.to_string(),
                intervention_type: "Manutenzione ordinaria".into(),
                intervention_location: Some("Presso cliente".into()),
                supervisor_id: None,
                description: Some("Sostituzione cinghia".into()),
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
            client_id: Some(5),
            client_name: Some("Officine Srl".into()),
            plant_id: Some(8),
            plant_name: Some("Nord".into()),
            plant_city: Some("Rovereto".into()),
            plant_address: Some("Via Fornaci 1".into()),
            machine_name: Some("Pressa".into()),
            machine_code: Some("M-1".into()),
            cost_center: Some("CC-100".into()),
            commission_code: Some("C-17".into()),
            commission_description: Some("Revamping linea".into()),
        }
    }

    fn lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn machine_layout_with_total_row() {
        let rows = vec![row("2.5", WorkType::Machine), row("7,5", WorkType::Machine)];
        let out = lines(reports_csv(&rows, CsvLayout::Machine).unwrap());

        assert_eq!(
            out[0],
            "Operatore;Data;Cliente;Stabilimento;Durata;Tipo;Macchina;Centro di costo;Location;Descrizione"
        );
        assert_eq!(
            out[1],
            "Mario Rossi;15/03/2024;Officine Srl;Rovereto Via Fornaci 1;2,5;Manutenzione ordinaria;Pressa;CC-100;Presso cliente;Sostituzione cinghia"
        );
        assert_eq!(out[3], "");
        assert_eq!(out[4], "Totale ore;;;;10,0;;;;;");
    }

    #[test]
    fn commission_layout_uses_code_and_description() {
        let rows = vec![row("1.25", WorkType::Commission)];
        let out = lines(reports_csv(&rows, CsvLayout::Commission).unwrap());

        assert_eq!(out[0], "Operatore;Data;Cliente;Commessa;Durata;Tipo;Location;Descrizione");
        assert!(out[1].contains(";C-17 - Revamping linea;1,25;"));
        assert_eq!(out[3], "Totale ore;;;;1,25;;;");
    }

    #[test]
    fn separator_before_total_is_an_empty_line() {
        let bytes = reports_csv(&[row("3", WorkType::Commission)], CsvLayout::Commission).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n\nTotale ore;"));
        assert!(!text.contains("\"\""));
    }

    #[test]
    fn empty_listing_still_has_zero_total() {
        let out = lines(reports_csv(&[], CsvLayout::Machine).unwrap());
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], "Totale ore;;;;0,0;;;;;");
    }

    #[test]
    fn hours_keep_one_decimal_at_least() {
        assert_eq!(format_hours(Decimal::new(10, 0)), "10,0");
        assert_eq!(format_hours(Decimal::new(1000, 2)), "10,0");
        assert_eq!(format_hours(Decimal::new(725, 2)), "7,25");
    }

    #[test]
    fn layout_follows_work_type() {
        assert_eq!(CsvLayout::for_work_type(Some(WorkType::Commission)), CsvLayout::Commission);
        assert_eq!(CsvLayout::for_work_type(None), CsvLayout::Machine);
    }
}
