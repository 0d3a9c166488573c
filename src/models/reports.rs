// src/models/reports.rs

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::common::{
    error::AppError,
    query::{optional_id, optional_limit, optional_text},
};

pub const EMPTY_AMOUNT: &str = "0.0";

// --- Referência polimórfica ---

/// Tipo do alvo de uma intervenção.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "work_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    Machine,
    Commission,
}

impl WorkType {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkType::Machine => "machine",
            WorkType::Commission => "commission",
        }
    }
}

impl FromStr for WorkType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "machine" => Ok(WorkType::Machine),
            "commission" => Ok(WorkType::Commission),
            other => Err(AppError::InvalidWorkReference(other.to_string())),
        }
    }
}

/// O alvo de uma intervenção: ou uma máquina ou uma comissão, nunca os dois.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum WorkRef {
    Machine(i32),
    Commission(i32),
}

impl WorkRef {
    pub fn new(work_type: WorkType, id: i32) -> Self {
        match work_type {
            WorkType::Machine => WorkRef::Machine(id),
            WorkType::Commission => WorkRef::Commission(id),
        }
    }

    pub fn work_type(self) -> WorkType {
        match self {
            WorkRef::Machine(_) => WorkType::Machine,
            WorkRef::Commission(_) => WorkType::Commission,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            WorkRef::Machine(id) | WorkRef::Commission(id) => id,
        }
    }
}

impl std::fmt::Display for WorkRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.work_type().as_str(), self.id())
    }
}

// --- Tabela de intervenções ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i32,
    pub operator_id: i32,
    #[serde(rename = "type")]
    pub work_type: WorkType,
    pub work_id: i32,
    #[schema(example = "2024-03-15")]
    pub date: NaiveDate,
    #[schema(example = "2.5")]
    pub intervention_duration: String,
    #[schema(example = "Manutenzione ordinaria")]
    pub intervention_type: String,
    pub intervention_location: Option<String>,
    pub supervisor_id: Option<i32>,
    pub description: Option<String>,
    pub notes: Option<String>,
    #[schema(example = "0.0")]
    pub trip_kms: String,
    #[schema(example = "0.0")]
    pub cost: String,
    pub date_created: DateTime<Utc>,
    pub email_date: Option<DateTime<Utc>>,
}

impl Report {
    pub fn work_ref(&self) -> WorkRef {
        WorkRef::new(self.work_type, self.work_id)
    }
}

/// Linha completa: intervenção + dimensões resolvidas pelos joins.
/// As colunas do ramo que não se aplica ao tipo vêm nulas.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: Report,
    pub first_name: String,
    pub last_name: String,
    pub supervisor_first_name: Option<String>,
    pub supervisor_last_name: Option<String>,
    pub client_id: Option<i32>,
    pub client_name: Option<String>,
    pub plant_id: Option<i32>,
    pub plant_name: Option<String>,
    pub plant_city: Option<String>,
    pub plant_address: Option<String>,
    pub machine_name: Option<String>,
    pub machine_code: Option<String>,
    pub cost_center: Option<String>,
    pub commission_code: Option<String>,
    pub commission_description: Option<String>,
}

impl ReportRow {
    pub fn operator_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn supervisor_name(&self) -> Option<String> {
        match (&self.supervisor_first_name, &self.supervisor_last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => None,
        }
    }

    /// "cidade endereço" do estabelecimento, como aparece nas exportações.
    pub fn plant_label(&self) -> String {
        join_non_empty(&[self.plant_city.as_deref(), self.plant_address.as_deref()], " ")
    }

    /// "código - descrição" da comissão.
    pub fn commission_label(&self) -> String {
        join_non_empty(
            &[self.commission_code.as_deref(), self.commission_description.as_deref()],
            " - ",
        )
    }
}

fn join_non_empty(parts: &[Option<&str>], separator: &str) -> String {
    parts
        .iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}

// --- Payload de criação/edição ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    #[schema(example = "2024-03-15")]
    pub date: NaiveDate,
    #[validate(custom(function = "validate_duration"))]
    #[schema(example = "2.5")]
    pub intervention_duration: String,
    #[validate(length(min = 1, message = "required"))]
    pub intervention_type: String,
    pub intervention_location: Option<String>,
    pub work: WorkRef,
    pub supervisor_id: Option<i32>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub trip_kms: Option<String>,
    pub cost: Option<String>,
}

impl ReportPayload {
    /// Quilometragem e custo vazios são gravados como "0.0".
    pub fn normalized(mut self) -> Self {
        self.trip_kms = Some(normalize_amount(self.trip_kms.as_deref()));
        self.cost = Some(normalize_amount(self.cost.as_deref()));
        self.intervention_duration = self.intervention_duration.trim().replace(',', ".");
        self
    }
}

pub fn normalize_amount(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None | Some("") => EMPTY_AMOUNT.to_string(),
        Some(v) => v.to_string(),
    }
}

/// Converte a duração textual ("2.5" ou "2,5") em horas.
pub fn parse_hours(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim().replace(',', ".").as_str()).ok()
}

fn validate_duration(value: &str) -> Result<(), ValidationError> {
    match parse_hours(value) {
        Some(hours) if hours >= Decimal::ZERO => Ok(()),
        _ => Err(ValidationError::new("duration").with_message("duration".into())),
    }
}

// --- Período ---

/// Intervalo inclusivo de datas; qualquer um dos limites pode faltar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Primeiro e último dia do mês "MM/AAAA".
    pub fn from_month(raw: &str) -> Result<Self, AppError> {
        let (month, year) = parse_month(raw)?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::InvalidMonth(raw.to_string()))?;
        let end = last_day_of_month(start);
        Ok(Self { start: Some(start), end: Some(end) })
    }

    /// Intervalo "AAAA-MM-DD"; limites vazios são ignorados.
    pub fn from_interval(start: Option<&str>, end: Option<&str>) -> Result<Self, AppError> {
        Ok(Self {
            start: start.map(parse_date).transpose()?,
            end: end.map(parse_date).transpose()?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| AppError::InvalidDate(raw.to_string()))
}

/// "MM/AAAA" -> (mês, ano)
pub fn parse_month(raw: &str) -> Result<(u32, i32), AppError> {
    let invalid = || AppError::InvalidMonth(raw.to_string());
    let (month, year) = raw.trim().split_once('/').ok_or_else(invalid)?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
        return Err(invalid());
    }
    Ok((month, year))
}

pub fn format_month(month: u32, year: i32) -> String {
    format!("{month:02}/{year}")
}

pub fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

// --- Ordenação ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    CreatedAt,
    LastName,
    #[default]
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportSort {
    pub by: SortBy,
    pub order: SortOrder,
}

impl ReportSort {
    /// Valores fora da lista permitida voltam ao padrão (data, decrescente) sem erro.
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let by = match sort_by.map(str::trim) {
            Some("created_at") | Some("date_created") => SortBy::CreatedAt,
            Some("last_name") => SortBy::LastName,
            _ => SortBy::Date,
        };
        let order = match sort_order.map(|o| o.trim().to_ascii_lowercase()) {
            Some(o) if o == "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        Self { by, order }
    }
}

// --- Parâmetros de consulta ---

/// Filtros aceitos pelas listagens e exportações de intervenções.
/// Todos opcionais; `0` e texto vazio significam "sem filtro".
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportFilterParams {
    /// Operador (alias `user_id`). Ignorado para quem não é admin.
    #[serde(default, alias = "user_id", deserialize_with = "optional_id")]
    pub operator_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub client_id: Option<i32>,
    #[serde(default, alias = "site_id", deserialize_with = "optional_id")]
    pub plant_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub work_id: Option<i32>,
    /// "machine" | "commission"
    #[serde(default, rename = "type", deserialize_with = "optional_text")]
    pub work_type: Option<String>,
    /// "MM/AAAA"
    #[serde(default, deserialize_with = "optional_text")]
    pub month: Option<String>,
    /// "AAAA-MM-DD"
    #[serde(default, deserialize_with = "optional_text")]
    pub start_date: Option<String>,
    /// "AAAA-MM-DD"
    #[serde(default, deserialize_with = "optional_text")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub sort_order: Option<String>,
    #[serde(default, deserialize_with = "optional_limit")]
    pub limit: Option<i64>,
}

/// Filtro já validado, antes do escopo do chamador.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub operator_id: Option<i32>,
    pub client_id: Option<i32>,
    pub plant_id: Option<i32>,
    pub work_id: Option<i32>,
    pub work_type: Option<WorkType>,
    pub period: DateRange,
    pub sort: ReportSort,
    pub limit: Option<i64>,
}

impl TryFrom<ReportFilterParams> for ReportFilter {
    type Error = AppError;

    fn try_from(params: ReportFilterParams) -> Result<Self, Self::Error> {
        let has_interval = params.start_date.is_some() || params.end_date.is_some();
        let period = match (params.month.as_deref(), has_interval) {
            (Some(_), true) => return Err(AppError::ConflictingPeriod),
            (Some(month), false) => DateRange::from_month(month)?,
            (None, _) => {
                DateRange::from_interval(params.start_date.as_deref(), params.end_date.as_deref())?
            }
        };

        let work_type = params.work_type.as_deref().map(WorkType::from_str).transpose()?;

        Ok(Self {
            operator_id: params.operator_id,
            client_id: params.client_id,
            plant_id: params.plant_id,
            work_id: params.work_id,
            work_type,
            period,
            sort: ReportSort::parse(params.sort_by.as_deref(), params.sort_order.as_deref()),
            limit: params.limit.filter(|limit| *limit > 0),
        })
    }
}

// --- Agregações ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct MonthKey {
    pub year: i32,
    pub month: i32,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DayTotal {
    pub day: NaiveDate,
    pub hours: Decimal,
    pub reports: i64,
}

/// Uma entrada por dia do mês, inclusive os dias sem intervenções.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyHours {
    #[schema(example = "2024-03-15")]
    pub date: NaiveDate,
    #[schema(example = 8.0)]
    pub hours: Decimal,
    #[schema(example = 2)]
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyHoursParams {
    /// "MM/AAAA"
    pub month: String,
    #[serde(default, alias = "user_id", deserialize_with = "optional_id")]
    pub operator_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn month_filter_covers_whole_calendar_month() {
        let range = DateRange::from_month("03/2024").unwrap();
        assert!(range.contains(date("2024-03-01")));
        assert!(range.contains(date("2024-03-31")));
        assert!(!range.contains(date("2024-02-29")));
        assert!(!range.contains(date("2024-04-01")));
    }

    #[test]
    fn month_bounds_handle_leap_years_and_december() {
        let feb = DateRange::from_month("02/2024").unwrap();
        assert_eq!(feb.end, Some(date("2024-02-29")));
        let dec = DateRange::from_month("12/2023").unwrap();
        assert_eq!(dec.end, Some(date("2023-12-31")));
    }

    #[test]
    fn half_open_interval_applies_only_given_bound() {
        let range = DateRange::from_interval(Some("2024-01-10"), None).unwrap();
        assert!(range.contains(date("2024-01-15")));
        assert!(!range.contains(date("2024-01-05")));
        assert_eq!(range.end, None);
    }

    #[test]
    fn malformed_dates_are_client_errors() {
        assert!(matches!(DateRange::from_month("13/2024"), Err(AppError::InvalidMonth(_))));
        assert!(matches!(DateRange::from_month("2024-03"), Err(AppError::InvalidMonth(_))));
        assert!(matches!(
            DateRange::from_interval(Some("2024-02-30"), None),
            Err(AppError::InvalidDate(_))
        ));
    }

    #[test]
    fn empty_interval_strings_are_ignored() {
        let params: ReportFilterParams =
            serde_json::from_str(r#"{"start_date": "2024-01-10", "end_date": ""}"#).unwrap();
        let filter = ReportFilter::try_from(params).unwrap();
        assert_eq!(filter.period.start, Some(date("2024-01-10")));
        assert_eq!(filter.period.end, None);
    }

    #[test]
    fn empty_limit_is_ignored() {
        let params: ReportFilterParams =
            serde_json::from_str(r#"{"month": "03/2024", "limit": ""}"#).unwrap();
        let filter = ReportFilter::try_from(params).unwrap();
        assert_eq!(filter.limit, None);
    }

    #[test]
    fn month_and_interval_together_are_rejected() {
        let params = ReportFilterParams {
            month: Some("03/2024".into()),
            start_date: Some("2024-03-01".into()),
            ..Default::default()
        };
        assert!(matches!(ReportFilter::try_from(params), Err(AppError::ConflictingPeriod)));
    }

    #[test]
    fn unknown_sort_falls_back_to_date_desc() {
        assert_eq!(ReportSort::parse(Some("password"), Some("sideways")), ReportSort::default());
        let sort = ReportSort::parse(Some("last_name"), Some("ASC"));
        assert_eq!(sort.by, SortBy::LastName);
        assert_eq!(sort.order, SortOrder::Asc);
    }

    #[test]
    fn empty_amounts_are_normalized() {
        let payload: ReportPayload = serde_json::from_str(
            r#"{
                "date": "2024-03-15",
                "interventionDuration": "2,5",
                "interventionType": "Manutenzione ordinaria",
                "work": {"type": "machine", "id": 4},
                "tripKms": "",
                "cost": ""
            }"#,
        )
        .unwrap();
        let payload = payload.normalized();
        assert_eq!(payload.trip_kms.as_deref(), Some("0.0"));
        assert_eq!(payload.cost.as_deref(), Some("0.0"));
        assert_eq!(payload.intervention_duration, "2.5");
        assert_eq!(payload.work, WorkRef::Machine(4));
    }

    #[test]
    fn duration_must_be_a_non_negative_number() {
        assert!(validate_duration("1.5").is_ok());
        assert!(validate_duration("0,75").is_ok());
        assert!(validate_duration("-1").is_err());
        assert!(validate_duration("due ore").is_err());
    }

    #[test]
    fn work_ref_round_trips_through_its_tag() {
        let work = WorkRef::new(WorkType::Commission, 9);
        assert_eq!(work.work_type(), WorkType::Commission);
        assert_eq!(work.id(), 9);
        assert_eq!(serde_json::to_value(work).unwrap(), serde_json::json!({"type": "commission", "id": 9}));
    }
}
