// src/services/report_service.rs

// Escopo de acesso às intervenções.
// Toda leitura e escrita passa por `ReportScope`: quem não é admin só enxerga
// e altera as próprias intervenções, independente do que vier na query string.

use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    common::error::{AppError, Entity},
    config::WorkTypeDefault,
    db::{report_query::ReportCriteria, ReportRepository, UserRepository},
    models::{
        auth::User,
        reports::{
            format_month, DailyHours, DateRange, DayTotal, MonthKey, Report, ReportFilter, ReportPayload,
            ReportRow, ReportSort, WorkType,
        },
    },
};

/// Identidade do chamador, reduzida ao que importa para o filtro por linha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportScope {
    caller_id: i32,
    is_admin: bool,
}

impl ReportScope {
    pub fn for_user(user: &User) -> Self {
        Self { caller_id: user.id, is_admin: user.role.is_admin() }
    }

    pub fn caller_id(&self) -> i32 {
        self.caller_id
    }

    /// O operador pedido só vale para o admin; os demais ficam presos ao próprio id.
    pub fn operator_filter(&self, requested: Option<i32>) -> Option<i32> {
        if self.is_admin { requested } else { Some(self.caller_id) }
    }

    pub fn can_access(&self, report: &Report) -> bool {
        self.is_admin || report.operator_id == self.caller_id
    }

    /// Filtro validado + escopo = critério pronto para o SQL.
    /// Com `default_type`, a listagem sem `type` nem `plant_id` assume o ramo configurado.
    pub fn criteria(&self, filter: &ReportFilter, default_type: Option<WorkTypeDefault>) -> ReportCriteria {
        let work_type = filter.work_type.or_else(|| match default_type {
            Some(_) if filter.plant_id.is_some() => Some(WorkType::Machine),
            Some(default) => default.as_filter(),
            None => None,
        });

        ReportCriteria {
            operator_id: self.operator_filter(filter.operator_id),
            client_id: filter.client_id,
            plant_id: filter.plant_id,
            work_id: filter.work_id,
            work_type,
            period: filter.period,
        }
    }
}

/// Meses distintos, em ordem cronológica, no formato "MM/AAAA".
pub fn collect_months(mut keys: Vec<MonthKey>) -> Vec<String> {
    keys.sort_by_key(|key| (key.year, key.month));
    keys.dedup();
    keys.into_iter()
        .map(|key| format_month(key.month as u32, key.year))
        .collect()
}

/// Uma entrada por dia do mês, com zero onde não há intervenções.
pub fn fill_month(period: DateRange, totals: &[DayTotal]) -> Vec<DailyHours> {
    let (Some(start), Some(end)) = (period.start, period.end) else {
        return Vec::new();
    };

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| match totals.iter().find(|total| total.day == date) {
            Some(total) => DailyHours { date, hours: total.hours, count: total.reports },
            None => DailyHours { date, hours: Decimal::ZERO, count: 0 },
        })
        .collect()
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    user_repo: UserRepository,
    default_work_type: WorkTypeDefault,
}

impl ReportService {
    pub fn new(repo: ReportRepository, user_repo: UserRepository, default_work_type: WorkTypeDefault) -> Self {
        Self { repo, user_repo, default_work_type }
    }

    // =========================================================================
    //  LISTAGENS
    // =========================================================================

    /// Listagem mensal / por intervalo (também a base das exportações).
    pub async fn list_reports(
        &self,
        conn: &mut PgConnection,
        scope: ReportScope,
        filter: &ReportFilter,
    ) -> Result<Vec<ReportRow>, AppError> {
        let criteria = scope.criteria(filter, Some(self.default_work_type));
        self.repo.list(conn, &criteria, ReportSort::default(), filter.limit).await
    }

    /// Tabela com ordenação escolhida pelo cliente; os dois tipos de trabalho juntos.
    pub async fn list_table(
        &self,
        conn: &mut PgConnection,
        scope: ReportScope,
        filter: &ReportFilter,
    ) -> Result<Vec<ReportRow>, AppError> {
        let criteria = scope.criteria(filter, None);
        self.repo.list(conn, &criteria, filter.sort, filter.limit).await
    }

    pub async fn list_all(
        &self,
        conn: &mut PgConnection,
        scope: ReportScope,
        limit: Option<i64>,
    ) -> Result<Vec<ReportRow>, AppError> {
        let criteria = scope.criteria(&ReportFilter::default(), None);
        self.repo
            .list(conn, &criteria, ReportSort::default(), limit.filter(|l| *l > 0))
            .await
    }

    pub async fn months(
        &self,
        conn: &mut PgConnection,
        scope: ReportScope,
        filter: &ReportFilter,
    ) -> Result<Vec<String>, AppError> {
        let criteria = scope.criteria(filter, None);
        let keys = self.repo.months(conn, &criteria).await?;
        Ok(collect_months(keys))
    }

    pub async fn daily_hours(
        &self,
        conn: &mut PgConnection,
        scope: ReportScope,
        month: &str,
        operator_id: Option<i32>,
    ) -> Result<Vec<DailyHours>, AppError> {
        let period = DateRange::from_month(month)?;
        let criteria = ReportCriteria {
            operator_id: scope.operator_filter(operator_id),
            period,
            ..Default::default()
        };

        let totals = self.repo.daily_totals(conn, &criteria).await?;
        Ok(fill_month(period, &totals))
    }

    // =========================================================================
    //  UMA INTERVENÇÃO
    // =========================================================================

    pub async fn get_report(&self, conn: &mut PgConnection, scope: ReportScope, id: i32) -> Result<ReportRow, AppError> {
        let row = self
            .repo
            .find_row(conn, id)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Report))?;

        if !scope.can_access(&row.report) {
            return Err(AppError::Forbidden);
        }
        Ok(row)
    }

    /// Várias intervenções de uma vez (PDF combinado); as de outros operadores são recusadas.
    pub async fn get_reports(
        &self,
        conn: &mut PgConnection,
        scope: ReportScope,
        ids: &[i32],
    ) -> Result<Vec<ReportRow>, AppError> {
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            rows.push(self.get_report(&mut *conn, scope, *id).await?);
        }
        Ok(rows)
    }

    pub async fn create_report(
        &self,
        conn: &mut PgConnection,
        scope: ReportScope,
        payload: ReportPayload,
    ) -> Result<Report, AppError> {
        let payload = payload.normalized();
        self.check_references(&mut *conn, &payload).await?;

        // O operador é sempre quem registra
        let report = self.repo.insert(&mut *conn, scope.caller_id(), &payload).await?;
        tracing::info!("📝 Intervenção {} registrada por {} ({})", report.id, scope.caller_id(), report.work_ref());
        Ok(report)
    }

    pub async fn update_report(
        &self,
        conn: &mut PgConnection,
        scope: ReportScope,
        id: i32,
        payload: ReportPayload,
    ) -> Result<Report, AppError> {
        self.owned_report(&mut *conn, scope, id).await?;

        let payload = payload.normalized();
        self.check_references(&mut *conn, &payload).await?;

        self.repo
            .update(&mut *conn, id, &payload)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Report))
    }

    pub async fn delete_report(&self, conn: &mut PgConnection, scope: ReportScope, id: i32) -> Result<(), AppError> {
        self.owned_report(&mut *conn, scope, id).await?;
        self.repo.delete(&mut *conn, id).await?;
        tracing::info!("🗑️ Intervenção {} excluída por {}", id, scope.caller_id());
        Ok(())
    }

    pub async fn mark_emailed(&self, conn: &mut PgConnection, id: i32) -> Result<(), AppError> {
        if !self.repo.stamp_email_date(conn, id, chrono::Utc::now()).await? {
            return Err(AppError::ResourceNotFound(Entity::Report));
        }
        Ok(())
    }

    async fn owned_report(&self, conn: &mut PgConnection, scope: ReportScope, id: i32) -> Result<Report, AppError> {
        let report = self
            .repo
            .find(conn, id)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Report))?;

        if !scope.can_access(&report) {
            tracing::warn!("Usuário {} tentou alterar a intervenção {} de outro operador", scope.caller_id(), id);
            return Err(AppError::Forbidden);
        }
        Ok(report)
    }

    // A referência polimórfica não tem FK: a existência é conferida aqui
    async fn check_references(&self, conn: &mut PgConnection, payload: &ReportPayload) -> Result<(), AppError> {
        if !self.repo.work_ref_exists(&mut *conn, payload.work).await? {
            return Err(AppError::InvalidWorkReference(payload.work.to_string()));
        }

        if let Some(supervisor_id) = payload.supervisor_id {
            if self.user_repo.find_by_id_with(&mut *conn, supervisor_id).await?.is_none() {
                return Err(AppError::InvalidSupervisor(supervisor_id));
            }
        }
        Ok(())
    }
}

/// "MM_AAAA" do início do período, para nomear os arquivos exportados.
pub fn period_label(period: &DateRange) -> Option<String> {
    period.start.map(|start| start.format("%m_%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::models::{auth::Role, reports::ReportFilterParams};

    fn user(id: i32, role: Role) -> User {
        User {
            id,
            role,
            client_id: None,
            first_name: "Mario".into(),
            last_name: "Rossi".into(),
            email: None,
            username: format!("user{id}"),
            password_hash: String::new(),
            must_change_password: false,
            phone_number: None,
        }
    }

    fn filter(params: ReportFilterParams) -> ReportFilter {
        ReportFilter::try_from(params).unwrap()
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn operator_cannot_widen_scope_to_someone_else() {
        let scope = ReportScope::for_user(&user(4, Role::Operator));
        let requested = filter(ReportFilterParams { operator_id: Some(9), ..Default::default() });
        assert_eq!(scope.criteria(&requested, None).operator_id, Some(4));

        let unfiltered = filter(ReportFilterParams::default());
        assert_eq!(scope.criteria(&unfiltered, None).operator_id, Some(4));
    }

    #[test]
    fn admin_filter_is_taken_as_given() {
        let scope = ReportScope::for_user(&user(1, Role::Admin));
        let requested = filter(ReportFilterParams { operator_id: Some(9), ..Default::default() });
        assert_eq!(scope.criteria(&requested, None).operator_id, Some(9));
        assert_eq!(scope.criteria(&ReportFilter::default(), None).operator_id, None);
    }

    #[test]
    fn default_work_type_applies_only_when_nothing_narrows_it() {
        let scope = ReportScope::for_user(&user(1, Role::Admin));
        let default = Some(WorkTypeDefault::Only(WorkType::Machine));

        let plain = ReportFilter::default();
        assert_eq!(scope.criteria(&plain, default).work_type, Some(WorkType::Machine));
        assert_eq!(scope.criteria(&plain, Some(WorkTypeDefault::Any)).work_type, None);
        assert_eq!(scope.criteria(&plain, None).work_type, None);

        let explicit = filter(ReportFilterParams { work_type: Some("commission".into()), ..Default::default() });
        assert_eq!(scope.criteria(&explicit, default).work_type, Some(WorkType::Commission));

        let by_plant = filter(ReportFilterParams { plant_id: Some(3), ..Default::default() });
        assert_eq!(
            scope.criteria(&by_plant, Some(WorkTypeDefault::Only(WorkType::Commission))).work_type,
            Some(WorkType::Machine)
        );
    }

    #[test]
    fn ownership_is_checked_against_operator() {
        let operator = ReportScope::for_user(&user(4, Role::Operator));
        let admin = ReportScope::for_user(&user(1, Role::Admin));
        let report = Report {
            id: 10,
            operator_id: 7,
            work_type: WorkType::Machine,
            work_id: 2,
            date: date("2024-03-15"),
            intervention_duration: "2.5".into(),
            intervention_type: "Manutenzione ordinaria".into(),
            intervention_location: None,
            supervisor_id: None,
            description: None,
            notes: None,
            trip_kms: "0.0".into(),
            cost: "0.0".into(),
            date_created: chrono::Utc::now(),
            email_date: None,
        };
        assert!(!operator.can_access(&report));
        assert!(admin.can_access(&report));
        assert!(ReportScope::for_user(&user(7, Role::Operator)).can_access(&report));
    }

    #[test]
    fn months_are_deduplicated_and_chronological() {
        let keys = vec![
            MonthKey { year: 2024, month: 2 },
            MonthKey { year: 2023, month: 11 },
            MonthKey { year: 2024, month: 10 },
            MonthKey { year: 2024, month: 2 },
        ];
        let months = collect_months(keys.clone());
        assert_eq!(months, vec!["11/2023", "02/2024", "10/2024"]);
        // Idempotente e estável
        assert_eq!(collect_months(keys), months);
    }

    #[test]
    fn daily_hours_cover_every_day_of_the_month() {
        let period = DateRange::from_month("02/2024").unwrap();
        let totals = vec![
            DayTotal { day: date("2024-02-05"), hours: Decimal::new(75, 1), reports: 2 },
            DayTotal { day: date("2024-02-29"), hours: Decimal::new(4, 0), reports: 1 },
        ];
        let days = fill_month(period, &totals);
        assert_eq!(days.len(), 29);
        assert_eq!(days[0], DailyHours { date: date("2024-02-01"), hours: Decimal::ZERO, count: 0 });
        assert_eq!(days[4].hours, Decimal::new(75, 1));
        assert_eq!(days[4].count, 2);
        assert_eq!(days[28].date, date("2024-02-29"));
        assert_eq!(days[28].count, 1);
    }

    #[test]
    fn daily_hours_for_empty_month_are_all_zero() {
        let period = DateRange::from_month("04/2024").unwrap();
        let days = fill_month(period, &[]);
        assert_eq!(days.len(), 30);
        assert!(days.iter().all(|d| d.count == 0 && d.hours == Decimal::ZERO));
    }

    #[test]
    fn period_label_uses_start_month() {
        let period = DateRange::from_month("03/2024").unwrap();
        assert_eq!(period_label(&period).as_deref(), Some("03_2024"));
        assert_eq!(period_label(&DateRange::default()), None);
    }
}
