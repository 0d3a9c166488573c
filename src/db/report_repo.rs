// src/db/report_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    db::report_query::ReportCriteria,
    models::reports::{DayTotal, MonthKey, Report, ReportPayload, ReportRow, ReportSort, WorkRef, EMPTY_AMOUNT},
};

const REPORT_COLUMNS: &str = "id, operator_id, work_type, work_id, date, intervention_duration, \
     intervention_type, intervention_location, supervisor_id, description, notes, trip_kms, cost, \
     date_created, email_date";

#[derive(Clone, Default)]
pub struct ReportRepository;

impl ReportRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  LEITURA (sempre via ReportCriteria já escopado)
    // =========================================================================

    pub async fn list<'e, E>(
        &self,
        executor: E,
        criteria: &ReportCriteria,
        sort: ReportSort,
        limit: Option<i64>,
    ) -> Result<Vec<ReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = criteria.list_query(sort, limit);
        let rows = qb.build_query_as::<ReportRow>().fetch_all(executor).await?;
        Ok(rows)
    }

    pub async fn months<'e, E>(&self, executor: E, criteria: &ReportCriteria) -> Result<Vec<MonthKey>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = criteria.months_query();
        let months = qb.build_query_as::<MonthKey>().fetch_all(executor).await?;
        Ok(months)
    }

    pub async fn daily_totals<'e, E>(
        &self,
        executor: E,
        criteria: &ReportCriteria,
    ) -> Result<Vec<DayTotal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = criteria.daily_totals_query();
        let totals = qb.build_query_as::<DayTotal>().fetch_all(executor).await?;
        Ok(totals)
    }

    pub async fn find_row<'e, E>(&self, executor: E, id: i32) -> Result<Option<ReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = ReportCriteria::by_id_query(id);
        let row = qb.build_query_as::<ReportRow>().fetch_optional(executor).await?;
        Ok(row)
    }

    pub async fn find<'e, E>(&self, executor: E, id: i32) -> Result<Option<Report>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let report = sqlx::query_as::<_, Report>(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(report)
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        operator_id: i32,
        payload: &ReportPayload,
    ) -> Result<Report, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let report = sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports
                (operator_id, work_type, work_id, date, intervention_duration, intervention_type,
                 intervention_location, supervisor_id, description, notes, trip_kms, cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(operator_id)
        .bind(payload.work.work_type())
        .bind(payload.work.id())
        .bind(payload.date)
        .bind(&payload.intervention_duration)
        .bind(&payload.intervention_type)
        .bind(payload.intervention_location.as_deref())
        .bind(payload.supervisor_id)
        .bind(payload.description.as_deref())
        .bind(payload.notes.as_deref())
        .bind(payload.trip_kms.as_deref().unwrap_or(EMPTY_AMOUNT))
        .bind(payload.cost.as_deref().unwrap_or(EMPTY_AMOUNT))
        .fetch_one(executor)
        .await?;

        Ok(report)
    }

    // Atualização de linha inteira; o operador original é preservado
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        payload: &ReportPayload,
    ) -> Result<Option<Report>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let report = sqlx::query_as::<_, Report>(&format!(
            r#"
            UPDATE reports
            SET work_type = $2, work_id = $3, date = $4, intervention_duration = $5,
                intervention_type = $6, intervention_location = $7, supervisor_id = $8,
                description = $9, notes = $10, trip_kms = $11, cost = $12
            WHERE id = $1
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.work.work_type())
        .bind(payload.work.id())
        .bind(payload.date)
        .bind(&payload.intervention_duration)
        .bind(&payload.intervention_type)
        .bind(payload.intervention_location.as_deref())
        .bind(payload.supervisor_id)
        .bind(payload.description.as_deref())
        .bind(payload.notes.as_deref())
        .bind(payload.trip_kms.as_deref().unwrap_or(EMPTY_AMOUNT))
        .bind(payload.cost.as_deref().unwrap_or(EMPTY_AMOUNT))
        .fetch_optional(executor)
        .await?;

        Ok(report)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn stamp_email_date<'e, E>(
        &self,
        executor: E,
        id: i32,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE reports SET email_date = $2 WHERE id = $1")
            .bind(id)
            .bind(sent_at)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  INTEGRIDADE DA REFERÊNCIA POLIMÓRFICA
    // =========================================================================

    /// A referência precisa apontar para uma linha existente da tabela certa.
    pub async fn work_ref_exists<'e, E>(&self, executor: E, work: WorkRef) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match work {
            WorkRef::Machine(_) => "SELECT EXISTS (SELECT 1 FROM machines WHERE id = $1)",
            WorkRef::Commission(_) => "SELECT EXISTS (SELECT 1 FROM commissions WHERE id = $1)",
        };
        let exists: bool = sqlx::query_scalar(sql).bind(work.id()).fetch_one(executor).await?;
        Ok(exists)
    }

    pub async fn count_by_work<'e, E>(&self, executor: E, work: WorkRef) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE work_type = $1 AND work_id = $2")
            .bind(work.work_type())
            .bind(work.id())
            .fetch_one(executor)
            .await?;

        Ok(total)
    }
}
