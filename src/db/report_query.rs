// src/db/report_query.rs

// Montagem dinâmica das consultas sobre a tabela de intervenções.
// Cada filtro ausente simplesmente não gera cláusula; os presentes viram binds.

use sqlx::{Postgres, QueryBuilder};

use crate::models::reports::{DateRange, ReportSort, SortBy, SortOrder, WorkType};

// Resolução da referência polimórfica: os dois ramos são LEFT JOIN condicionados
// ao tipo, e o cliente vem de quem não for nulo.
const REPORT_JOINS: &str = r#"
    FROM reports r
    JOIN operators o ON o.id = r.operator_id
    LEFT JOIN operators sup ON sup.id = r.supervisor_id
    LEFT JOIN machines m ON r.work_type = 'machine' AND m.id = r.work_id
    LEFT JOIN plants p ON p.id = m.plant_id
    LEFT JOIN commissions c ON r.work_type = 'commission' AND c.id = r.work_id
    LEFT JOIN clients cl ON cl.id = COALESCE(p.client_id, c.client_id)
"#;

const REPORT_COLUMNS: &str = r#"
    SELECT
        r.id, r.operator_id, r.work_type, r.work_id, r.date,
        r.intervention_duration, r.intervention_type, r.intervention_location,
        r.supervisor_id, r.description, r.notes, r.trip_kms, r.cost,
        r.date_created, r.email_date,
        o.first_name, o.last_name,
        sup.first_name AS supervisor_first_name,
        sup.last_name AS supervisor_last_name,
        cl.id AS client_id,
        cl.name AS client_name,
        p.id AS plant_id,
        p.name AS plant_name,
        p.city AS plant_city,
        p.address AS plant_address,
        m.name AS machine_name,
        m.code AS machine_code,
        m.cost_center,
        c.code AS commission_code,
        c.description AS commission_description
"#;

/// Filtros já escopados (o operador de quem não é admin já foi forçado).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportCriteria {
    pub operator_id: Option<i32>,
    pub client_id: Option<i32>,
    pub plant_id: Option<i32>,
    pub work_id: Option<i32>,
    pub work_type: Option<WorkType>,
    pub period: DateRange,
}

impl ReportCriteria {
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(operator_id) = self.operator_id {
            qb.push(" AND r.operator_id = ").push_bind(operator_id);
        }
        if let Some(work_type) = self.work_type {
            qb.push(" AND r.work_type = ").push_bind(work_type);
        }
        if let Some(work_id) = self.work_id {
            qb.push(" AND r.work_id = ").push_bind(work_id);
        }
        if let Some(plant_id) = self.plant_id {
            qb.push(" AND p.id = ").push_bind(plant_id);
        }
        if let Some(client_id) = self.client_id {
            qb.push(" AND cl.id = ").push_bind(client_id);
        }

        match (self.period.start, self.period.end) {
            (Some(start), Some(end)) => {
                qb.push(" AND r.date BETWEEN ").push_bind(start).push(" AND ").push_bind(end);
            }
            (Some(start), None) => {
                qb.push(" AND r.date >= ").push_bind(start);
            }
            (None, Some(end)) => {
                qb.push(" AND r.date <= ").push_bind(end);
            }
            (None, None) => {}
        }
    }

    /// Listagem completa com joins, ordenação e limite opcional.
    pub fn list_query(&self, sort: ReportSort, limit: Option<i64>) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(REPORT_COLUMNS);
        qb.push(REPORT_JOINS);
        self.push_filters(&mut qb);

        let column = match sort.by {
            SortBy::CreatedAt => "r.date_created",
            SortBy::LastName => "o.last_name",
            SortBy::Date => "r.date",
        };
        let direction = match sort.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        // Desempate estável pelo id
        qb.push(format!(" ORDER BY {column} {direction}, r.id {direction}"));

        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        qb
    }

    /// Pares (ano, mês) distintos entre as intervenções filtradas.
    pub fn months_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(
            "SELECT DISTINCT EXTRACT(YEAR FROM r.date)::int AS year, EXTRACT(MONTH FROM r.date)::int AS month",
        );
        qb.push(REPORT_JOINS);
        self.push_filters(&mut qb);
        qb
    }

    /// Soma de horas e contagem por dia (só os dias que têm dados).
    pub fn daily_totals_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(
            r#"SELECT r.date AS day,
                COALESCE(SUM(NULLIF(REPLACE(TRIM(r.intervention_duration), ',', '.'), '')::numeric), 0) AS hours,
                COUNT(*) AS reports"#,
        );
        qb.push(REPORT_JOINS);
        self.push_filters(&mut qb);
        qb.push(" GROUP BY r.date ORDER BY r.date");
        qb
    }

    /// Uma única intervenção com todas as dimensões.
    pub fn by_id_query(report_id: i32) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(REPORT_COLUMNS);
        qb.push(REPORT_JOINS);
        qb.push(" WHERE r.id = ").push_bind(report_id);
        qb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn where_clause(sql: &str) -> &str {
        let start = sql.find("WHERE").expect("sem WHERE");
        &sql[start..]
    }

    #[test]
    fn no_filters_emit_no_predicates() {
        let qb = ReportCriteria::default().list_query(ReportSort::default(), None);
        let sql = qb.sql();
        assert_eq!(
            where_clause(sql),
            "WHERE TRUE ORDER BY r.date DESC, r.id DESC"
        );
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn every_given_filter_becomes_a_bind() {
        let criteria = ReportCriteria {
            operator_id: Some(3),
            client_id: Some(5),
            plant_id: Some(8),
            work_id: Some(13),
            work_type: Some(WorkType::Machine),
            period: DateRange { start: Some(date("2024-03-01")), end: Some(date("2024-03-31")) },
        };
        let qb = criteria.list_query(ReportSort::default(), Some(50));
        let sql = qb.sql();
        assert!(sql.contains("r.operator_id = $1"));
        assert!(sql.contains("r.work_type = $2"));
        assert!(sql.contains("r.work_id = $3"));
        assert!(sql.contains("p.id = $4"));
        assert!(sql.contains("cl.id = $5"));
        assert!(sql.contains("r.date BETWEEN $6 AND $7"));
        assert!(sql.ends_with("LIMIT $8"));
    }

    #[test]
    fn single_bound_interval_uses_one_comparison() {
        let start_only = ReportCriteria {
            period: DateRange { start: Some(date("2024-01-10")), end: None },
            ..Default::default()
        };
        let sql = start_only.list_query(ReportSort::default(), None).into_sql();
        assert!(sql.contains("r.date >= $1"));
        assert!(!sql.contains("BETWEEN"));

        let end_only = ReportCriteria {
            period: DateRange { start: None, end: Some(date("2024-01-10")) },
            ..Default::default()
        };
        let sql = end_only.list_query(ReportSort::default(), None).into_sql();
        assert!(sql.contains("r.date <= $1"));
    }

    #[test]
    fn polymorphic_reference_is_joined_on_both_branches() {
        let sql = ReportCriteria::default().list_query(ReportSort::default(), None).into_sql();
        assert!(sql.contains("LEFT JOIN machines m ON r.work_type = 'machine' AND m.id = r.work_id"));
        assert!(sql.contains("LEFT JOIN commissions c ON r.work_type = 'commission' AND c.id = r.work_id"));
        assert!(sql.contains("COALESCE(p.client_id, c.client_id)"));
    }

    #[test]
    fn sort_uses_only_allow_listed_columns() {
        let sort = ReportSort { by: SortBy::LastName, order: SortOrder::Asc };
        let sql = ReportCriteria::default().list_query(sort, None).into_sql();
        assert!(sql.ends_with("ORDER BY o.last_name ASC, r.id ASC"));
    }

    #[test]
    fn aggregate_queries_share_the_filters() {
        let criteria = ReportCriteria { operator_id: Some(2), ..Default::default() };
        let months = criteria.months_query().into_sql();
        assert!(months.starts_with("SELECT DISTINCT"));
        assert!(months.contains("r.operator_id = $1"));

        let daily = criteria.daily_totals_query().into_sql();
        assert!(daily.contains("::numeric"));
        assert!(daily.ends_with("GROUP BY r.date ORDER BY r.date"));
    }
}
