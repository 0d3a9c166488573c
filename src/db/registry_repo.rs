// src/db/registry_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::registry::{
        Client, ClientPayload, Commission, CommissionPayload, CommissionStatus, CommissionWithClient,
        LookupEntry, Machine, MachinePayload, MachineWithPlant, Plant, PlantPayload, PlantWithClient,
    },
};

const CLIENT_COLUMNS: &str =
    "id, name, province, city, cap, address, email, contact, phone_number, date_created";

const PLANT_COLUMNS: &str = "p.id, p.client_id, p.name, p.city, p.province, p.cap, p.address, \
     p.email, p.contact, p.phone_number, p.date_created";

const MACHINE_COLUMNS: &str = "m.id, m.plant_id, m.robotic_island, m.code, m.name, m.brand, \
     m.model, m.serial_number, m.production_year, m.cost_center, m.description, m.date_created";

const COMMISSION_COLUMNS: &str = "c.id, c.client_id, c.code, c.description, c.status, c.date_created";

// Cadastros de apoio às intervenções: clientes, estabelecimentos, máquinas e comissões
#[derive(Clone, Default)]
pub struct RegistryRepository;

impl RegistryRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn list_clients<'e, E>(&self, executor: E) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name"
        ))
        .fetch_all(executor)
        .await?;

        Ok(clients)
    }

    pub async fn find_client<'e, E>(&self, executor: E, id: i32) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(client)
    }

    pub async fn create_client<'e, E>(&self, executor: E, payload: &ClientPayload) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (name, province, city, cap, address, email, contact, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(payload.name.trim())
        .bind(payload.province.as_deref())
        .bind(payload.city.as_deref())
        .bind(payload.cap.as_deref())
        .bind(payload.address.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.contact.as_deref())
        .bind(payload.phone_number.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| unique_violation(e, AppError::ClientNameAlreadyExists))
    }

    pub async fn update_client<'e, E>(
        &self,
        executor: E,
        id: i32,
        payload: &ClientPayload,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET name = $2, province = $3, city = $4, cap = $5, address = $6,
                email = $7, contact = $8, phone_number = $9
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.name.trim())
        .bind(payload.province.as_deref())
        .bind(payload.city.as_deref())
        .bind(payload.cap.as_deref())
        .bind(payload.address.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.contact.as_deref())
        .bind(payload.phone_number.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(|e| unique_violation(e, AppError::ClientNameAlreadyExists))
    }

    pub async fn delete_client<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, "clients", id).await
    }

    /// (estabelecimentos, comissões abertas, comissões fechadas)
    pub async fn client_dependents<'e, E>(&self, executor: E, id: i32) -> Result<(i64, i64, i64), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM plants WHERE client_id = $1),
                (SELECT COUNT(*) FROM commissions WHERE client_id = $1 AND status = 'open'),
                (SELECT COUNT(*) FROM commissions WHERE client_id = $1 AND status = 'closed')
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    // =========================================================================
    //  ESTABELECIMENTOS
    // =========================================================================

    pub async fn list_plants<'e, E>(
        &self,
        executor: E,
        client_id: Option<i32>,
    ) -> Result<Vec<PlantWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plants = sqlx::query_as::<_, PlantWithClient>(&format!(
            r#"
            SELECT {PLANT_COLUMNS}, cl.name AS client_name
            FROM plants p
            JOIN clients cl ON cl.id = p.client_id
            WHERE ($1::int IS NULL OR p.client_id = $1)
            ORDER BY cl.name, p.name
            "#
        ))
        .bind(client_id)
        .fetch_all(executor)
        .await?;

        Ok(plants)
    }

    pub async fn find_plant<'e, E>(&self, executor: E, id: i32) -> Result<Option<PlantWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plant = sqlx::query_as::<_, PlantWithClient>(&format!(
            r#"
            SELECT {PLANT_COLUMNS}, cl.name AS client_name
            FROM plants p
            JOIN clients cl ON cl.id = p.client_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(plant)
    }

    pub async fn create_plant<'e, E>(&self, executor: E, payload: &PlantPayload) -> Result<Plant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plant = sqlx::query_as::<_, Plant>(&format!(
            r#"
            INSERT INTO plants AS p (client_id, name, city, province, cap, address, email, contact, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PLANT_COLUMNS}
            "#
        ))
        .bind(payload.client_id)
        .bind(payload.name.trim())
        .bind(payload.city.as_deref())
        .bind(payload.province.as_deref())
        .bind(payload.cap.as_deref())
        .bind(payload.address.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.contact.as_deref())
        .bind(payload.phone_number.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(plant)
    }

    pub async fn update_plant<'e, E>(
        &self,
        executor: E,
        id: i32,
        payload: &PlantPayload,
    ) -> Result<Option<Plant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plant = sqlx::query_as::<_, Plant>(&format!(
            r#"
            UPDATE plants AS p
            SET client_id = $2, name = $3, city = $4, province = $5, cap = $6,
                address = $7, email = $8, contact = $9, phone_number = $10
            WHERE p.id = $1
            RETURNING {PLANT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.client_id)
        .bind(payload.name.trim())
        .bind(payload.city.as_deref())
        .bind(payload.province.as_deref())
        .bind(payload.cap.as_deref())
        .bind(payload.address.as_deref())
        .bind(payload.email.as_deref())
        .bind(payload.contact.as_deref())
        .bind(payload.phone_number.as_deref())
        .fetch_optional(executor)
        .await?;

        Ok(plant)
    }

    pub async fn delete_plant<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, "plants", id).await
    }

    pub async fn count_machines_in_plant<'e, E>(&self, executor: E, plant_id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM machines WHERE plant_id = $1")
            .bind(plant_id)
            .fetch_one(executor)
            .await?;

        Ok(total)
    }

    // =========================================================================
    //  MÁQUINAS
    // =========================================================================

    pub async fn list_machines<'e, E>(
        &self,
        executor: E,
        plant_id: Option<i32>,
        limit: Option<i64>,
    ) -> Result<Vec<MachineWithPlant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let machines = sqlx::query_as::<_, MachineWithPlant>(&format!(
            r#"
            SELECT {MACHINE_COLUMNS}, p.name AS plant_name, cl.id AS client_id, cl.name AS client_name
            FROM machines m
            JOIN plants p ON p.id = m.plant_id
            JOIN clients cl ON cl.id = p.client_id
            WHERE ($1::int IS NULL OR m.plant_id = $1)
            ORDER BY m.name, m.id
            LIMIT $2
            "#
        ))
        .bind(plant_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(machines)
    }

    pub async fn find_machine<'e, E>(&self, executor: E, id: i32) -> Result<Option<MachineWithPlant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let machine = sqlx::query_as::<_, MachineWithPlant>(&format!(
            r#"
            SELECT {MACHINE_COLUMNS}, p.name AS plant_name, cl.id AS client_id, cl.name AS client_name
            FROM machines m
            JOIN plants p ON p.id = m.plant_id
            JOIN clients cl ON cl.id = p.client_id
            WHERE m.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(machine)
    }

    pub async fn create_machine<'e, E>(&self, executor: E, payload: &MachinePayload) -> Result<Machine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let machine = sqlx::query_as::<_, Machine>(&format!(
            r#"
            INSERT INTO machines AS m
                (plant_id, robotic_island, code, name, brand, model, serial_number,
                 production_year, cost_center, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MACHINE_COLUMNS}
            "#
        ))
        .bind(payload.plant_id)
        .bind(payload.robotic_island.as_deref())
        .bind(payload.code.as_deref())
        .bind(payload.name.trim())
        .bind(payload.brand.as_deref())
        .bind(payload.model.as_deref())
        .bind(payload.serial_number.as_deref())
        .bind(payload.production_year.as_deref())
        .bind(payload.cost_center.as_deref())
        .bind(payload.description.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(machine)
    }

    pub async fn update_machine<'e, E>(
        &self,
        executor: E,
        id: i32,
        payload: &MachinePayload,
    ) -> Result<Option<Machine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let machine = sqlx::query_as::<_, Machine>(&format!(
            r#"
            UPDATE machines AS m
            SET plant_id = $2, robotic_island = $3, code = $4, name = $5, brand = $6,
                model = $7, serial_number = $8, production_year = $9, cost_center = $10,
                description = $11
            WHERE m.id = $1
            RETURNING {MACHINE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.plant_id)
        .bind(payload.robotic_island.as_deref())
        .bind(payload.code.as_deref())
        .bind(payload.name.trim())
        .bind(payload.brand.as_deref())
        .bind(payload.model.as_deref())
        .bind(payload.serial_number.as_deref())
        .bind(payload.production_year.as_deref())
        .bind(payload.cost_center.as_deref())
        .bind(payload.description.as_deref())
        .fetch_optional(executor)
        .await?;

        Ok(machine)
    }

    pub async fn delete_machine<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, "machines", id).await
    }

    // =========================================================================
    //  COMISSÕES
    // =========================================================================

    pub async fn list_commissions<'e, E>(
        &self,
        executor: E,
        client_id: Option<i32>,
        status: Option<CommissionStatus>,
    ) -> Result<Vec<CommissionWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commissions = sqlx::query_as::<_, CommissionWithClient>(&format!(
            r#"
            SELECT {COMMISSION_COLUMNS}, cl.name AS client_name
            FROM commissions c
            JOIN clients cl ON cl.id = c.client_id
            WHERE ($1::int IS NULL OR c.client_id = $1)
              AND ($2::commission_status IS NULL OR c.status = $2)
            ORDER BY c.date_created DESC, c.id DESC
            "#
        ))
        .bind(client_id)
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(commissions)
    }

    pub async fn find_commission<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<CommissionWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commission = sqlx::query_as::<_, CommissionWithClient>(&format!(
            r#"
            SELECT {COMMISSION_COLUMNS}, cl.name AS client_name
            FROM commissions c
            JOIN clients cl ON cl.id = c.client_id
            WHERE c.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(commission)
    }

    pub async fn create_commission<'e, E>(
        &self,
        executor: E,
        payload: &CommissionPayload,
    ) -> Result<Commission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Commission>(&format!(
            r#"
            INSERT INTO commissions AS c (client_id, code, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {COMMISSION_COLUMNS}
            "#
        ))
        .bind(payload.client_id)
        .bind(payload.code.trim())
        .bind(payload.description.as_deref())
        .bind(payload.status.unwrap_or(CommissionStatus::Open))
        .fetch_one(executor)
        .await
        .map_err(|e| unique_violation(e, AppError::CommissionCodeAlreadyExists))
    }

    pub async fn update_commission<'e, E>(
        &self,
        executor: E,
        id: i32,
        payload: &CommissionPayload,
    ) -> Result<Option<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Commission>(&format!(
            r#"
            UPDATE commissions AS c
            SET client_id = $2, code = $3, description = $4, status = COALESCE($5, c.status)
            WHERE c.id = $1
            RETURNING {COMMISSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.client_id)
        .bind(payload.code.trim())
        .bind(payload.description.as_deref())
        .bind(payload.status)
        .fetch_optional(executor)
        .await
        .map_err(|e| unique_violation(e, AppError::CommissionCodeAlreadyExists))
    }

    pub async fn set_commission_status<'e, E>(
        &self,
        executor: E,
        id: i32,
        status: CommissionStatus,
    ) -> Result<Option<Commission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let commission = sqlx::query_as::<_, Commission>(&format!(
            "UPDATE commissions AS c SET status = $2 WHERE c.id = $1 RETURNING {COMMISSION_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;

        Ok(commission)
    }

    pub async fn delete_commission<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, "commissions", id).await
    }

    // =========================================================================
    //  TABELAS DE APOIO
    // =========================================================================

    pub async fn list_intervention_types<'e, E>(&self, executor: E) -> Result<Vec<LookupEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, LookupEntry>("SELECT id, name FROM intervention_types ORDER BY id")
            .fetch_all(executor)
            .await?;

        Ok(entries)
    }

    pub async fn list_locations<'e, E>(&self, executor: E) -> Result<Vec<LookupEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, LookupEntry>("SELECT id, name FROM locations ORDER BY id")
            .fetch_all(executor)
            .await?;

        Ok(entries)
    }
}

// O nome da tabela nunca vem do usuário: só das constantes acima
async fn delete_by_id<'e, E>(executor: E, table: &'static str, id: i32) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn unique_violation(e: sqlx::Error, conflict: AppError) -> AppError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => conflict,
        _ => AppError::DatabaseError(e),
    }
}
