// src/services/registry_service.rs

use sqlx::{Acquire, Executor, PgConnection, Postgres};

use crate::{
    common::error::{AppError, Entity},
    db::{RegistryRepository, ReportRepository},
    models::{
        registry::{
            Client, ClientPayload, Commission, CommissionPayload, CommissionStatus, CommissionWithClient,
            LookupEntry, Machine, MachinePayload, MachineWithPlant, Plant, PlantPayload, PlantWithClient,
        },
        reports::WorkRef,
    },
};

/// Motivo do bloqueio de exclusão de um cliente, na ordem em que é verificado.
pub fn client_deletion_blocker(plants: i64, open_commissions: i64, closed_commissions: i64) -> Option<&'static str> {
    if plants > 0 {
        Some("delete_blocked.client_has_plants")
    } else if open_commissions > 0 {
        Some("delete_blocked.client_has_open_commissions")
    } else if closed_commissions > 0 {
        Some("delete_blocked.client_has_closed_commissions")
    } else {
        None
    }
}

#[derive(Clone)]
pub struct RegistryService {
    repo: RegistryRepository,
    report_repo: ReportRepository,
}

impl RegistryService {
    pub fn new(repo: RegistryRepository, report_repo: ReportRepository) -> Self {
        Self { repo, report_repo }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn list_clients<'e, E>(&self, executor: E) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_clients(executor).await
    }

    pub async fn get_client<'e, E>(&self, executor: E, id: i32) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_client(executor, id)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Client))
    }

    pub async fn create_client<'e, E>(&self, executor: E, payload: &ClientPayload) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_client(executor, payload).await
    }

    pub async fn update_client<'e, E>(&self, executor: E, id: i32, payload: &ClientPayload) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update_client(executor, id, payload)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Client))
    }

    /// Bloqueada enquanto houver estabelecimentos ou comissões (abertas ou fechadas) do cliente.
    pub async fn delete_client(&self, conn: &mut PgConnection, id: i32) -> Result<(), AppError> {
        let mut tx = conn.begin().await?;

        if self.repo.find_client(&mut *tx, id).await?.is_none() {
            return Err(AppError::ResourceNotFound(Entity::Client));
        }

        let (plants, open_commissions, closed_commissions) = self.repo.client_dependents(&mut *tx, id).await?;
        if let Some(reason) = client_deletion_blocker(plants, open_commissions, closed_commissions) {
            tracing::warn!("Exclusão do cliente {} bloqueada: {}", id, reason);
            return Err(AppError::DeletionBlocked(reason));
        }

        self.repo.delete_client(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  ESTABELECIMENTOS
    // =========================================================================

    pub async fn list_plants<'e, E>(&self, executor: E, client_id: Option<i32>) -> Result<Vec<PlantWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_plants(executor, client_id).await
    }

    pub async fn get_plant<'e, E>(&self, executor: E, id: i32) -> Result<PlantWithClient, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_plant(executor, id)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Plant))
    }

    pub async fn create_plant(&self, conn: &mut PgConnection, payload: &PlantPayload) -> Result<Plant, AppError> {
        self.ensure_client(&mut *conn, payload.client_id).await?;
        self.repo.create_plant(&mut *conn, payload).await
    }

    pub async fn update_plant(&self, conn: &mut PgConnection, id: i32, payload: &PlantPayload) -> Result<Plant, AppError> {
        self.ensure_client(&mut *conn, payload.client_id).await?;
        self.repo
            .update_plant(&mut *conn, id, payload)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Plant))
    }

    pub async fn delete_plant(&self, conn: &mut PgConnection, id: i32) -> Result<(), AppError> {
        if self.repo.find_plant(&mut *conn, id).await?.is_none() {
            return Err(AppError::ResourceNotFound(Entity::Plant));
        }
        if self.repo.count_machines_in_plant(&mut *conn, id).await? > 0 {
            tracing::warn!("Exclusão do estabelecimento {} bloqueada: há máquinas", id);
            return Err(AppError::DeletionBlocked("delete_blocked.plant_has_machines"));
        }
        self.repo.delete_plant(&mut *conn, id).await?;
        Ok(())
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
        self.repo.list_machines(executor, plant_id, limit.filter(|l| *l > 0)).await
    }

    pub async fn get_machine<'e, E>(&self, executor: E, id: i32) -> Result<MachineWithPlant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_machine(executor, id)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Machine))
    }

    pub async fn create_machine(&self, conn: &mut PgConnection, payload: &MachinePayload) -> Result<Machine, AppError> {
        self.ensure_plant(&mut *conn, payload.plant_id).await?;
        self.repo.create_machine(&mut *conn, payload).await
    }

    pub async fn update_machine(
        &self,
        conn: &mut PgConnection,
        id: i32,
        payload: &MachinePayload,
    ) -> Result<Machine, AppError> {
        self.ensure_plant(&mut *conn, payload.plant_id).await?;
        self.repo
            .update_machine(&mut *conn, id, payload)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Machine))
    }

    pub async fn delete_machine(&self, conn: &mut PgConnection, id: i32) -> Result<(), AppError> {
        if self.repo.find_machine(&mut *conn, id).await?.is_none() {
            return Err(AppError::ResourceNotFound(Entity::Machine));
        }
        if self.report_repo.count_by_work(&mut *conn, WorkRef::Machine(id)).await? > 0 {
            tracing::warn!("Exclusão da máquina {} bloqueada: há intervenções", id);
            return Err(AppError::DeletionBlocked("delete_blocked.machine_has_reports"));
        }
        self.repo.delete_machine(&mut *conn, id).await?;
        Ok(())
    }

    // =========================================================================
    //  COMISSÕES
    // =========================================================================

    pub async fn list_commissions<'e, E>(
        &self,
        executor: E,
        client_id: Option<i32>,
        open_only: bool,
    ) -> Result<Vec<CommissionWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let status = open_only.then_some(CommissionStatus::Open);
        self.repo.list_commissions(executor, client_id, status).await
    }

    pub async fn get_commission<'e, E>(&self, executor: E, id: i32) -> Result<CommissionWithClient, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_commission(executor, id)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Commission))
    }

    pub async fn create_commission(
        &self,
        conn: &mut PgConnection,
        payload: &CommissionPayload,
    ) -> Result<Commission, AppError> {
        self.ensure_client(&mut *conn, payload.client_id).await?;
        self.repo.create_commission(&mut *conn, payload).await
    }

    pub async fn update_commission(
        &self,
        conn: &mut PgConnection,
        id: i32,
        payload: &CommissionPayload,
    ) -> Result<Commission, AppError> {
        self.ensure_client(&mut *conn, payload.client_id).await?;
        self.repo
            .update_commission(&mut *conn, id, payload)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Commission))
    }

    pub async fn close_commission<'e, E>(&self, executor: E, id: i32) -> Result<Commission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .set_commission_status(executor, id, CommissionStatus::Closed)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::Commission))
    }

    pub async fn delete_commission(&self, conn: &mut PgConnection, id: i32) -> Result<(), AppError> {
        if self.repo.find_commission(&mut *conn, id).await?.is_none() {
            return Err(AppError::ResourceNotFound(Entity::Commission));
        }
        if self.report_repo.count_by_work(&mut *conn, WorkRef::Commission(id)).await? > 0 {
            tracing::warn!("Exclusão da comissão {} bloqueada: há intervenções", id);
            return Err(AppError::DeletionBlocked("delete_blocked.commission_has_reports"));
        }
        self.repo.delete_commission(&mut *conn, id).await?;
        Ok(())
    }

    // =========================================================================
    //  TABELAS DE APOIO
    // =========================================================================

    pub async fn list_intervention_types<'e, E>(&self, executor: E) -> Result<Vec<LookupEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_intervention_types(executor).await
    }

    pub async fn list_locations<'e, E>(&self, executor: E) -> Result<Vec<LookupEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_locations(executor).await
    }

    // --- Verificações de existência do "pai" ---

    async fn ensure_client(&self, conn: &mut PgConnection, client_id: i32) -> Result<(), AppError> {
        match self.repo.find_client(conn, client_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::ResourceNotFound(Entity::Client)),
        }
    }

    async fn ensure_plant(&self, conn: &mut PgConnection, plant_id: i32) -> Result<(), AppError> {
        match self.repo.find_plant(conn, plant_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::ResourceNotFound(Entity::Plant)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_with_open_commission_cannot_be_deleted() {
        assert_eq!(
            client_deletion_blocker(0, 1, 0),
            Some("delete_blocked.client_has_open_commissions")
        );
        // Removida a comissão, a exclusão passa
        assert_eq!(client_deletion_blocker(0, 0, 0), None);
    }

    #[test]
    fn plants_are_checked_first() {
        assert_eq!(client_deletion_blocker(2, 1, 1), Some("delete_blocked.client_has_plants"));
    }

    #[test]
    fn closed_commission_blocks_like_an_open_one() {
        assert_eq!(client_deletion_blocker(0, 0, 1), Some("delete_blocked.client_has_closed_commissions"));
        assert_eq!(client_deletion_blocker(0, 0, 0), None);
    }
}
