// src/services/user_service.rs

use rand::{distributions::Alphanumeric, Rng};
use sqlx::{Executor, PgConnection, Postgres};

use crate::{
    common::error::{AppError, Entity},
    db::UserRepository,
    models::auth::{CreateUserPayload, Role, RoleEntry, TemporaryCredentials, UpdateUserPayload, User},
    services::auth::hash_password,
};

const TEMP_PASSWORD_LEN: usize = 12;

// A conta criada pela primeira migração nunca pode sair
const PROTECTED_USER_ID: i32 = 1;

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    pub async fn list_users<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_all(executor).await
    }

    pub async fn list_operators<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_operators(executor).await
    }

    pub async fn list_supervisors<'e, E>(&self, executor: E, client_id: i32) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_by_client(executor, client_id).await
    }

    pub async fn get_user<'e, E>(&self, executor: E, id: i32) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id_with(executor, id)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::User))
    }

    /// Cria o usuário com uma senha temporária, devolvida uma única vez.
    pub async fn create_user(
        &self,
        conn: &mut PgConnection,
        payload: &CreateUserPayload,
    ) -> Result<TemporaryCredentials, AppError> {
        let (username_taken, email_taken) = self
            .repo
            .username_or_email_taken(&mut *conn, payload.username.trim(), payload.email.as_deref())
            .await?;
        if username_taken {
            return Err(AppError::UsernameAlreadyExists);
        }
        if email_taken {
            return Err(AppError::EmailAlreadyExists);
        }

        let temp_password = generate_temp_password();
        let hashed = hash_password(&temp_password).await?;
        let user = self.repo.create_user(&mut *conn, payload, &hashed).await?;

        tracing::info!("👤 Usuário '{}' criado (id {})", user.username, user.id);
        Ok(TemporaryCredentials { user, temp_password })
    }

    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: i32,
        payload: &UpdateUserPayload,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update_contact(executor, id, payload)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::User))
    }

    pub async fn reset_password<'e, E>(&self, executor: E, id: i32) -> Result<TemporaryCredentials, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let temp_password = generate_temp_password();
        let hashed = hash_password(&temp_password).await?;
        let user = self
            .repo
            .set_password(executor, id, &hashed, true)
            .await?
            .ok_or(AppError::ResourceNotFound(Entity::User))?;

        Ok(TemporaryCredentials { user, temp_password })
    }

    pub async fn delete_user(&self, conn: &mut PgConnection, caller_id: i32, id: i32) -> Result<(), AppError> {
        check_deletable(caller_id, id)?;

        if self.repo.find_by_id_with(&mut *conn, id).await?.is_none() {
            return Err(AppError::ResourceNotFound(Entity::User));
        }

        if self.repo.count_report_references(&mut *conn, id).await? > 0 {
            tracing::warn!("Exclusão do usuário {} bloqueada: há intervenções", id);
            return Err(AppError::DeletionBlocked("delete_blocked.user_has_reports"));
        }

        self.repo.delete(&mut *conn, id).await?;
        Ok(())
    }

    pub fn list_roles(&self) -> Vec<RoleEntry> {
        Role::ALL
            .into_iter()
            .map(|role| RoleEntry { id: role, name: role_label(role).to_string() })
            .collect()
    }

    /// Na primeira subida, sem nenhum usuário, cria o admin das variáveis de ambiente.
    pub async fn ensure_bootstrap_admin(&self, username: &str, password: &str) -> Result<(), AppError> {
        if self.repo.count().await? > 0 {
            return Ok(());
        }

        let hashed = hash_password(password).await?;
        let admin = self.repo.create_admin(username, &hashed).await?;
        tracing::info!("🔑 Admin inicial '{}' criado (id {})", admin.username, admin.id);
        Ok(())
    }
}

fn check_deletable(caller_id: i32, id: i32) -> Result<(), AppError> {
    if caller_id == id || id == PROTECTED_USER_ID {
        return Err(AppError::CannotDeleteUser);
    }
    Ok(())
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "Amministratore",
        Role::Operator => "Operatore",
    }
}

pub fn generate_temp_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_passwords_are_alphanumeric_and_distinct() {
        let first = generate_temp_password();
        let second = generate_temp_password();
        assert_eq!(first.len(), TEMP_PASSWORD_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn nobody_deletes_themselves_or_the_first_account() {
        assert!(matches!(check_deletable(5, 5), Err(AppError::CannotDeleteUser)));
        assert!(matches!(check_deletable(5, PROTECTED_USER_ID), Err(AppError::CannotDeleteUser)));
        assert!(check_deletable(5, 6).is_ok());
    }

    #[test]
    fn role_labels_are_italian() {
        assert_eq!(role_label(Role::Admin), "Amministratore");
        assert_eq!(role_label(Role::Operator), "Operatore");
    }
}
