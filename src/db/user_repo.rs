// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::auth::{CreateUserPayload, Role, UpdateUserPayload, User},
};

const USER_COLUMNS: &str = "id, role, client_id, first_name, last_name, email, username, \
     password_hash, must_change_password, phone_number";

// O repositório de usuários, responsável por todas as interações com a tabela 'operators'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // Busca um usuário pelo username (login)
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM operators WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // Busca um usuário pelo seu ID (validação do token)
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        self.find_by_id_with(&self.pool, id).await
    }

    pub async fn find_by_id_with<'e, E>(&self, executor: E, id: i32) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM operators WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(user)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM operators ORDER BY last_name, first_name"
        ))
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    // Operadores de campo: quem não está ligado a um cliente
    pub async fn list_operators<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM operators \
             WHERE client_id IS NULL AND role IN ('admin', 'operator') \
             ORDER BY last_name, first_name"
        ))
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    // Supervisores do lado do cliente
    pub async fn list_by_client<'e, E>(&self, executor: E, client_id: i32) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM operators WHERE client_id = $1 ORDER BY last_name, first_name"
        ))
        .bind(client_id)
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM operators")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn username_or_email_taken<'e, E>(
        &self,
        executor: E,
        username: &str,
        email: Option<&str>,
    ) -> Result<(bool, bool), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM operators WHERE username = $1),
                EXISTS (SELECT 1 FROM operators WHERE $2::text IS NOT NULL AND email = $2)
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        payload: &CreateUserPayload,
        password_hash: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO operators
                (role, client_id, first_name, last_name, email, username, password_hash,
                 must_change_password, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(payload.role)
        .bind(payload.client_id)
        .bind(payload.first_name.trim())
        .bind(payload.last_name.trim())
        .bind(payload.email.as_deref())
        .bind(payload.username.trim())
        .bind(password_hash)
        .bind(payload.phone_number.as_deref())
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    /// Conta de bootstrap (primeiro admin), criada sem troca obrigatória de senha.
    pub async fn create_admin(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO operators (role, first_name, last_name, username, password_hash, must_change_password)
            VALUES ($1, 'Admin', 'Admin', $2, $3, FALSE)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Role::Admin)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_contact<'e, E>(
        &self,
        executor: E,
        id: i32,
        payload: &UpdateUserPayload,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE operators
            SET email = COALESCE($2, email),
                phone_number = COALESCE($3, phone_number),
                client_id = COALESCE($4, client_id)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.email.as_deref())
        .bind(payload.phone_number.as_deref())
        .bind(payload.client_id)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn set_password<'e, E>(
        &self,
        executor: E,
        id: i32,
        password_hash: &str,
        must_change: bool,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE operators SET password_hash = $2, must_change_password = $3 WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(password_hash)
        .bind(must_change)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    // Intervenções que citam o usuário como operador ou supervisor
    pub async fn count_report_references<'e, E>(&self, executor: E, id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE operator_id = $1 OR supervisor_id = $1",
        )
        .bind(id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM operators WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// Converte erro de violação de chave única em um erro mais amigável
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(constraint) if constraint.contains("email") => AppError::EmailAlreadyExists,
                _ => AppError::UsernameAlreadyExists,
            };
        }
    }
    AppError::DatabaseError(e)
}
