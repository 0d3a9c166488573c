// src/common/db_utils.rs

use sqlx::{pool::PoolConnection, Postgres};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;

// ---
// Helper de conexão por requisição
// ---
/// Adquire uma conexão da pool para toda a requisição e marca a sessão com o usuário,
/// o que aparece em `pg_stat_activity`. A conexão volta à pool no drop, com ou sem erro.
pub(crate) async fn get_scoped_connection(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<PoolConnection<Postgres>, AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut conn = app_state.db_pool.acquire().await?;

    sqlx::query("SELECT set_config('application_name', $1, false)")
        .bind(session_name(user.id()))
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}

fn session_name(user_id: i32) -> String {
    format!("interventi:user:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_name_identifies_the_caller() {
        assert_eq!(session_name(42), "interventi:user:42");
    }
}
