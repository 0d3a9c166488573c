// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Único papel de acesso. O admin ignora o escopo por operador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Operator];

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// O admin satisfaz qualquer exigência de papel.
    pub fn satisfies(self, required: Role) -> bool {
        self.is_admin() || self == required
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = 7)]
    pub id: i32,
    pub role: Role,
    // Preenchido só para contas de supervisor do lado do cliente
    pub client_id: Option<i32>,
    #[schema(example = "Mario")]
    pub first_name: String,
    #[schema(example = "Rossi")]
    pub last_name: String,
    #[schema(example = "mario.rossi@example.com")]
    pub email: Option<String>,
    #[schema(example = "mrossi")]
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub must_change_password: bool,
    pub phone_number: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "mrossi")]
    pub username: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl AuthResponse {
    pub fn bearer(access_token: String) -> Self {
        Self { access_token, token_type: "bearer".to_string() }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,   // ID do usuário
    pub role: Role, // Informativo: o papel é relido do banco a cada requisição
    pub exp: usize,
    pub iat: usize,
    pub jti: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Mario")]
    pub first_name: String,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Rossi")]
    pub last_name: String,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub phone_number: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "mrossi")]
    pub username: String,
    pub role: Role,
    pub client_id: Option<i32>,
}

// Edição parcial: só e-mail, telefone e cliente podem mudar
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub client_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "required"))]
    pub old_password: String,
    #[validate(length(min = 8, message = "password_length"))]
    pub new_password: String,
}

/// Devolvida uma única vez, na criação ou no reset: a senha temporária não é guardada em claro.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryCredentials {
    pub user: User,
    #[schema(example = "k3Xr9mQa2Lp7")]
    pub temp_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleEntry {
    pub id: Role,
    #[schema(example = "Operatore")]
    pub name: String,
}
