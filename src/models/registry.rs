// src/models/registry.rs

// Cadastros: clientes, estabelecimentos, máquinas, comissões e tabelas de apoio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "commission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i32,
    #[schema(example = "Officine Meccaniche Srl")]
    pub name: String,
    #[schema(example = "TN")]
    pub province: Option<String>,
    #[schema(example = "Rovereto")]
    pub city: Option<String>,
    #[schema(example = "38068")]
    pub cap: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub phone_number: Option<String>,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Officine Meccaniche Srl")]
    pub name: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub cap: Option<String>,
    pub address: Option<String>,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub contact: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: i32,
    pub client_id: i32,
    #[schema(example = "Stabilimento Nord")]
    pub name: String,
    pub city: Option<String>,
    pub province: Option<String>,
    pub cap: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub phone_number: Option<String>,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlantPayload {
    pub client_id: i32,
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub city: Option<String>,
    pub province: Option<String>,
    pub cap: Option<String>,
    pub address: Option<String>,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub contact: Option<String>,
    pub phone_number: Option<String>,
}

// Estabelecimento com o nome do cliente, para as listagens
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlantWithClient {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub plant: Plant,
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: i32,
    pub plant_id: i32,
    pub robotic_island: Option<String>,
    #[schema(example = "M-042")]
    pub code: Option<String>,
    #[schema(example = "Pressa idraulica")]
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub production_year: Option<String>,
    #[schema(example = "CC-100")]
    pub cost_center: Option<String>,
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachinePayload {
    pub plant_id: i32,
    pub robotic_island: Option<String>,
    pub code: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub production_year: Option<String>,
    pub cost_center: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineWithPlant {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub machine: Machine,
    pub plant_name: String,
    pub client_id: i32,
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: i32,
    pub client_id: i32,
    #[schema(example = "C-2024-017")]
    pub code: String,
    pub description: Option<String>,
    pub status: CommissionStatus,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionPayload {
    pub client_id: i32,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "C-2024-017")]
    pub code: String,
    pub description: Option<String>,
    pub status: Option<CommissionStatus>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionWithClient {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub commission: Commission,
    pub client_name: String,
}

// Tabelas de apoio (tipos de intervenção e locais)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LookupEntry {
    pub id: i32,
    #[schema(example = "Manutenzione ordinaria")]
    pub name: String,
}
