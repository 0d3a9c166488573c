// src/handlers/registry.rs

// Cadastros. Leitura para qualquer usuário autenticado, escrita só para o admin.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_scoped_connection,
        error::{ApiError, AppError},
        query::{optional_id, optional_limit},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireAdmin},
    models::registry::{
        Client, ClientPayload, Commission, CommissionPayload, CommissionWithClient, LookupEntry, Machine,
        MachinePayload, MachineWithPlant, Plant, PlantPayload, PlantWithClient,
    },
};

// ---
// Parâmetros de filtro
// ---

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlantParams {
    #[serde(default, rename = "clientId", alias = "client_id", deserialize_with = "optional_id")]
    pub client_id: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MachineParams {
    #[serde(default, rename = "plantId", alias = "plant_id", deserialize_with = "optional_id")]
    pub plant_id: Option<i32>,
    /// Máximo de linhas; 0 ou ausente = todas
    #[serde(default, deserialize_with = "optional_limit")]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommissionParams {
    #[serde(default, rename = "clientId", alias = "client_id", deserialize_with = "optional_id")]
    pub client_id: Option<i32>,
    /// Só as comissões abertas
    #[serde(default)]
    pub open: bool,
}

// =============================================================================
//  CLIENTES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Registry",
    responses((status = 200, description = "Clientes", body = [Client])),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Client>>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let clients = app_state
        .registry_service
        .list_clients(&mut *conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(clients))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<Client>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .registry_service
        .get_client(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(client))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Registry",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 400, description = "Nome já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .registry_service
        .create_client(&mut *conn, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(client)))
}

#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Registry",
    request_body = ClientPayload,
    params(("id" = i32, Path, description = "ID do cliente")),
    responses((status = 200, description = "Cliente atualizado", body = Client)),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<Client>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .registry_service
        .update_client(&mut *conn, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(client))
}

#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente excluído"),
        (status = 400, description = "Cliente com estabelecimentos ou comissões")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .registry_service
        .delete_client(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ESTABELECIMENTOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/plants",
    tag = "Registry",
    params(PlantParams),
    responses((status = 200, description = "Estabelecimentos", body = [PlantWithClient])),
    security(("api_jwt" = []))
)]
pub async fn list_plants(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<PlantParams>,
) -> Result<Json<Vec<PlantWithClient>>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let plants = app_state
        .registry_service
        .list_plants(&mut *conn, params.client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plants))
}

#[utoipa::path(
    get,
    path = "/api/plants/{id}",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID do estabelecimento")),
    responses(
        (status = 200, description = "Estabelecimento", body = PlantWithClient),
        (status = 404, description = "Estabelecimento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_plant(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<PlantWithClient>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let plant = app_state
        .registry_service
        .get_plant(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plant))
}

#[utoipa::path(
    post,
    path = "/api/plants",
    tag = "Registry",
    request_body = PlantPayload,
    responses(
        (status = 201, description = "Estabelecimento criado", body = Plant),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_plant(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Json(payload): Json<PlantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let plant = app_state
        .registry_service
        .create_plant(&mut *conn, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(plant)))
}

#[utoipa::path(
    put,
    path = "/api/plants/{id}",
    tag = "Registry",
    request_body = PlantPayload,
    params(("id" = i32, Path, description = "ID do estabelecimento")),
    responses((status = 200, description = "Estabelecimento atualizado", body = Plant)),
    security(("api_jwt" = []))
)]
pub async fn update_plant(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
    Json(payload): Json<PlantPayload>,
) -> Result<Json<Plant>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let plant = app_state
        .registry_service
        .update_plant(&mut *conn, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plant))
}

#[utoipa::path(
    delete,
    path = "/api/plants/{id}",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID do estabelecimento")),
    responses(
        (status = 204, description = "Estabelecimento excluído"),
        (status = 400, description = "Estabelecimento com máquinas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_plant(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .registry_service
        .delete_plant(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  MÁQUINAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/machines",
    tag = "Registry",
    params(MachineParams),
    responses((status = 200, description = "Máquinas", body = [MachineWithPlant])),
    security(("api_jwt" = []))
)]
pub async fn list_machines(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<MachineParams>,
) -> Result<Json<Vec<MachineWithPlant>>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let machines = app_state
        .registry_service
        .list_machines(&mut *conn, params.plant_id, params.limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(machines))
}

#[utoipa::path(
    get,
    path = "/api/machines/{id}",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID da máquina")),
    responses(
        (status = 200, description = "Máquina", body = MachineWithPlant),
        (status = 404, description = "Máquina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<MachineWithPlant>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let machine = app_state
        .registry_service
        .get_machine(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(machine))
}

#[utoipa::path(
    post,
    path = "/api/machines",
    tag = "Registry",
    request_body = MachinePayload,
    responses(
        (status = 201, description = "Máquina criada", body = Machine),
        (status = 404, description = "Estabelecimento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Json(payload): Json<MachinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let machine = app_state
        .registry_service
        .create_machine(&mut *conn, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(machine)))
}

#[utoipa::path(
    put,
    path = "/api/machines/{id}",
    tag = "Registry",
    request_body = MachinePayload,
    params(("id" = i32, Path, description = "ID da máquina")),
    responses((status = 200, description = "Máquina atualizada", body = Machine)),
    security(("api_jwt" = []))
)]
pub async fn update_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
    Json(payload): Json<MachinePayload>,
) -> Result<Json<Machine>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let machine = app_state
        .registry_service
        .update_machine(&mut *conn, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(machine))
}

#[utoipa::path(
    delete,
    path = "/api/machines/{id}",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID da máquina")),
    responses(
        (status = 204, description = "Máquina excluída"),
        (status = 400, description = "Máquina com intervenções")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_machine(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .registry_service
        .delete_machine(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  COMISSÕES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/commissions",
    tag = "Registry",
    params(CommissionParams),
    responses((status = 200, description = "Comissões", body = [CommissionWithClient])),
    security(("api_jwt" = []))
)]
pub async fn list_commissions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(params): Query<CommissionParams>,
) -> Result<Json<Vec<CommissionWithClient>>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let commissions = app_state
        .registry_service
        .list_commissions(&mut *conn, params.client_id, params.open)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(commissions))
}

#[utoipa::path(
    get,
    path = "/api/commissions/{id}",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID da comissão")),
    responses(
        (status = 200, description = "Comissão", body = CommissionWithClient),
        (status = 404, description = "Comissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<CommissionWithClient>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let commission = app_state
        .registry_service
        .get_commission(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(commission))
}

#[utoipa::path(
    post,
    path = "/api/commissions",
    tag = "Registry",
    request_body = CommissionPayload,
    responses(
        (status = 201, description = "Comissão criada", body = Commission),
        (status = 400, description = "Código já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Json(payload): Json<CommissionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let commission = app_state
        .registry_service
        .create_commission(&mut *conn, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(commission)))
}

#[utoipa::path(
    put,
    path = "/api/commissions/{id}",
    tag = "Registry",
    request_body = CommissionPayload,
    params(("id" = i32, Path, description = "ID da comissão")),
    responses((status = 200, description = "Comissão atualizada", body = Commission)),
    security(("api_jwt" = []))
)]
pub async fn update_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
    Json(payload): Json<CommissionPayload>,
) -> Result<Json<Commission>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let commission = app_state
        .registry_service
        .update_commission(&mut *conn, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(commission))
}

#[utoipa::path(
    post,
    path = "/api/commissions/{id}/close",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID da comissão")),
    responses((status = 200, description = "Comissão fechada", body = Commission)),
    security(("api_jwt" = []))
)]
pub async fn close_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<Commission>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let commission = app_state
        .registry_service
        .close_commission(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("📁 Comissão {} fechada por {}", commission.code, user.id());
    Ok(Json(commission))
}

#[utoipa::path(
    delete,
    path = "/api/commissions/{id}",
    tag = "Registry",
    params(("id" = i32, Path, description = "ID da comissão")),
    responses(
        (status = 204, description = "Comissão excluída"),
        (status = 400, description = "Comissão com intervenções")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_commission(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .registry_service
        .delete_commission(&mut *conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  TABELAS DE APOIO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/intervention-types",
    tag = "Lookups",
    responses((status = 200, description = "Tipos de intervenção", body = [LookupEntry])),
    security(("api_jwt" = []))
)]
pub async fn list_intervention_types(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<Vec<LookupEntry>>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let types = app_state
        .registry_service
        .list_intervention_types(&mut *conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(types))
}

#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Lookups",
    responses((status = 200, description = "Locais de intervenção", body = [LookupEntry])),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<Vec<LookupEntry>>, ApiError> {
    let mut conn = get_scoped_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let locations = app_state
        .registry_service
        .list_locations(&mut *conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(locations))
}
