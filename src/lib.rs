// src/lib.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

/// Monta o router completo: rotas públicas, rotas protegidas pelo JWT e a documentação.
pub fn create_router(app_state: AppState) -> Router {
    // Anexos e XML podem passar dos 2 MiB padrão do axum
    let upload_limit = DefaultBodyLimit::max(app_state.config.max_upload_bytes);

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/token", post(handlers::auth::login));

    let me_routes = Router::new()
        .route("/", get(handlers::auth::get_me))
        .route("/reports", get(handlers::auth::my_reports))
        .route("/months", get(handlers::auth::my_months))
        .route("/password", put(handlers::auth::change_password));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::create_user))
        .route("/operators", get(handlers::users::list_operators))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/{id}/reset-password", post(handlers::users::reset_password));

    let registry_routes = Router::new()
        .route("/clients", get(handlers::registry::list_clients).post(handlers::registry::create_client))
        .route(
            "/clients/{id}",
            get(handlers::registry::get_client)
                .put(handlers::registry::update_client)
                .delete(handlers::registry::delete_client),
        )
        .route("/plants", get(handlers::registry::list_plants).post(handlers::registry::create_plant))
        .route(
            "/plants/{id}",
            get(handlers::registry::get_plant)
                .put(handlers::registry::update_plant)
                .delete(handlers::registry::delete_plant),
        )
        .route("/machines", get(handlers::registry::list_machines).post(handlers::registry::create_machine))
        .route(
            "/machines/{id}",
            get(handlers::registry::get_machine)
                .put(handlers::registry::update_machine)
                .delete(handlers::registry::delete_machine),
        )
        .route(
            "/commissions",
            get(handlers::registry::list_commissions).post(handlers::registry::create_commission),
        )
        .route(
            "/commissions/{id}",
            get(handlers::registry::get_commission)
                .put(handlers::registry::update_commission)
                .delete(handlers::registry::delete_commission),
        )
        .route("/commissions/{id}/close", post(handlers::registry::close_commission))
        // Tabelas de apoio
        .route("/roles", get(handlers::users::list_roles))
        .route("/intervention-types", get(handlers::registry::list_intervention_types))
        .route("/locations", get(handlers::registry::list_locations))
        .route("/supervisors", get(handlers::users::list_supervisors));

    let report_routes = Router::new()
        .route("/", get(handlers::reports::list_all_reports).post(handlers::reports::create_report))
        .route("/table", get(handlers::reports::list_table))
        .route("/monthly", get(handlers::reports::list_monthly))
        .route("/months", get(handlers::reports::list_months))
        .route("/daily-hours", get(handlers::reports::daily_hours))
        .route("/export/csv", get(handlers::exports::export_csv))
        .route("/export/pdf", get(handlers::exports::export_pdf))
        .route("/pdf", post(handlers::exports::merged_pdf))
        .route(
            "/{id}",
            get(handlers::reports::get_report)
                .put(handlers::reports::update_report)
                .delete(handlers::reports::delete_report),
        )
        .route("/{id}/pdf", get(handlers::exports::report_pdf))
        .route(
            "/{id}/email",
            post(handlers::mail::send_report_email).layer(upload_limit),
        );

    let invoice_routes =
        Router::new().route("/csv", post(handlers::invoices::invoice_csv).layer(upload_limit));

    // Tudo aqui exige o Bearer token
    let protected_routes = Router::new()
        .nest("/me", me_routes)
        .nest("/users", user_routes)
        .nest("/reports", report_routes)
        .nest("/invoices", invoice_routes)
        .merge(registry_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
