// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Me ---
        handlers::auth::get_me,
        handlers::auth::my_reports,
        handlers::auth::my_months,
        handlers::auth::change_password,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::list_operators,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::reset_password,
        handlers::users::list_supervisors,
        handlers::users::list_roles,

        // --- Registry ---
        handlers::registry::list_clients,
        handlers::registry::get_client,
        handlers::registry::create_client,
        handlers::registry::update_client,
        handlers::registry::delete_client,
        handlers::registry::list_plants,
        handlers::registry::get_plant,
        handlers::registry::create_plant,
        handlers::registry::update_plant,
        handlers::registry::delete_plant,
        handlers::registry::list_machines,
        handlers::registry::get_machine,
        handlers::registry::create_machine,
        handlers::registry::update_machine,
        handlers::registry::delete_machine,
        handlers::registry::list_commissions,
        handlers::registry::get_commission,
        handlers::registry::create_commission,
        handlers::registry::update_commission,
        handlers::registry::close_commission,
        handlers::registry::delete_commission,
        handlers::registry::list_intervention_types,
        handlers::registry::list_locations,

        // --- Reports ---
        handlers::reports::create_report,
        handlers::reports::list_all_reports,
        handlers::reports::list_table,
        handlers::reports::list_monthly,
        handlers::reports::list_months,
        handlers::reports::daily_hours,
        handlers::reports::get_report,
        handlers::reports::update_report,
        handlers::reports::delete_report,
        handlers::mail::send_report_email,

        // --- Exports ---
        handlers::exports::export_csv,
        handlers::exports::export_pdf,
        handlers::exports::merged_pdf,
        handlers::exports::report_pdf,
        handlers::invoices::invoice_csv,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::ChangePasswordPayload,
            models::auth::TemporaryCredentials,
            models::auth::RoleEntry,

            // --- Registry ---
            models::registry::CommissionStatus,
            models::registry::Client,
            models::registry::ClientPayload,
            models::registry::Plant,
            models::registry::PlantPayload,
            models::registry::PlantWithClient,
            models::registry::Machine,
            models::registry::MachinePayload,
            models::registry::MachineWithPlant,
            models::registry::Commission,
            models::registry::CommissionPayload,
            models::registry::CommissionWithClient,
            models::registry::LookupEntry,

            // --- Reports ---
            models::reports::WorkType,
            models::reports::WorkRef,
            models::reports::Report,
            models::reports::ReportRow,
            models::reports::ReportPayload,
            models::reports::DailyHours,

            // --- Payloads ---
            handlers::exports::ReportIdsPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Me", description = "Dados e intervenções do usuário logado"),
        (name = "Users", description = "Gestão de usuários (admin)"),
        (name = "Registry", description = "Clientes, estabelecimentos, máquinas e comissões"),
        (name = "Lookups", description = "Tabelas de apoio"),
        (name = "Reports", description = "Intervenções"),
        (name = "Exports", description = "CSV e PDF das intervenções"),
        (name = "Invoices", description = "Conversão da fatura eletrônica em CSV")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
