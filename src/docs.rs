// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_password,
        handlers::users::list_children,
        handlers::users::invite_child,
        handlers::users::pay_child,
        handlers::users::top_up_credit,

        // --- Stands ---
        handlers::stands::create_stand,
        handlers::stands::list_stands,
        handlers::stands::get_current_stand,
        handlers::stands::update_current_stand,
        handlers::stands::get_stand,
        handlers::stands::update_stand,

        // --- Kermesses ---
        handlers::kermesses::create_kermesse,
        handlers::kermesses::list_kermesses,
        handlers::kermesses::get_kermesse,
        handlers::kermesses::update_kermesse,
        handlers::kermesses::end_kermesse,
        handlers::kermesses::add_member,
        handlers::kermesses::add_stand,
        handlers::kermesses::list_invitable_users,

        // --- Interactions ---
        handlers::interactions::create_interaction,
        handlers::interactions::list_interactions,
        handlers::interactions::get_interaction,
        handlers::interactions::settle_activity,

        // --- Tombolas ---
        handlers::tombolas::create_tombola,
        handlers::tombolas::list_tombolas,
        handlers::tombolas::get_tombola,
        handlers::tombolas::update_tombola,
        handlers::tombolas::finish_tombola,

        // --- Tickets ---
        handlers::tombolas::create_ticket,
        handlers::tombolas::list_tickets,
        handlers::tombolas::get_ticket,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::UserMe,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,

            // --- Users ---
            models::user::InviteChildPayload,
            models::user::PayChildPayload,
            models::user::TopUpCreditPayload,
            models::user::UpdatePasswordPayload,

            // --- Stands ---
            models::stand::StandKind,
            models::stand::Stand,
            models::stand::CreateStandPayload,
            models::stand::UpdateStandPayload,

            // --- Kermesses ---
            models::kermesse::KermesseStatus,
            models::kermesse::Kermesse,
            models::kermesse::KermesseStats,
            models::kermesse::KermesseWithStats,
            models::kermesse::KermessePayload,
            models::kermesse::AddMemberPayload,
            models::kermesse::AddStandPayload,

            // --- Interactions ---
            models::interaction::InteractionStatus,
            models::interaction::Interaction,
            models::interaction::CreateInteractionPayload,
            models::interaction::SettleActivityPayload,

            // --- Tombolas ---
            models::tombola::TombolaStatus,
            models::tombola::Tombola,
            models::tombola::Ticket,
            models::tombola::FinishedTombola,
            models::tombola::CreateTombolaPayload,
            models::tombola::UpdateTombolaPayload,
            models::tombola::SellTicketPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Perfil, filhos e créditos"),
        (name = "Stands", description = "Stands de consumo e atividades"),
        (name = "Kermesses", description = "Ciclo de vida, membros e stands da kermesse"),
        (name = "Interactions", description = "Compras e atividades"),
        (name = "Tombolas", description = "Tombolas e sorteio"),
        (name = "Tickets", description = "Bilhetes de tombola")
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_routes_and_the_jwt_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/interactions"));
        assert!(doc.paths.paths.contains_key("/api/tombolas/{id}/finish"));
        assert!(doc.paths.paths.contains_key("/api/kermesses/{id}/end"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
