//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

#[cfg(test)]
mod store_tests;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users))
        .route("/me", get(handlers::users::get_me))
        .route(
            "/children",
            get(handlers::users::list_children).post(handlers::users::invite_child),
        )
        .route("/pay", post(handlers::users::pay_child))
        .route("/credit", post(handlers::users::top_up_credit))
        .route("/{id}", get(handlers::users::get_user))
        .route("/{id}/password", put(handlers::users::update_password));

    let stand_routes = Router::new()
        .route(
            "/",
            post(handlers::stands::create_stand).get(handlers::stands::list_stands),
        )
        .route(
            "/current",
            get(handlers::stands::get_current_stand).put(handlers::stands::update_current_stand),
        )
        .route(
            "/{id}",
            get(handlers::stands::get_stand).put(handlers::stands::update_stand),
        );

    let kermesse_routes = Router::new()
        .route(
            "/",
            post(handlers::kermesses::create_kermesse).get(handlers::kermesses::list_kermesses),
        )
        .route(
            "/{id}",
            get(handlers::kermesses::get_kermesse).put(handlers::kermesses::update_kermesse),
        )
        .route("/{id}/end", patch(handlers::kermesses::end_kermesse))
        .route("/{id}/members", post(handlers::kermesses::add_member))
        .route("/{id}/stands", post(handlers::kermesses::add_stand))
        .route("/{id}/invitable", get(handlers::kermesses::list_invitable_users));

    let interaction_routes = Router::new()
        .route(
            "/",
            post(handlers::interactions::create_interaction).get(handlers::interactions::list_interactions),
        )
        .route("/{id}", get(handlers::interactions::get_interaction))
        .route("/{id}/settle", patch(handlers::interactions::settle_activity));

    let tombola_routes = Router::new()
        .route(
            "/",
            post(handlers::tombolas::create_tombola).get(handlers::tombolas::list_tombolas),
        )
        .route(
            "/{id}",
            get(handlers::tombolas::get_tombola).put(handlers::tombolas::update_tombola),
        )
        .route("/{id}/finish", patch(handlers::tombolas::finish_tombola));

    let ticket_routes = Router::new()
        .route(
            "/",
            post(handlers::tombolas::create_ticket).get(handlers::tombolas::list_tickets),
        )
        .route("/{id}", get(handlers::tombolas::get_ticket));

    // Tudo abaixo exige token
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/stands", stand_routes)
        .nest("/api/kermesses", kermesse_routes)
        .nest("/api/interactions", interaction_routes)
        .nest("/api/tombolas", tombola_routes)
        .nest("/api/tickets", ticket_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let listener = TcpListener::bind(&app_state.settings.server_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app(app_state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification::tests::RecordingNotifier;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    // Pool preguiçoso: nenhuma conexão é aberta enquanto o banco não é usado
    fn test_app() -> Router {
        let settings = Settings::from_lookup(|key: &str| match key {
            "DATABASE_URL" => Some("postgres://localhost/kermesse_test".to_string()),
            "JWT_SECRET" => Some("segredo".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new().connect_lazy(&settings.database_url).unwrap();
        let notifier = Arc::new(RecordingNotifier::default());

        app(AppState::build(pool, settings, notifier))
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/kermesses", "/api/users/me", "/api/tickets", "/api/stands/current"] {
            let response = test_app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let forged = crate::services::auth::encode_token("outro-segredo", uuid::Uuid::new_v4(), 1).unwrap();
        let response = test_app()
            .oneshot(
                Request::post("/api/interactions")
                    .header(header::AUTHORIZATION, format!("Bearer {forged}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"standId":"00000000-0000-0000-0000-000000000000"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = test_app()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
