// src/config.rs

use anyhow::{anyhow, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, str::FromStr, sync::Arc, time::Duration};

use crate::{
    common::db_utils::Transactor,
    db::{InteractionRepository, KermesseRepository, StandRepository, TombolaRepository, UserRepository},
    services::{
        auth::AuthService,
        interaction_service::InteractionService,
        kermesse_service::KermesseService,
        ledger::Ledger,
        notification::{LogNotifier, Notifier, ResendNotifier},
        stand_service::StandService,
        tombola_service::TombolaService,
        user_service::UserService,
    },
};

#[derive(Debug, Clone)]
pub struct ResendSettings {
    pub api_key: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: i64,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub tx_statement_timeout_ms: u64,
    // Sem chave, os convites só vão para o log
    pub resend: Option<ResendSettings>,
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key).ok_or_else(|| anyhow!("{key} deve ser definida"))
}

fn parsed_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} inválida: {raw}")),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let resend = match (lookup("RESEND_API_KEY"), lookup("RESEND_FROM_EMAIL")) {
            (Some(api_key), Some(from_email)) => Some(ResendSettings { api_key, from_email }),
            _ => None,
        };

        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            jwt_expires_in_hours: parsed_or(&lookup, "JWT_EXPIRES_IN_HOURS", 168)?,
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parsed_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout_secs: parsed_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3)?,
            tx_statement_timeout_ms: parsed_or(&lookup, "TX_STATEMENT_TIMEOUT_MS", 5000)?,
            resend,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Settings,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub stand_service: StandService,
    pub kermesse_service: KermesseService,
    pub interaction_service: InteractionService,
    pub tombola_service: TombolaService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(settings.db_acquire_timeout_secs))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let notifier: Arc<dyn Notifier> = match &settings.resend {
            Some(resend) => Arc::new(ResendNotifier::new(resend.api_key.clone(), resend.from_email.clone())?),
            None => {
                tracing::warn!("RESEND_API_KEY ausente: convites serão apenas registrados no log");
                Arc::new(LogNotifier)
            }
        };

        Ok(Self::build(db_pool, settings, notifier))
    }

    // --- Monta o gráfico de dependências ---
    pub fn build(db_pool: PgPool, settings: Settings, notifier: Arc<dyn Notifier>) -> Self {
        let db = Transactor::new(db_pool.clone(), settings.tx_statement_timeout_ms);

        let user_repo = UserRepository::new(db_pool.clone());
        let stand_repo = StandRepository::new(db_pool.clone());
        let kermesse_repo = KermesseRepository::new(db_pool.clone());
        let interaction_repo = InteractionRepository::new(db_pool.clone());
        let tombola_repo = TombolaRepository::new(db_pool.clone());
        let ledger = Ledger::new(user_repo.clone());

        let auth_service = AuthService::new(
            db.clone(),
            user_repo.clone(),
            settings.jwt_secret.clone(),
            settings.jwt_expires_in_hours,
        );
        let user_service = UserService::new(db.clone(), ledger.clone(), user_repo.clone(), notifier);
        let stand_service = StandService::new(db.clone(), stand_repo.clone(), user_repo.clone());
        let kermesse_service =
            KermesseService::new(db.clone(), kermesse_repo.clone(), stand_repo.clone(), user_repo);
        let interaction_service = InteractionService::new(
            db.clone(),
            ledger.clone(),
            interaction_repo,
            kermesse_repo.clone(),
            stand_repo,
        );
        let tombola_service = TombolaService::new(db, ledger, tombola_repo, kermesse_repo);

        Self {
            db_pool,
            settings,
            auth_service,
            user_service,
            stand_service,
            kermesse_service,
            interaction_service,
            tombola_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/kermesse"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(settings.jwt_expires_in_hours, 168);
        assert_eq!(settings.server_addr, "0.0.0.0:3000");
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.db_acquire_timeout_secs, 3);
        assert_eq!(settings.tx_statement_timeout_ms, 5000);
        assert!(settings.resend.is_none());
    }

    #[test]
    fn missing_secret_fails() {
        let err = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/kermesse")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn malformed_number_fails() {
        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/kermesse"),
            ("JWT_SECRET", "segredo"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn resend_needs_key_and_sender() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/kermesse"),
            ("JWT_SECRET", "segredo"),
            ("RESEND_API_KEY", "re_123"),
        ]))
        .unwrap();
        assert!(settings.resend.is_none());

        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/kermesse"),
            ("JWT_SECRET", "segredo"),
            ("RESEND_API_KEY", "re_123"),
            ("RESEND_FROM_EMAIL", "kermesse@example.com"),
        ]))
        .unwrap();
        assert_eq!(settings.resend.unwrap().from_email, "kermesse@example.com");
    }
}
