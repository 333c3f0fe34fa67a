// src/models/kermesse.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// STARTED -> ENDED, nunca o contrário
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "kermesse_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KermesseStatus {
    Started,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Kermesse {
    pub id: Uuid,
    // O organizador
    pub user_id: Uuid,
    #[schema(example = "Kermesse de Primavera")]
    pub name: String,
    pub description: Option<String>,
    pub status: KermesseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Indicadores de uma kermesse, filtrados pelo perfil de quem consulta.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KermesseStats {
    pub stand_count: i64,
    pub tombola_count: i64,
    pub user_count: i64,
    pub interaction_count: i64,
    pub interaction_income: i64,
    pub tombola_income: i64,
    pub points: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KermesseWithStats {
    #[serde(flatten)]
    pub kermesse: Kermesse,
    #[serde(flatten)]
    pub stats: KermesseStats,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KermessePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddStandPayload {
    pub stand_id: Uuid,
}
