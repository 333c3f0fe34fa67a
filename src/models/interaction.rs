// src/models/interaction.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::stand::StandKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "interaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionStatus {
    Open,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: Uuid,
    // Quem comprou / participou
    pub user_id: Uuid,
    pub stand_id: Uuid,
    pub kermesse_id: Uuid,
    // Copiado do stand no momento da compra
    pub kind: StandKind,
    // Crédito cobrado
    #[schema(example = 20)]
    pub credit: i64,
    #[schema(example = 2)]
    pub quantity: i32,
    // Apenas atividades
    pub status: Option<InteractionStatus>,
    pub point: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInteractionPayload {
    pub stand_id: Uuid,
    // Obrigatório para stands de consumo; ignorado em atividades
    #[schema(example = 2)]
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettleActivityPayload {
    #[validate(range(min = 0, message = "A pontuação não pode ser negativa."))]
    #[schema(example = 8)]
    pub point: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InteractionFilter {
    pub kermesse_id: Option<Uuid>,
}
