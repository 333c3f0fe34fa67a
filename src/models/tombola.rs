// src/models/tombola.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tombola_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TombolaStatus {
    Started,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tombola {
    pub id: Uuid,
    pub kermesse_id: Uuid,
    #[schema(example = "Grande Sorteio")]
    pub name: String,
    // Preço do bilhete
    #[schema(example = 5)]
    pub price: i64,
    #[schema(example = "Uma bicicleta")]
    pub gift: String,
    pub status: TombolaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tombola_id: Uuid,
    // Cobrado na venda
    #[schema(example = 5)]
    pub price: i64,
    pub is_winner: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTombolaPayload {
    pub kermesse_id: Uuid,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(range(min = 0, message = "O preço não pode ser negativo."))]
    pub price: i64,
    #[validate(length(min = 1, message = "O prêmio é obrigatório."))]
    pub gift: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTombolaPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(range(min = 0, message = "O preço não pode ser negativo."))]
    pub price: i64,
    #[validate(length(min = 1, message = "O prêmio é obrigatório."))]
    pub gift: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellTicketPayload {
    pub tombola_id: Uuid,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TombolaFilter {
    pub kermesse_id: Option<Uuid>,
}

/// Resultado do sorteio: a tombola encerrada e o bilhete vencedor, se houve venda.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinishedTombola {
    #[serde(flatten)]
    pub tombola: Tombola,
    pub winner: Option<Ticket>,
}
