// src/models/stand.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stand_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StandKind {
    Consumption, // Vende itens com estoque
    Activity,    // Atividade que rende pontos
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stand {
    pub id: Uuid,
    // O responsável (STAND_HOLDER)
    pub user_id: Uuid,
    #[schema(example = "Barraca de Crepes")]
    pub name: String,
    pub description: Option<String>,
    pub kind: StandKind,
    #[schema(example = 10)]
    pub price: i64,
    // Só tem significado para stands de consumo
    #[schema(example = 30)]
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStandPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    pub kind: StandKind,
    #[validate(range(min = 0, message = "O preço não pode ser negativo."))]
    pub price: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStandPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "O preço não pode ser negativo."))]
    pub price: i64,
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StandFilter {
    pub kermesse_id: Option<Uuid>,
    // Apenas stands sem kermesse em andamento
    pub is_free: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_price_or_stock_is_rejected() {
        let payload = CreateStandPayload {
            name: "Pesca".into(),
            description: None,
            kind: StandKind::Activity,
            price: -1,
            stock: -5,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
        assert!(errors.field_errors().contains_key("stock"));
    }

    #[test]
    fn stock_defaults_to_zero() {
        let payload: CreateStandPayload = serde_json::from_str(
            r#"{"name":"Pesca","kind":"ACTIVITY","price":5}"#,
        )
        .unwrap();
        assert_eq!(payload.stock, 0);
        assert_eq!(payload.kind, StandKind::Activity);
        assert!(payload.validate().is_ok());
    }
}
