// src/models/user.rs

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteChildPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayChildPayload {
    pub child_id: Uuid,
    #[validate(range(min = 1, message = "O valor deve ser positivo."))]
    #[schema(example = 50)]
    pub amount: i64,
}

// Crédito virtual emitido pelo servidor (não há gateway de pagamento)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopUpCreditPayload {
    #[validate(range(min = 1, message = "O valor deve ser positivo."))]
    #[schema(example = 100)]
    pub amount: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordPayload {
    #[validate(length(min = 1, message = "A senha atual é obrigatória."))]
    pub password: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    pub kermesse_id: Option<Uuid>,
}
