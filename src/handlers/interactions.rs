// src/handlers/interactions.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::interaction::{CreateInteractionPayload, Interaction, InteractionFilter, SettleActivityPayload},
};

#[utoipa::path(
    post,
    path = "/api/interactions",
    tag = "Interactions",
    request_body = CreateInteractionPayload,
    responses(
        (status = 201, description = "Compra registrada", body = Interaction),
        (status = 400, description = "Quantidade inválida, estoque ou crédito insuficiente"),
        (status = 403, description = "Comprador não participa da kermesse do stand"),
        (status = 404, description = "Stand não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_interaction(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateInteractionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let interaction = app_state
        .interaction_service
        .create(&user.principal(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(interaction)))
}

#[utoipa::path(
    get,
    path = "/api/interactions",
    tag = "Interactions",
    params(InteractionFilter),
    responses((status = 200, description = "Interações visíveis para o perfil", body = Vec<Interaction>)),
    security(("api_jwt" = []))
)]
pub async fn list_interactions(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<InteractionFilter>,
) -> Result<Json<Vec<Interaction>>, AppError> {
    let interactions = app_state
        .interaction_service
        .list(&user.principal(), &filter)
        .await?;
    Ok(Json(interactions))
}

#[utoipa::path(
    get,
    path = "/api/interactions/{id}",
    tag = "Interactions",
    params(("id" = Uuid, Path, description = "ID da interação")),
    responses(
        (status = 200, description = "Interação", body = Interaction),
        (status = 404, description = "Interação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_interaction(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Interaction>, AppError> {
    let interaction = app_state.interaction_service.get(id).await?;
    Ok(Json(interaction))
}

#[utoipa::path(
    patch,
    path = "/api/interactions/{id}/settle",
    tag = "Interactions",
    params(("id" = Uuid, Path, description = "ID da interação")),
    request_body = SettleActivityPayload,
    responses(
        (status = 200, description = "Atividade finalizada", body = Interaction),
        (status = 400, description = "Não é atividade aberta ou kermesse encerrada"),
        (status = 403, description = "Não é o responsável pelo stand")
    ),
    security(("api_jwt" = []))
)]
pub async fn settle_activity(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettleActivityPayload>,
) -> Result<Json<Interaction>, AppError> {
    payload.validate()?;

    let interaction = app_state
        .interaction_service
        .settle(&user.principal(), id, payload.point)
        .await?;
    Ok(Json(interaction))
}
