// src/handlers/stands.rs

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
    models::stand::{CreateStandPayload, Stand, StandFilter, UpdateStandPayload},
};

#[utoipa::path(
    post,
    path = "/api/stands",
    tag = "Stands",
    request_body = CreateStandPayload,
    responses(
        (status = 201, description = "Stand criado", body = Stand),
        (status = 400, description = "Dados inválidos ou o responsável já tem um stand")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_stand(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateStandPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let stand = app_state.stand_service.create(&user.principal(), &payload).await?;
    Ok((StatusCode::CREATED, Json(stand)))
}

#[utoipa::path(
    get,
    path = "/api/stands",
    tag = "Stands",
    params(StandFilter),
    responses((status = 200, description = "Lista de stands", body = Vec<Stand>)),
    security(("api_jwt" = []))
)]
pub async fn list_stands(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<StandFilter>,
) -> Result<Json<Vec<Stand>>, AppError> {
    let stands = app_state.stand_service.list(&filter).await?;
    Ok(Json(stands))
}

#[utoipa::path(
    get,
    path = "/api/stands/current",
    tag = "Stands",
    responses(
        (status = 200, description = "Stand do responsável autenticado", body = Stand),
        (status = 404, description = "Sem stand")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_current_stand(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Stand>, AppError> {
    let stand = app_state.stand_service.current(&user.principal()).await?;
    Ok(Json(stand))
}

#[utoipa::path(
    put,
    path = "/api/stands/current",
    tag = "Stands",
    request_body = UpdateStandPayload,
    responses((status = 200, description = "Stand atualizado", body = Stand)),
    security(("api_jwt" = []))
)]
pub async fn update_current_stand(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateStandPayload>,
) -> Result<Json<Stand>, AppError> {
    payload.validate()?;

    let stand = app_state
        .stand_service
        .update_current(&user.principal(), &payload)
        .await?;
    Ok(Json(stand))
}

#[utoipa::path(
    get,
    path = "/api/stands/{id}",
    tag = "Stands",
    params(("id" = Uuid, Path, description = "ID do stand")),
    responses(
        (status = 200, description = "Stand", body = Stand),
        (status = 404, description = "Stand não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stand(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Stand>, AppError> {
    let stand = app_state.stand_service.get(id).await?;
    Ok(Json(stand))
}

#[utoipa::path(
    put,
    path = "/api/stands/{id}",
    tag = "Stands",
    params(("id" = Uuid, Path, description = "ID do stand")),
    request_body = UpdateStandPayload,
    responses(
        (status = 200, description = "Stand atualizado", body = Stand),
        (status = 403, description = "Não é o responsável pelo stand")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_stand(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStandPayload>,
) -> Result<Json<Stand>, AppError> {
    payload.validate()?;

    let stand = app_state
        .stand_service
        .update(&user.principal(), id, &payload)
        .await?;
    Ok(Json(stand))
}
