// src/handlers/kermesses.rs

use axum::{
    extract::{Path, State},
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
    models::{
        auth::User,
        kermesse::{AddMemberPayload, AddStandPayload, Kermesse, KermessePayload, KermesseWithStats},
    },
};

#[utoipa::path(
    post,
    path = "/api/kermesses",
    tag = "Kermesses",
    request_body = KermessePayload,
    responses((status = 201, description = "Kermesse criada", body = Kermesse)),
    security(("api_jwt" = []))
)]
pub async fn create_kermesse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<KermessePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let kermesse = app_state
        .kermesse_service
        .create(&user.principal(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(kermesse)))
}

#[utoipa::path(
    get,
    path = "/api/kermesses",
    tag = "Kermesses",
    responses((status = 200, description = "Kermesses visíveis para o perfil", body = Vec<Kermesse>)),
    security(("api_jwt" = []))
)]
pub async fn list_kermesses(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Kermesse>>, AppError> {
    let kermesses = app_state.kermesse_service.list(&user.principal()).await?;
    Ok(Json(kermesses))
}

#[utoipa::path(
    get,
    path = "/api/kermesses/{id}",
    tag = "Kermesses",
    params(("id" = Uuid, Path, description = "ID da kermesse")),
    responses(
        (status = 200, description = "Kermesse com indicadores", body = KermesseWithStats),
        (status = 403, description = "Kermesse fora do alcance do perfil"),
        (status = 404, description = "Kermesse não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_kermesse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<KermesseWithStats>, AppError> {
    let kermesse = app_state.kermesse_service.get(&user.principal(), id).await?;
    Ok(Json(kermesse))
}

#[utoipa::path(
    put,
    path = "/api/kermesses/{id}",
    tag = "Kermesses",
    params(("id" = Uuid, Path, description = "ID da kermesse")),
    request_body = KermessePayload,
    responses(
        (status = 200, description = "Kermesse atualizada", body = Kermesse),
        (status = 400, description = "Kermesse encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_kermesse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<KermessePayload>,
) -> Result<Json<Kermesse>, AppError> {
    payload.validate()?;

    let kermesse = app_state
        .kermesse_service
        .update(&user.principal(), id, &payload)
        .await?;
    Ok(Json(kermesse))
}

#[utoipa::path(
    patch,
    path = "/api/kermesses/{id}/end",
    tag = "Kermesses",
    params(("id" = Uuid, Path, description = "ID da kermesse")),
    responses(
        (status = 200, description = "Kermesse encerrada", body = Kermesse),
        (status = 400, description = "Já encerrada ou com tombola aberta")
    ),
    security(("api_jwt" = []))
)]
pub async fn end_kermesse(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Kermesse>, AppError> {
    let kermesse = app_state.kermesse_service.end(&user.principal(), id).await?;
    Ok(Json(kermesse))
}

// ---
// Membros e stands
// ---

#[utoipa::path(
    post,
    path = "/api/kermesses/{id}/members",
    tag = "Kermesses",
    params(("id" = Uuid, Path, description = "ID da kermesse")),
    request_body = AddMemberPayload,
    responses(
        (status = 204, description = "Criança (e responsável) adicionados"),
        (status = 400, description = "Kermesse encerrada ou usuário não é criança")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<StatusCode, AppError> {
    app_state
        .kermesse_service
        .add_member(&user.principal(), id, payload.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/kermesses/{id}/stands",
    tag = "Kermesses",
    params(("id" = Uuid, Path, description = "ID da kermesse")),
    request_body = AddStandPayload,
    responses(
        (status = 204, description = "Stand associado"),
        (status = 400, description = "Stand já está em uma kermesse em andamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_stand(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddStandPayload>,
) -> Result<StatusCode, AppError> {
    app_state
        .kermesse_service
        .add_stand(&user.principal(), id, payload.stand_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/kermesses/{id}/invitable",
    tag = "Kermesses",
    params(("id" = Uuid, Path, description = "ID da kermesse")),
    responses(
        (status = 200, description = "Crianças que ainda não participam", body = Vec<User>),
        (status = 403, description = "Não é o organizador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_invitable_users(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state
        .kermesse_service
        .list_invitable(&user.principal(), id)
        .await?;
    Ok(Json(users))
}
