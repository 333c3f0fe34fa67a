// src/handlers/tombolas.rs

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
    models::tombola::{
        CreateTombolaPayload, FinishedTombola, SellTicketPayload, Ticket, Tombola, TombolaFilter,
        UpdateTombolaPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/tombolas",
    tag = "Tombolas",
    request_body = CreateTombolaPayload,
    responses(
        (status = 201, description = "Tombola criada", body = Tombola),
        (status = 400, description = "Kermesse encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tombola(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTombolaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tombola = app_state
        .tombola_service
        .create(&user.principal(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(tombola)))
}

#[utoipa::path(
    get,
    path = "/api/tombolas",
    tag = "Tombolas",
    params(TombolaFilter),
    responses((status = 200, description = "Lista de tombolas", body = Vec<Tombola>)),
    security(("api_jwt" = []))
)]
pub async fn list_tombolas(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<TombolaFilter>,
) -> Result<Json<Vec<Tombola>>, AppError> {
    let tombolas = app_state.tombola_service.list(&filter).await?;
    Ok(Json(tombolas))
}

#[utoipa::path(
    get,
    path = "/api/tombolas/{id}",
    tag = "Tombolas",
    params(("id" = Uuid, Path, description = "ID da tombola")),
    responses(
        (status = 200, description = "Tombola", body = Tombola),
        (status = 404, description = "Tombola não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_tombola(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Tombola>, AppError> {
    let tombola = app_state.tombola_service.get(id).await?;
    Ok(Json(tombola))
}

#[utoipa::path(
    put,
    path = "/api/tombolas/{id}",
    tag = "Tombolas",
    params(("id" = Uuid, Path, description = "ID da tombola")),
    request_body = UpdateTombolaPayload,
    responses(
        (status = 200, description = "Tombola atualizada", body = Tombola),
        (status = 400, description = "Kermesse ou tombola encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_tombola(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTombolaPayload>,
) -> Result<Json<Tombola>, AppError> {
    payload.validate()?;

    let tombola = app_state
        .tombola_service
        .update(&user.principal(), id, &payload)
        .await?;
    Ok(Json(tombola))
}

#[utoipa::path(
    patch,
    path = "/api/tombolas/{id}/finish",
    tag = "Tombolas",
    params(("id" = Uuid, Path, description = "ID da tombola")),
    responses(
        (status = 200, description = "Tombola encerrada e sorteada", body = FinishedTombola),
        (status = 400, description = "Tombola já encerrada ou kermesse encerrada"),
        (status = 403, description = "Não é o organizador")
    ),
    security(("api_jwt" = []))
)]
pub async fn finish_tombola(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FinishedTombola>, AppError> {
    let finished = app_state.tombola_service.finish(&user.principal(), id).await?;
    Ok(Json(finished))
}

// ---
// Bilhetes
// ---

#[utoipa::path(
    post,
    path = "/api/tickets",
    tag = "Tickets",
    request_body = SellTicketPayload,
    responses(
        (status = 201, description = "Bilhete comprado", body = Ticket),
        (status = 400, description = "Tombola fechada ou crédito insuficiente"),
        (status = 403, description = "Comprador não participa da kermesse")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ticket(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<SellTicketPayload>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = app_state
        .tombola_service
        .sell_ticket(&user.principal(), payload.tombola_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[utoipa::path(
    get,
    path = "/api/tickets",
    tag = "Tickets",
    responses((status = 200, description = "Bilhetes visíveis para o perfil", body = Vec<Ticket>)),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Ticket>>, AppError> {
    let tickets = app_state.tombola_service.list_tickets(&user.principal()).await?;
    Ok(Json(tickets))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    tag = "Tickets",
    params(("id" = Uuid, Path, description = "ID do bilhete")),
    responses(
        (status = 200, description = "Bilhete", body = Ticket),
        (status = 404, description = "Bilhete não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_ticket(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Ticket>, AppError> {
    let ticket = app_state.tombola_service.get_ticket(id).await?;
    Ok(Json(ticket))
}
