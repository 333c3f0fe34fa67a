// src/handlers/users.rs

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
    models::{
        auth::{User, UserMe},
        user::{InviteChildPayload, PayChildPayload, TopUpCreditPayload, UpdatePasswordPayload, UserFilter},
    },
};

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "Usuário autenticado", body = UserMe)),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserMe>, AppError> {
    let me = app_state.user_service.me(&user.principal()).await?;
    Ok(Json(me))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UserFilter),
    responses((status = 200, description = "Lista de usuários", body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = app_state.user_service.list(&filter).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = app_state.user_service.get(id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UpdatePasswordPayload,
    responses(
        (status = 204, description = "Senha alterada"),
        (status = 400, description = "Senha atual incorreta"),
        (status = 403, description = "Não é o próprio usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_password(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePasswordPayload>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    app_state
        .user_service
        .update_password(&user.principal(), id, &payload)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Responsável e filhos
// ---

#[utoipa::path(
    get,
    path = "/api/users/children",
    tag = "Users",
    params(UserFilter),
    responses((status = 200, description = "Filhos do responsável", body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_children(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>, AppError> {
    let children = app_state
        .user_service
        .list_children(&user.principal(), &filter)
        .await?;
    Ok(Json(children))
}

#[utoipa::path(
    post,
    path = "/api/users/children",
    tag = "Users",
    request_body = InviteChildPayload,
    responses(
        (status = 201, description = "Criança convidada", body = User),
        (status = 409, description = "E-mail já existe"),
        (status = 500, description = "Falha no envio do convite")
    ),
    security(("api_jwt" = []))
)]
pub async fn invite_child(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<InviteChildPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let child = app_state
        .user_service
        .invite_child(&user.principal(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(child)))
}

#[utoipa::path(
    post,
    path = "/api/users/pay",
    tag = "Users",
    request_body = PayChildPayload,
    responses(
        (status = 200, description = "Crédito transferido; retorna o responsável", body = User),
        (status = 400, description = "Crédito insuficiente"),
        (status = 403, description = "A criança não pertence ao responsável")
    ),
    security(("api_jwt" = []))
)]
pub async fn pay_child(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<PayChildPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let parent = app_state.user_service.pay_child(&user.principal(), &payload).await?;
    Ok(Json(parent))
}

#[utoipa::path(
    post,
    path = "/api/users/credit",
    tag = "Users",
    request_body = TopUpCreditPayload,
    responses((status = 200, description = "Crédito adicionado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn top_up_credit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<TopUpCreditPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let updated = app_state
        .user_service
        .top_up(&user.principal(), payload.amount)
        .await?;
    Ok(Json(updated))
}
