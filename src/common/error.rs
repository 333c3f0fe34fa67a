use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Autenticação ---
    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Senha atual incorreta")]
    WrongPassword,

    // --- Autorização ---
    #[error("Acesso negado: {0}")]
    Forbidden(&'static str),

    // --- Recursos ---
    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    // --- Regras de negócio (400) ---
    #[error("A kermesse já foi encerrada")]
    KermesseEnded,

    #[error("A kermesse ainda tem tombolas abertas")]
    KermesseHasOpenTombola,

    #[error("O stand já está associado a uma kermesse em andamento")]
    StandAlreadyAssociated,

    #[error("O usuário já possui um stand")]
    StandAlreadyExists,

    #[error("Estoque insuficiente")]
    NotEnoughStock,

    #[error("Crédito insuficiente")]
    NotEnoughCredit,

    #[error("Quantidade obrigatória e positiva para stands de consumo")]
    InvalidQuantity,

    #[error("Valor inválido")]
    InvalidAmount,

    #[error("A interação não é uma atividade")]
    InteractionNotActivity,

    #[error("A atividade já foi encerrada")]
    InteractionAlreadyEnded,

    #[error("A tombola não está aberta")]
    TombolaNotStarted,

    #[error("O usuário não é uma criança")]
    UserNotChild,

    #[error("Não é possível se cadastrar como criança")]
    ChildSignUpNotAllowed,

    // --- Infraestrutura (500) ---
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Falha ao enviar notificação: {0}")]
    NotificationFailed(String),
}

impl AppError {
    /// Classificação estável exposta na fronteira HTTP.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::WrongPassword
            | AppError::KermesseEnded
            | AppError::KermesseHasOpenTombola
            | AppError::StandAlreadyAssociated
            | AppError::StandAlreadyExists
            | AppError::NotEnoughStock
            | AppError::NotEnoughCredit
            | AppError::InvalidQuantity
            | AppError::InvalidAmount
            | AppError::InteractionNotActivity
            | AppError::InteractionAlreadyEnded
            | AppError::TombolaNotStarted
            | AppError::UserNotChild
            | AppError::ChildSignUpNotAllowed => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::NotificationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (status, body).into_response();
        }

        // Detalhes internos ficam só no log.
        let message = if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
