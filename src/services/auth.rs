// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{RowLock, Transactor},
        error::AppError,
    },
    db::UserRepository,
    models::auth::{Claims, LoginUserPayload, RegisterUserPayload, Role, User, UserMe},
};

// bcrypt é caro: roda fora do executor assíncrono
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

pub fn encode_token(secret: &str, user_id: Uuid, expires_in_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::hours(expires_in_hours);

    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

#[derive(Clone)]
pub struct AuthService {
    db: Transactor,
    user_repo: UserRepository,
    jwt_secret: String,
    jwt_expires_in_hours: i64,
}

impl AuthService {
    pub fn new(db: Transactor, user_repo: UserRepository, jwt_secret: String, jwt_expires_in_hours: i64) -> Self {
        Self { db, user_repo, jwt_secret, jwt_expires_in_hours }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<UserMe, AppError> {
        // Crianças só entram por convite do responsável
        if payload.role == Role::Child {
            return Err(AppError::ChildSignUpNotAllowed);
        }

        let hashed_password = hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(
                self.db.pool(),
                None,
                &payload.name,
                &payload.email,
                &hashed_password,
                payload.role,
            )
            .await?;

        tracing::info!("Usuário {} cadastrado como {:?}", user.id, user.role);
        let token = self.create_token(user.id)?;
        Ok(UserMe { user, has_stand: false, token: Some(token) })
    }

    pub async fn login_user(&self, payload: &LoginUserPayload) -> Result<UserMe, AppError> {
        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&payload.password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let has_stand = self.user_repo.has_stand(user.id).await?;
        let token = self.create_token(user.id)?;
        Ok(UserMe { user, has_stand, token: Some(token) })
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        // Usuário apagado depois da emissão do token
        self.user_repo
            .find_by_id(self.db.pool(), claims.sub, RowLock::None)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        encode_token(&self.jwt_secret, user_id, self.jwt_expires_in_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = encode_token("segredo", user_id, 1).unwrap();
        let claims = decode_token("segredo", &token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = encode_token("segredo", Uuid::new_v4(), 1).unwrap();
        assert!(matches!(decode_token("outro", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = encode_token("segredo", Uuid::new_v4(), -2).unwrap();
        assert!(matches!(decode_token("segredo", &token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify_password("segredo123", &hashed).await.unwrap());
        assert!(!verify_password("errada", &hashed).await.unwrap());
    }
}
