// src/services/user_service.rs

use std::sync::Arc;

use rand::{distr::Alphanumeric, Rng};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{RowLock, Transactor},
        error::AppError,
    },
    db::UserRepository,
    models::{
        auth::{Principal, Role, User, UserMe},
        user::{InviteChildPayload, PayChildPayload, UpdatePasswordPayload, UserFilter},
    },
    services::{
        auth::{hash_password, verify_password},
        ledger::Ledger,
        notification::Notifier,
    },
};

const INVITE_PASSWORD_LEN: usize = 8;

pub fn generate_password<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(INVITE_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// O responsável só movimenta crédito para os próprios filhos.
pub fn ensure_own_child(parent: &Principal, child: &User) -> Result<(), AppError> {
    if child.role != Role::Child {
        return Err(AppError::UserNotChild);
    }
    if child.parent_id != Some(parent.id) {
        return Err(AppError::Forbidden("a criança não pertence a este responsável"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct UserService {
    db: Transactor,
    ledger: Ledger,
    user_repo: UserRepository,
    notifier: Arc<dyn Notifier>,
}

impl UserService {
    pub fn new(db: Transactor, ledger: Ledger, user_repo: UserRepository, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, ledger, user_repo, notifier }
    }

    async fn find(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(self.db.pool(), id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Usuário"))
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn me(&self, principal: &Principal) -> Result<UserMe, AppError> {
        let user = self.find(principal.id).await?;
        let has_stand = self.user_repo.has_stand(user.id).await?;
        Ok(UserMe { user, has_stand, token: None })
    }

    pub async fn get(&self, id: Uuid) -> Result<User, AppError> {
        self.find(id).await
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        self.user_repo.list(filter.kermesse_id).await
    }

    pub async fn list_children(&self, principal: &Principal, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        principal.require_role(&[Role::Parent])?;
        self.user_repo.list_children(principal.id, filter.kermesse_id).await
    }

    // =========================================================================
    //  CONTA
    // =========================================================================

    pub async fn update_password(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: &UpdatePasswordPayload,
    ) -> Result<(), AppError> {
        if principal.id != id {
            return Err(AppError::Forbidden("só é possível alterar a própria senha"));
        }

        let user = self.find(id).await?;
        if !verify_password(&payload.password, &user.password_hash).await? {
            return Err(AppError::WrongPassword);
        }

        let new_hash = hash_password(&payload.new_password).await?;
        self.user_repo.update_password(self.db.pool(), id, &new_hash).await?;

        tracing::info!("Senha do usuário {} alterada", id);
        Ok(())
    }

    /// Cria a conta da criança e envia as credenciais. Se o envio falhar a
    /// conta continua criada e o erro sobe como 500.
    pub async fn invite_child(&self, principal: &Principal, payload: &InviteChildPayload) -> Result<User, AppError> {
        principal.require_role(&[Role::Parent])?;

        let password = generate_password(&mut rand::rng());
        let password_hash = hash_password(&password).await?;

        let child = self
            .user_repo
            .create_user(
                self.db.pool(),
                Some(principal.id),
                &payload.name,
                &payload.email,
                &password_hash,
                Role::Child,
            )
            .await?;
        tracing::info!("Criança {} convidada por {}", child.id, principal.id);

        if let Err(e) = self.notifier.send_invitation(&child.email, &password).await {
            tracing::error!("Falha ao enviar o convite de {}: {:?}", child.id, e);
            return Err(AppError::NotificationFailed(e.to_string()));
        }

        Ok(child)
    }

    // =========================================================================
    //  CRÉDITO
    // =========================================================================

    /// Transfere crédito do responsável para o filho. Retorna o responsável
    /// com o saldo atualizado.
    pub async fn pay_child(&self, principal: &Principal, payload: &PayChildPayload) -> Result<User, AppError> {
        principal.require_role(&[Role::Parent])?;
        if payload.amount <= 0 {
            return Err(AppError::InvalidAmount);
        }
        let mut tx = self.db.begin().await?;

        let child = self
            .user_repo
            .find_by_id(&mut *tx, payload.child_id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Criança"))?;
        ensure_own_child(principal, &child)?;

        self.ledger
            .transfer(&mut *tx, principal.id, child.id, payload.amount)
            .await?;

        let parent = self
            .user_repo
            .find_by_id(&mut *tx, principal.id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        tx.commit().await?;
        tracing::info!("{} transferiu {} para {}", principal.id, payload.amount, child.id);
        Ok(parent)
    }

    /// Crédito virtual: não há gateway de pagamento.
    pub async fn top_up(&self, principal: &Principal, amount: i64) -> Result<User, AppError> {
        principal.require_role(&[Role::Parent])?;
        let mut tx = self.db.begin().await?;

        self.ledger.issue(&mut *tx, principal.id, amount).await?;
        let user = self
            .user_repo
            .find_by_id(&mut *tx, principal.id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        tx.commit().await?;
        tracing::info!("{} recebeu {} de crédito", principal.id, amount);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::membership::tests::user;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn invite_password_is_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(1);
        let password = generate_password(&mut rng);
        assert_eq!(password.len(), INVITE_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password(&mut rng));
    }

    #[test]
    fn parent_pays_only_own_children() {
        let parent = user(Role::Parent, None, 100);
        let principal = parent.principal();

        let own = user(Role::Child, Some(parent.id), 0);
        assert!(ensure_own_child(&principal, &own).is_ok());

        let other = user(Role::Child, Some(Uuid::new_v4()), 0);
        assert!(matches!(ensure_own_child(&principal, &other), Err(AppError::Forbidden(_))));

        let orphan = user(Role::Child, None, 0);
        assert!(matches!(ensure_own_child(&principal, &orphan), Err(AppError::Forbidden(_))));

        let adult = user(Role::Parent, None, 0);
        assert!(matches!(ensure_own_child(&principal, &adult), Err(AppError::UserNotChild)));
    }
}
