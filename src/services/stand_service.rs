// src/services/stand_service.rs

use uuid::Uuid;

use crate::{
    common::{
        db_utils::{RowLock, Transactor},
        error::AppError,
    },
    db::{StandRepository, UserRepository},
    models::{
        auth::{Principal, Role},
        stand::{CreateStandPayload, Stand, StandFilter, UpdateStandPayload},
    },
};

#[derive(Clone)]
pub struct StandService {
    db: Transactor,
    stand_repo: StandRepository,
    user_repo: UserRepository,
}

pub fn ensure_owner(stand: &Stand, principal: &Principal) -> Result<(), AppError> {
    if stand.user_id != principal.id {
        return Err(AppError::Forbidden("apenas o responsável pelo stand"));
    }
    Ok(())
}

/// Reposição ou baixa manual: diferença entre o estoque pedido e o atual.
pub fn stock_delta(stand: &Stand, target: i32) -> i32 {
    target - stand.stock
}

impl StandService {
    pub fn new(db: Transactor, stand_repo: StandRepository, user_repo: UserRepository) -> Self {
        Self { db, stand_repo, user_repo }
    }

    pub async fn create(&self, principal: &Principal, payload: &CreateStandPayload) -> Result<Stand, AppError> {
        principal.require_role(&[Role::StandHolder])?;
        let mut tx = self.db.begin().await?;

        // A trava no próprio usuário serializa dois cadastros simultâneos
        self.user_repo
            .find_by_id(&mut *tx, principal.id, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        if self
            .stand_repo
            .find_by_user(&mut *tx, principal.id, RowLock::None)
            .await?
            .is_some()
        {
            return Err(AppError::StandAlreadyExists);
        }

        let stand = self.stand_repo.create(&mut *tx, principal.id, payload).await?;

        tx.commit().await?;
        tracing::info!("Stand {} criado por {}", stand.id, principal.id);
        Ok(stand)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: &UpdateStandPayload,
    ) -> Result<Stand, AppError> {
        principal.require_role(&[Role::StandHolder])?;
        let mut tx = self.db.begin().await?;

        let stand = self
            .stand_repo
            .find_by_id(&mut *tx, id, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound("Stand"))?;
        ensure_owner(&stand, principal)?;

        let delta = stock_delta(&stand, payload.stock);
        if delta != 0 {
            self.stand_repo.adjust_stock(&mut *tx, id, delta).await?;
        }
        let updated = self.stand_repo.update(&mut *tx, id, payload).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn update_current(&self, principal: &Principal, payload: &UpdateStandPayload) -> Result<Stand, AppError> {
        let current = self.current(principal).await?;
        self.update(principal, current.id, payload).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Stand, AppError> {
        self.stand_repo
            .find_by_id(self.db.pool(), id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Stand"))
    }

    pub async fn current(&self, principal: &Principal) -> Result<Stand, AppError> {
        principal.require_role(&[Role::StandHolder])?;
        self.stand_repo
            .find_by_user(self.db.pool(), principal.id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Stand"))
    }

    pub async fn list(&self, filter: &StandFilter) -> Result<Vec<Stand>, AppError> {
        self.stand_repo.list(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stand::StandKind;
    use chrono::Utc;

    fn stand(user_id: Uuid, stock: i32) -> Stand {
        Stand {
            id: Uuid::new_v4(),
            user_id,
            name: "Pesca".into(),
            description: None,
            kind: StandKind::Activity,
            price: 3,
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_the_holder_edits_the_stand() {
        let holder = Principal { id: Uuid::new_v4(), role: Role::StandHolder };
        let stranger = Principal { id: Uuid::new_v4(), role: Role::StandHolder };
        let stand = stand(holder.id, 0);

        assert!(ensure_owner(&stand, &holder).is_ok());
        assert!(matches!(ensure_owner(&stand, &stranger), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn stock_edit_becomes_a_delta() {
        let current = stand(Uuid::new_v4(), 12);

        assert_eq!(stock_delta(&current, 50), 38);
        assert_eq!(stock_delta(&current, 0), -12);
        assert_eq!(stock_delta(&current, 12), 0);
        // Aplicado sobre o atual, chega exatamente ao pedido
        assert_eq!(current.stock + stock_delta(&current, 7), 7);
    }
}
