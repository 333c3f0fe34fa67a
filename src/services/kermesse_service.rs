// src/services/kermesse_service.rs

use uuid::Uuid;

use crate::{
    common::{
        db_utils::{RowLock, Transactor},
        error::AppError,
    },
    db::{KermesseRepository, StandRepository, UserRepository},
    models::{
        auth::{Principal, Role, User},
        kermesse::{Kermesse, KermessePayload, KermesseWithStats},
    },
    services::{lifecycle, membership},
};

#[derive(Clone)]
pub struct KermesseService {
    db: Transactor,
    kermesse_repo: KermesseRepository,
    stand_repo: StandRepository,
    user_repo: UserRepository,
}

impl KermesseService {
    pub fn new(
        db: Transactor,
        kermesse_repo: KermesseRepository,
        stand_repo: StandRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self { db, kermesse_repo, stand_repo, user_repo }
    }

    // =========================================================================
    //  CICLO DE VIDA
    // =========================================================================

    pub async fn create(&self, principal: &Principal, payload: &KermessePayload) -> Result<Kermesse, AppError> {
        principal.require_role(&[Role::Organizer])?;

        let kermesse = self
            .kermesse_repo
            .create(self.db.pool(), principal.id, payload)
            .await?;

        tracing::info!("Kermesse {} criada por {}", kermesse.id, principal.id);
        Ok(kermesse)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: &KermessePayload,
    ) -> Result<Kermesse, AppError> {
        principal.require_role(&[Role::Organizer])?;
        let mut tx = self.db.begin().await?;

        let kermesse = self
            .kermesse_repo
            .find_by_id(&mut *tx, id, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))?;
        lifecycle::ensure_organizer(&kermesse, principal)?;
        lifecycle::ensure_mutable(&kermesse)?;

        let updated = self.kermesse_repo.update(&mut *tx, id, payload).await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn end(&self, principal: &Principal, id: Uuid) -> Result<Kermesse, AppError> {
        principal.require_role(&[Role::Organizer])?;
        let mut tx = self.db.begin().await?;

        // 1. FOR UPDATE: bloqueia novas tombolas enquanto contamos as abertas
        let kermesse = self
            .kermesse_repo
            .find_by_id(&mut *tx, id, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))?;
        lifecycle::ensure_organizer(&kermesse, principal)?;

        // 2. Guarda da transição
        let started = self.kermesse_repo.count_started_tombolas(&mut *tx, id).await?;
        lifecycle::ensure_can_end(&kermesse, started)?;

        // 3. Transição
        let ended = self.kermesse_repo.end(&mut *tx, id).await?;

        tx.commit().await?;
        tracing::info!("Kermesse {} encerrada", id);
        Ok(ended)
    }

    // =========================================================================
    //  MEMBROS E STANDS
    // =========================================================================

    pub async fn add_member(&self, principal: &Principal, kermesse_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        principal.require_role(&[Role::Organizer])?;
        let mut tx = self.db.begin().await?;

        let kermesse = self
            .kermesse_repo
            .find_by_id(&mut *tx, kermesse_id, RowLock::Share)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))?;
        lifecycle::ensure_organizer(&kermesse, principal)?;
        lifecycle::ensure_mutable(&kermesse)?;

        let user = self
            .user_repo
            .find_by_id(&mut *tx, user_id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        let members = membership::members_to_add(&user)?;
        for member_id in &members {
            self.kermesse_repo.add_member(&mut *tx, kermesse_id, *member_id).await?;
        }

        tx.commit().await?;
        tracing::info!("{} membro(s) adicionados à kermesse {}", members.len(), kermesse_id);
        Ok(())
    }

    pub async fn add_stand(&self, principal: &Principal, kermesse_id: Uuid, stand_id: Uuid) -> Result<(), AppError> {
        principal.require_role(&[Role::Organizer])?;
        let mut tx = self.db.begin().await?;

        let kermesse = self
            .kermesse_repo
            .find_by_id(&mut *tx, kermesse_id, RowLock::Share)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))?;
        lifecycle::ensure_organizer(&kermesse, principal)?;
        lifecycle::ensure_mutable(&kermesse)?;

        // A trava no stand serializa duas associações simultâneas
        self.stand_repo
            .find_by_id(&mut *tx, stand_id, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound("Stand"))?;

        if self.stand_repo.is_in_started_kermesse(&mut *tx, stand_id).await? {
            return Err(AppError::StandAlreadyAssociated);
        }

        self.kermesse_repo.add_stand(&mut *tx, kermesse_id, stand_id).await?;

        tx.commit().await?;
        tracing::info!("Stand {} associado à kermesse {}", stand_id, kermesse_id);
        Ok(())
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list(&self, principal: &Principal) -> Result<Vec<Kermesse>, AppError> {
        self.kermesse_repo.list_for(principal).await
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<KermesseWithStats, AppError> {
        let kermesse = self
            .kermesse_repo
            .find_by_id(self.db.pool(), id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))?;
        if !self.kermesse_repo.is_visible_to(self.db.pool(), id, principal).await? {
            return Err(AppError::Forbidden("usuário não participa desta kermesse"));
        }
        let stats = self.kermesse_repo.stats(id, principal).await?;

        Ok(KermesseWithStats { kermesse, stats })
    }

    pub async fn list_invitable(&self, principal: &Principal, kermesse_id: Uuid) -> Result<Vec<User>, AppError> {
        principal.require_role(&[Role::Organizer])?;
        let kermesse = self
            .kermesse_repo
            .find_by_id(self.db.pool(), kermesse_id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))?;
        lifecycle::ensure_organizer(&kermesse, principal)?;

        self.user_repo.list_invitable(kermesse_id).await
    }
}
