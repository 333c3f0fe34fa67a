// src/services/interaction_service.rs

use uuid::Uuid;

use crate::{
    common::{
        db_utils::{RowLock, Transactor},
        error::AppError,
    },
    db::{InteractionRepository, KermesseRepository, NewInteraction, StandRepository},
    models::{
        auth::{Principal, Role},
        interaction::{CreateInteractionPayload, Interaction, InteractionFilter, InteractionStatus},
        stand::{Stand, StandKind},
    },
    services::{
        ledger::Ledger,
        lifecycle,
        stand_service::ensure_owner,
    },
};

/// O que uma compra vai movimentar, calculado a partir do stand travado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasePlan {
    pub kind: StandKind,
    pub quantity: i32,
    pub total: i64,
    // Só consumo mexe no estoque
    pub stock_delta: Option<i32>,
    pub status: Option<InteractionStatus>,
}

impl PurchasePlan {
    pub fn for_stand(stand: &Stand, quantity: Option<i32>) -> Result<Self, AppError> {
        match stand.kind {
            StandKind::Consumption => {
                let quantity = quantity.filter(|q| *q > 0).ok_or(AppError::InvalidQuantity)?;
                if stand.stock < quantity {
                    return Err(AppError::NotEnoughStock);
                }
                let total = stand
                    .price
                    .checked_mul(i64::from(quantity))
                    .ok_or(AppError::InvalidQuantity)?;

                Ok(Self {
                    kind: StandKind::Consumption,
                    quantity,
                    total,
                    stock_delta: Some(-quantity),
                    status: None,
                })
            }
            StandKind::Activity => Ok(Self {
                kind: StandKind::Activity,
                quantity: 1,
                total: stand.price,
                stock_delta: None,
                status: Some(InteractionStatus::Open),
            }),
        }
    }
}

pub fn ensure_settleable(interaction: &Interaction) -> Result<(), AppError> {
    if interaction.kind != StandKind::Activity {
        return Err(AppError::InteractionNotActivity);
    }
    if interaction.status != Some(InteractionStatus::Open) {
        return Err(AppError::InteractionAlreadyEnded);
    }
    Ok(())
}

#[derive(Clone)]
pub struct InteractionService {
    db: Transactor,
    ledger: Ledger,
    interaction_repo: InteractionRepository,
    kermesse_repo: KermesseRepository,
    stand_repo: StandRepository,
}

impl InteractionService {
    pub fn new(
        db: Transactor,
        ledger: Ledger,
        interaction_repo: InteractionRepository,
        kermesse_repo: KermesseRepository,
        stand_repo: StandRepository,
    ) -> Self {
        Self { db, ledger, interaction_repo, kermesse_repo, stand_repo }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        payload: &CreateInteractionPayload,
    ) -> Result<Interaction, AppError> {
        principal.require_role(&[Role::Parent, Role::Child])?;
        let mut tx = self.db.begin().await?;

        // 1. Stand existe?
        self.stand_repo
            .find_by_id(&mut *tx, payload.stand_id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Stand"))?;

        // 2. Caminho membro -> kermesse em andamento <- stand
        let kermesse_id = self
            .kermesse_repo
            .find_purchase_kermesse(&mut *tx, principal.id, payload.stand_id)
            .await?
            .ok_or(AppError::Forbidden("usuário não participa da kermesse deste stand"))?;

        let kermesse = self
            .kermesse_repo
            .find_by_id(&mut *tx, kermesse_id, RowLock::Share)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))?;
        lifecycle::ensure_mutable(&kermesse)?;

        // 3. Preço e estoque, lidos do stand travado
        let stand = self
            .stand_repo
            .find_by_id(&mut *tx, payload.stand_id, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound("Stand"))?;
        let plan = PurchasePlan::for_stand(&stand, payload.quantity)?;

        // 4. Comprador paga o responsável (confere o saldo com as contas travadas)
        self.ledger
            .transfer(&mut *tx, principal.id, stand.user_id, plan.total)
            .await?;

        // 5. Baixa no estoque
        if let Some(delta) = plan.stock_delta {
            self.stand_repo.adjust_stock(&mut *tx, stand.id, delta).await?;
        }

        // 6. Registro
        let interaction = self
            .interaction_repo
            .create(
                &mut *tx,
                &NewInteraction {
                    user_id: principal.id,
                    stand_id: stand.id,
                    kermesse_id,
                    kind: plan.kind,
                    credit: plan.total,
                    quantity: plan.quantity,
                    status: plan.status,
                },
            )
            .await?;

        tx.commit().await?;
        tracing::info!(
            "Interação {} criada: {} pagou {} ao stand {}",
            interaction.id,
            principal.id,
            plan.total,
            stand.id
        );
        Ok(interaction)
    }

    pub async fn settle(&self, principal: &Principal, id: Uuid, point: i32) -> Result<Interaction, AppError> {
        principal.require_role(&[Role::StandHolder])?;
        let mut tx = self.db.begin().await?;

        let interaction = self
            .interaction_repo
            .find_by_id(&mut *tx, id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Interação"))?;

        let kermesse = self
            .kermesse_repo
            .find_by_id(&mut *tx, interaction.kermesse_id, RowLock::Share)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))?;
        lifecycle::ensure_mutable(&kermesse)?;

        let stand = self
            .stand_repo
            .find_by_id(&mut *tx, interaction.stand_id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Stand"))?;
        ensure_owner(&stand, principal)?;

        // Relê com trava: duas finalizações simultâneas, só uma passa
        let interaction = self
            .interaction_repo
            .find_by_id(&mut *tx, id, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound("Interação"))?;
        ensure_settleable(&interaction)?;

        let settled = self.interaction_repo.settle(&mut *tx, id, point).await?;

        tx.commit().await?;
        tracing::info!("Atividade {} finalizada com {} ponto(s)", id, point);
        Ok(settled)
    }

    pub async fn list(&self, principal: &Principal, filter: &InteractionFilter) -> Result<Vec<Interaction>, AppError> {
        self.interaction_repo.list_for(principal, filter.kermesse_id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Interaction, AppError> {
        self.interaction_repo
            .find_by_id(self.db.pool(), id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Interação"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::{ensure_sufficient, transfer_postings};
    use chrono::Utc;

    fn stand(kind: StandKind, price: i64, stock: i32) -> Stand {
        Stand {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Crepes".into(),
            description: None,
            kind,
            price,
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn interaction(kind: StandKind, status: Option<InteractionStatus>) -> Interaction {
        Interaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            stand_id: Uuid::new_v4(),
            kermesse_id: Uuid::new_v4(),
            kind,
            credit: 3,
            quantity: 1,
            status,
            point: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn consumption_purchase_moves_stock_and_credit() {
        // estoque 3, preço 10, comprador com 25
        let s = stand(StandKind::Consumption, 10, 3);
        let plan = PurchasePlan::for_stand(&s, Some(2)).unwrap();
        assert_eq!(plan.total, 20);
        assert_eq!(plan.stock_delta, Some(-2));
        assert!(ensure_sufficient(25, plan.total).is_ok());

        let buyer = Uuid::new_v4();
        let (mut buyer_credit, mut holder_credit) = (25_i64, 0_i64);
        for p in transfer_postings(buyer, s.user_id, plan.total) {
            if p.user_id == buyer {
                buyer_credit += p.delta;
            } else {
                holder_credit += p.delta;
            }
        }
        assert_eq!(buyer_credit, 5);
        assert_eq!(holder_credit, 20);
        assert_eq!(s.stock + plan.stock_delta.unwrap(), 1);
    }

    #[test]
    fn poor_buyer_is_rejected() {
        let s = stand(StandKind::Consumption, 10, 3);
        let plan = PurchasePlan::for_stand(&s, Some(2)).unwrap();
        assert!(matches!(ensure_sufficient(5, plan.total), Err(AppError::NotEnoughCredit)));
    }

    #[test]
    fn consumption_requires_a_positive_quantity() {
        let s = stand(StandKind::Consumption, 10, 3);
        for q in [None, Some(0), Some(-1)] {
            assert!(matches!(PurchasePlan::for_stand(&s, q), Err(AppError::InvalidQuantity)));
        }
    }

    #[test]
    fn last_unit_cannot_be_sold_twice() {
        let s = stand(StandKind::Consumption, 10, 1);
        assert!(PurchasePlan::for_stand(&s, Some(1)).is_ok());
        assert!(matches!(PurchasePlan::for_stand(&s, Some(2)), Err(AppError::NotEnoughStock)));

        let empty = stand(StandKind::Consumption, 10, 0);
        assert!(matches!(PurchasePlan::for_stand(&empty, Some(1)), Err(AppError::NotEnoughStock)));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let s = stand(StandKind::Consumption, i64::MAX, i32::MAX);
        assert!(matches!(PurchasePlan::for_stand(&s, Some(2)), Err(AppError::InvalidQuantity)));
    }

    #[test]
    fn activity_costs_one_unit_and_opens() {
        let s = stand(StandKind::Activity, 4, 0);
        let plan = PurchasePlan::for_stand(&s, Some(7)).unwrap();
        assert_eq!(plan.quantity, 1);
        assert_eq!(plan.total, 4);
        assert_eq!(plan.stock_delta, None);
        assert_eq!(plan.status, Some(InteractionStatus::Open));
    }

    #[test]
    fn only_open_activities_can_be_settled() {
        assert!(ensure_settleable(&interaction(StandKind::Activity, Some(InteractionStatus::Open))).is_ok());
        assert!(matches!(
            ensure_settleable(&interaction(StandKind::Activity, Some(InteractionStatus::Ended))),
            Err(AppError::InteractionAlreadyEnded)
        ));
        assert!(matches!(
            ensure_settleable(&interaction(StandKind::Consumption, None)),
            Err(AppError::InteractionNotActivity)
        ));
    }
}
