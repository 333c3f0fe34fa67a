// src/services/tombola_service.rs

use rand::{seq::IndexedRandom, Rng};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{RowLock, Transactor},
        error::AppError,
    },
    db::{KermesseRepository, TombolaRepository},
    models::{
        auth::{Principal, Role},
        kermesse::Kermesse,
        tombola::{
            CreateTombolaPayload, FinishedTombola, Ticket, Tombola, TombolaFilter, TombolaStatus,
            UpdateTombolaPayload,
        },
    },
    services::{ledger::Ledger, lifecycle},
};

/// Sorteio uniforme entre os bilhetes vendidos. Sem bilhetes, sem ganhador.
pub fn draw_winner<R: Rng + ?Sized>(ticket_ids: &[Uuid], rng: &mut R) -> Option<Uuid> {
    ticket_ids.choose(rng).copied()
}

pub fn ensure_started(tombola: &Tombola) -> Result<(), AppError> {
    if tombola.status != TombolaStatus::Started {
        return Err(AppError::TombolaNotStarted);
    }
    Ok(())
}

#[derive(Clone)]
pub struct TombolaService {
    db: Transactor,
    ledger: Ledger,
    tombola_repo: TombolaRepository,
    kermesse_repo: KermesseRepository,
}

impl TombolaService {
    pub fn new(
        db: Transactor,
        ledger: Ledger,
        tombola_repo: TombolaRepository,
        kermesse_repo: KermesseRepository,
    ) -> Self {
        Self { db, ledger, tombola_repo, kermesse_repo }
    }

    // Kermesse da tombola, travada em modo compartilhado: impede o
    // encerramento da kermesse até o fim da transação.
    async fn share_kermesse(&self, conn: &mut sqlx::PgConnection, kermesse_id: Uuid) -> Result<Kermesse, AppError> {
        self.kermesse_repo
            .find_by_id(conn, kermesse_id, RowLock::Share)
            .await?
            .ok_or(AppError::NotFound("Kermesse"))
    }

    async fn find_tombola(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        lock: RowLock,
    ) -> Result<Tombola, AppError> {
        self.tombola_repo
            .find_by_id(conn, id, lock)
            .await?
            .ok_or(AppError::NotFound("Tombola"))
    }

    // =========================================================================
    //  TOMBOLAS
    // =========================================================================

    pub async fn create(&self, principal: &Principal, payload: &CreateTombolaPayload) -> Result<Tombola, AppError> {
        principal.require_role(&[Role::Organizer])?;
        let mut tx = self.db.begin().await?;

        let kermesse = self.share_kermesse(&mut *tx, payload.kermesse_id).await?;
        lifecycle::ensure_organizer(&kermesse, principal)?;
        lifecycle::ensure_mutable(&kermesse)?;

        let tombola = self.tombola_repo.create(&mut *tx, payload).await?;

        tx.commit().await?;
        tracing::info!("Tombola {} criada na kermesse {}", tombola.id, kermesse.id);
        Ok(tombola)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: &UpdateTombolaPayload,
    ) -> Result<Tombola, AppError> {
        principal.require_role(&[Role::Organizer])?;
        let mut tx = self.db.begin().await?;

        let current = self.find_tombola(&mut *tx, id, RowLock::None).await?;
        let kermesse = self.share_kermesse(&mut *tx, current.kermesse_id).await?;
        lifecycle::ensure_organizer(&kermesse, principal)?;
        lifecycle::ensure_mutable(&kermesse)?;

        let tombola = self.find_tombola(&mut *tx, id, RowLock::Update).await?;
        ensure_started(&tombola)?;

        let updated = self.tombola_repo.update(&mut *tx, id, payload).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Encerra a tombola e sorteia o ganhador na mesma transação.
    /// A trava exclusiva na tombola espera as vendas em curso e barra as
    /// novas, então o conjunto de bilhetes lido aqui é o definitivo.
    pub async fn finish(&self, principal: &Principal, id: Uuid) -> Result<FinishedTombola, AppError> {
        principal.require_role(&[Role::Organizer])?;
        let mut tx = self.db.begin().await?;

        // 1. Kermesse: organizador e em andamento
        let current = self.find_tombola(&mut *tx, id, RowLock::None).await?;
        let kermesse = self.share_kermesse(&mut *tx, current.kermesse_id).await?;
        lifecycle::ensure_organizer(&kermesse, principal)?;
        lifecycle::ensure_mutable(&kermesse)?;

        // 2. Tombola travada; um segundo encerramento vê ENDED e falha aqui
        let tombola = self.find_tombola(&mut *tx, id, RowLock::Update).await?;
        ensure_started(&tombola)?;

        // 3. Sorteio sobre os bilhetes vistos por esta transação
        let ticket_ids = self.tombola_repo.ticket_ids(&mut *tx, id).await?;
        let winner_id = draw_winner(&ticket_ids, &mut rand::rng());

        // 4. Transição + ganhador
        let tombola = self.tombola_repo.end(&mut *tx, id).await?;
        let winner = match winner_id {
            Some(ticket_id) => Some(self.tombola_repo.mark_winner(&mut *tx, ticket_id).await?),
            None => None,
        };

        tx.commit().await?;
        match &winner {
            Some(ticket) => tracing::info!(
                "Tombola {} sorteada entre {} bilhete(s): vencedor {}",
                id,
                ticket_ids.len(),
                ticket.user_id
            ),
            None => tracing::info!("Tombola {} encerrada sem bilhetes vendidos", id),
        }

        Ok(FinishedTombola { tombola, winner })
    }

    pub async fn list(&self, filter: &TombolaFilter) -> Result<Vec<Tombola>, AppError> {
        self.tombola_repo.list(filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Tombola, AppError> {
        self.tombola_repo
            .find_by_id(self.db.pool(), id, RowLock::None)
            .await?
            .ok_or(AppError::NotFound("Tombola"))
    }

    // =========================================================================
    //  BILHETES
    // =========================================================================

    pub async fn sell_ticket(&self, principal: &Principal, tombola_id: Uuid) -> Result<Ticket, AppError> {
        principal.require_role(&[Role::Child])?;
        let mut tx = self.db.begin().await?;

        // 1. Kermesse em andamento e comprador membro dela
        let current = self.find_tombola(&mut *tx, tombola_id, RowLock::None).await?;
        let kermesse = self.share_kermesse(&mut *tx, current.kermesse_id).await?;
        lifecycle::ensure_mutable(&kermesse)?;

        if !self
            .kermesse_repo
            .is_active_member(&mut *tx, kermesse.id, principal.id)
            .await?
        {
            return Err(AppError::Forbidden("usuário não participa desta kermesse"));
        }

        // 2. Tombola aberta (trava compartilhada: o sorteio espera esta venda)
        let tombola = self.find_tombola(&mut *tx, tombola_id, RowLock::Share).await?;
        ensure_started(&tombola)?;

        // 3. Débito + bilhete
        self.ledger.debit(&mut *tx, principal.id, tombola.price).await?;
        let ticket = self
            .tombola_repo
            .create_ticket(&mut *tx, principal.id, &tombola)
            .await?;

        tx.commit().await?;
        tracing::info!("Bilhete {} vendido na tombola {}", ticket.id, tombola_id);
        Ok(ticket)
    }

    pub async fn list_tickets(&self, principal: &Principal) -> Result<Vec<Ticket>, AppError> {
        self.tombola_repo.list_tickets_for(principal).await
    }

    pub async fn get_ticket(&self, id: Uuid) -> Result<Ticket, AppError> {
        self.tombola_repo
            .find_ticket(id)
            .await?
            .ok_or(AppError::NotFound("Bilhete"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;

    fn tombola(status: TombolaStatus) -> Tombola {
        Tombola {
            id: Uuid::new_v4(),
            kermesse_id: Uuid::new_v4(),
            name: "Grande Sorteio".into(),
            price: 5,
            gift: "Uma bicicleta".into(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_tickets_means_no_winner() {
        assert_eq!(draw_winner(&[], &mut rand::rng()), None);
    }

    #[test]
    fn single_ticket_always_wins() {
        let only = Uuid::new_v4();
        assert_eq!(draw_winner(&[only], &mut rand::rng()), Some(only));
    }

    #[test]
    fn winner_comes_from_the_sold_tickets() {
        let tickets: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let winner = draw_winner(&tickets, &mut rng).unwrap();
            assert!(tickets.contains(&winner));
        }
    }

    #[test]
    fn draw_is_roughly_uniform() {
        let tickets: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<Uuid, usize> = HashMap::new();
        for _ in 0..4000 {
            *counts.entry(draw_winner(&tickets, &mut rng).unwrap()).or_default() += 1;
        }
        assert_eq!(counts.len(), 4);
        for count in counts.values() {
            assert!((800..1200).contains(count), "contagem fora do esperado: {count}");
        }
    }

    #[test]
    fn ended_tombola_cannot_be_finished_again() {
        assert!(ensure_started(&tombola(TombolaStatus::Started)).is_ok());
        assert!(matches!(
            ensure_started(&tombola(TombolaStatus::Ended)),
            Err(AppError::TombolaNotStarted)
        ));
    }
}
