// src/services/ledger.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{common::error::AppError, db::UserRepository};

/// Um lançamento no saldo de um usuário.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub user_id: Uuid,
    pub delta: i64,
}

/// Débito em quem paga e crédito em quem recebe. A soma é sempre zero.
pub fn transfer_postings(from: Uuid, to: Uuid, amount: i64) -> [Posting; 2] {
    [
        Posting { user_id: from, delta: -amount },
        Posting { user_id: to, delta: amount },
    ]
}

pub fn ensure_sufficient(balance: i64, amount: i64) -> Result<(), AppError> {
    if amount < 0 {
        return Err(AppError::InvalidAmount);
    }
    if balance < amount {
        return Err(AppError::NotEnoughCredit);
    }
    Ok(())
}

/// Livro-razão de créditos. Toda alteração de `users.credit` passa por aqui,
/// sempre dentro da transação de quem chama.
#[derive(Clone)]
pub struct Ledger {
    user_repo: UserRepository,
}

impl Ledger {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Trava as duas contas (por id), confere o saldo de quem paga e aplica
    /// os dois lançamentos. Retorna o novo saldo de quem paga.
    pub async fn transfer(
        &self,
        conn: &mut PgConnection,
        from: Uuid,
        to: Uuid,
        amount: i64,
    ) -> Result<i64, AppError> {
        let accounts = self.user_repo.lock_many(&mut *conn, &[from, to]).await?;

        let payer = accounts
            .iter()
            .find(|u| u.id == from)
            .ok_or(AppError::NotFound("Usuário"))?;
        if !accounts.iter().any(|u| u.id == to) {
            return Err(AppError::NotFound("Usuário"));
        }
        ensure_sufficient(payer.credit, amount)?;

        let mut payer_balance = payer.credit;
        for posting in transfer_postings(from, to, amount) {
            let balance = self
                .user_repo
                .adjust_credit(&mut *conn, posting.user_id, posting.delta)
                .await?;
            if posting.user_id == from {
                payer_balance = balance;
            }
        }

        Ok(payer_balance)
    }

    /// Débito sem contrapartida (compra de bilhete de tombola).
    pub async fn debit(&self, conn: &mut PgConnection, user_id: Uuid, amount: i64) -> Result<i64, AppError> {
        let accounts = self.user_repo.lock_many(&mut *conn, &[user_id]).await?;
        let account = accounts.first().ok_or(AppError::NotFound("Usuário"))?;
        ensure_sufficient(account.credit, amount)?;

        self.user_repo.adjust_credit(&mut *conn, user_id, -amount).await
    }

    /// Crédito virtual emitido pelo servidor.
    pub async fn issue(&self, conn: &mut PgConnection, user_id: Uuid, amount: i64) -> Result<i64, AppError> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount);
        }
        self.user_repo.lock_many(&mut *conn, &[user_id]).await?;
        self.user_repo.adjust_credit(&mut *conn, user_id, amount).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_conserves_the_total() {
        let (buyer, holder) = (Uuid::new_v4(), Uuid::new_v4());
        let postings = transfer_postings(buyer, holder, 20);

        assert_eq!(postings.iter().map(|p| p.delta).sum::<i64>(), 0);
        assert_eq!(postings[0], Posting { user_id: buyer, delta: -20 });
        assert_eq!(postings[1], Posting { user_id: holder, delta: 20 });
    }

    #[test]
    fn balance_must_cover_the_amount() {
        assert!(ensure_sufficient(25, 20).is_ok());
        assert!(ensure_sufficient(20, 20).is_ok());
        assert!(matches!(ensure_sufficient(5, 20), Err(AppError::NotEnoughCredit)));
        assert!(matches!(ensure_sufficient(5, -1), Err(AppError::InvalidAmount)));
    }

    #[test]
    fn free_items_need_no_credit() {
        assert!(ensure_sufficient(0, 0).is_ok());
    }
}
