use sqlx::{PgPool, Postgres, Transaction};

use crate::common::error::AppError;

/// Trava de linha aplicada a um SELECT dentro de uma transação.
///
/// Ordem de aquisição usada pelos serviços: kermesse -> tombola -> stand ->
/// interação -> usuários (por id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    None,
    Share,
    Update,
}

impl RowLock {
    pub fn clause(self) -> &'static str {
        match self {
            RowLock::None => "",
            RowLock::Share => " FOR SHARE",
            RowLock::Update => " FOR UPDATE",
        }
    }
}

// ---
// Helper de transação: a "chave" de cada operação orquestrada
// ---
#[derive(Clone)]
pub struct Transactor {
    pool: PgPool,
    statement_timeout_ms: u64,
}

impl Transactor {
    pub fn new(pool: PgPool, statement_timeout_ms: u64) -> Self {
        Self { pool, statement_timeout_ms }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Abre uma transação com timeout local. Se o timeout estourar, o Postgres
    /// aborta o comando e o drop da transação faz o rollback.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        let mut tx = self.pool.begin().await?;
        let timeout = timeout_setting(self.statement_timeout_ms);

        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(&timeout)
            .execute(&mut *tx)
            .await?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(&timeout)
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

fn timeout_setting(ms: u64) -> String {
    format!("{ms}ms")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_clauses() {
        assert_eq!(RowLock::None.clause(), "");
        assert_eq!(RowLock::Share.clause(), " FOR SHARE");
        assert_eq!(RowLock::Update.clause(), " FOR UPDATE");
    }

    #[test]
    fn timeout_is_rendered_in_milliseconds() {
        assert_eq!(timeout_setting(5000), "5000ms");
        assert_eq!(timeout_setting(0), "0ms");
    }
}
