// src/db/stand_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::RowLock, error::AppError},
    models::{
        kermesse::KermesseStatus,
        stand::{CreateStandPayload, Stand, StandFilter, UpdateStandPayload},
    },
};

#[derive(Clone)]
pub struct StandRepository {
    pool: PgPool,
}

impl StandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        lock: RowLock,
    ) -> Result<Option<Stand>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT * FROM stands WHERE id = $1{}", lock.clause());
        let stand = sqlx::query_as::<_, Stand>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(stand)
    }

    // Um stand por responsável: a regra é garantida por esta busca
    pub async fn find_by_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        lock: RowLock,
    ) -> Result<Option<Stand>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT * FROM stands WHERE user_id = $1 ORDER BY created_at ASC LIMIT 1{}",
            lock.clause()
        );
        let stand = sqlx::query_as::<_, Stand>(&sql)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(stand)
    }

    pub async fn list(&self, filter: &StandFilter) -> Result<Vec<Stand>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT DISTINCT s.* FROM stands s WHERE 1=1");

        if let Some(kermesse_id) = filter.kermesse_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM kermesses_stands ks WHERE ks.stand_id = s.id AND ks.kermesse_id = ",
            )
            .push_bind(kermesse_id)
            .push(")");
        }

        if filter.is_free.unwrap_or(false) {
            qb.push(
                r#" AND NOT EXISTS (
                    SELECT 1 FROM kermesses_stands ks
                    JOIN kermesses k ON k.id = ks.kermesse_id
                    WHERE ks.stand_id = s.id AND k.status = "#,
            )
            .push_bind(KermesseStatus::Started)
            .push(")");
        }

        qb.push(" ORDER BY s.name ASC");
        let stands = qb.build_query_as::<Stand>().fetch_all(&self.pool).await?;
        Ok(stands)
    }

    /// O stand já roda em alguma kermesse em andamento?
    pub async fn is_in_started_kermesse<'e, E>(&self, executor: E, stand_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let associated: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM kermesses_stands ks
                JOIN kermesses k ON ks.kermesse_id = k.id
                WHERE ks.stand_id = $1 AND k.status = $2
            )
            "#,
        )
        .bind(stand_id)
        .bind(KermesseStatus::Started)
        .fetch_one(executor)
        .await?;
        Ok(associated)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        payload: &CreateStandPayload,
    ) -> Result<Stand, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stand = sqlx::query_as::<_, Stand>(
            r#"
            INSERT INTO stands (user_id, name, description, kind, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.kind)
        .bind(payload.price)
        .bind(payload.stock)
        .fetch_one(executor)
        .await?;
        Ok(stand)
    }

    /// Dados descritivos e preço. O estoque só muda por `adjust_stock`.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateStandPayload,
    ) -> Result<Stand, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stand = sqlx::query_as::<_, Stand>(
            r#"
            UPDATE stands
            SET name = $1, description = $2, price = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(stand)
    }

    /// Primitiva de estoque: `stock += delta` (negativo = consumo).
    /// Quem chama já validou `stock + delta >= 0` na mesma transação.
    pub async fn adjust_stock<'e, E>(&self, executor: E, id: Uuid, delta: i32) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock: Option<i32> = sqlx::query_scalar(
            "UPDATE stands SET stock = stock + $1, updated_at = NOW() WHERE id = $2 RETURNING stock",
        )
        .bind(delta)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        stock.ok_or(AppError::NotFound("Stand"))
    }
}
