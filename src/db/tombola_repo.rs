// src/db/tombola_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::RowLock, error::AppError},
    models::{
        auth::{Principal, Role},
        tombola::{CreateTombolaPayload, Ticket, Tombola, TombolaFilter, TombolaStatus, UpdateTombolaPayload},
    },
};

#[derive(Clone)]
pub struct TombolaRepository {
    pool: PgPool,
}

impl TombolaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  TOMBOLAS
    // =========================================================================

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        lock: RowLock,
    ) -> Result<Option<Tombola>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT * FROM tombolas WHERE id = $1{}", lock.clause());
        let tombola = sqlx::query_as::<_, Tombola>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(tombola)
    }

    pub async fn list(&self, filter: &TombolaFilter) -> Result<Vec<Tombola>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM tombolas WHERE 1=1");
        if let Some(kermesse_id) = filter.kermesse_id {
            qb.push(" AND kermesse_id = ").push_bind(kermesse_id);
        }
        qb.push(" ORDER BY created_at DESC");

        let tombolas = qb.build_query_as::<Tombola>().fetch_all(&self.pool).await?;
        Ok(tombolas)
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &CreateTombolaPayload) -> Result<Tombola, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tombola = sqlx::query_as::<_, Tombola>(
            r#"
            INSERT INTO tombolas (kermesse_id, name, price, gift)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(payload.kermesse_id)
        .bind(&payload.name)
        .bind(payload.price)
        .bind(&payload.gift)
        .fetch_one(executor)
        .await?;
        Ok(tombola)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateTombolaPayload,
    ) -> Result<Tombola, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tombola = sqlx::query_as::<_, Tombola>(
            r#"
            UPDATE tombolas SET name = $1, price = $2, gift = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(payload.price)
        .bind(&payload.gift)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(tombola)
    }

    pub async fn end<'e, E>(&self, executor: E, id: Uuid) -> Result<Tombola, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tombola = sqlx::query_as::<_, Tombola>(
            "UPDATE tombolas SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(TombolaStatus::Ended)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(tombola)
    }

    // =========================================================================
    //  BILHETES
    // =========================================================================

    pub async fn create_ticket<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        tombola: &Tombola,
    ) -> Result<Ticket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ticket = sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (user_id, tombola_id, price) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(tombola.id)
        .bind(tombola.price)
        .fetch_one(executor)
        .await?;
        Ok(ticket)
    }

    pub async fn ticket_ids<'e, E>(&self, executor: E, tombola_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM tickets WHERE tombola_id = $1 ORDER BY created_at")
            .bind(tombola_id)
            .fetch_all(executor)
            .await?;
        Ok(ids)
    }

    pub async fn mark_winner<'e, E>(&self, executor: E, ticket_id: Uuid) -> Result<Ticket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ticket = sqlx::query_as::<_, Ticket>("UPDATE tickets SET is_winner = TRUE WHERE id = $1 RETURNING *")
            .bind(ticket_id)
            .fetch_one(executor)
            .await?;
        Ok(ticket)
    }

    pub async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ticket)
    }

    /// Bilhetes visíveis para o perfil: organizador vê os das suas
    /// kermesses, pai os dos filhos e criança os próprios.
    pub async fn list_tickets_for(&self, principal: &Principal) -> Result<Vec<Ticket>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT t.* FROM tickets t");

        match principal.role {
            Role::Organizer => {
                qb.push(
                    r#" JOIN tombolas tb ON tb.id = t.tombola_id
                        JOIN kermesses k ON k.id = tb.kermesse_id
                        WHERE k.user_id = "#,
                )
                .push_bind(principal.id);
            }
            Role::Parent => {
                qb.push(" JOIN users u ON u.id = t.user_id WHERE u.parent_id = ")
                    .push_bind(principal.id);
            }
            Role::Child | Role::StandHolder => {
                qb.push(" WHERE t.user_id = ").push_bind(principal.id);
            }
        }
        qb.push(" ORDER BY t.created_at DESC");

        let tickets = qb.build_query_as::<Ticket>().fetch_all(&self.pool).await?;
        Ok(tickets)
    }
}
