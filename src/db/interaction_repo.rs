// src/db/interaction_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::RowLock, error::AppError},
    models::{
        auth::{Principal, Role},
        interaction::{Interaction, InteractionStatus},
        stand::StandKind,
    },
};

#[derive(Clone)]
pub struct InteractionRepository {
    pool: PgPool,
}

/// Dados de uma nova interação, já calculados pelo motor de compras.
pub struct NewInteraction {
    pub user_id: Uuid,
    pub stand_id: Uuid,
    pub kermesse_id: Uuid,
    pub kind: StandKind,
    pub credit: i64,
    pub quantity: i32,
    pub status: Option<InteractionStatus>,
}

impl InteractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, new: &NewInteraction) -> Result<Interaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let interaction = sqlx::query_as::<_, Interaction>(
            r#"
            INSERT INTO interactions (user_id, stand_id, kermesse_id, kind, credit, quantity, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.stand_id)
        .bind(new.kermesse_id)
        .bind(new.kind)
        .bind(new.credit)
        .bind(new.quantity)
        .bind(new.status)
        .fetch_one(executor)
        .await?;
        Ok(interaction)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        lock: RowLock,
    ) -> Result<Option<Interaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT * FROM interactions WHERE id = $1{}", lock.clause());
        let interaction = sqlx::query_as::<_, Interaction>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(interaction)
    }

    pub async fn settle<'e, E>(&self, executor: E, id: Uuid, point: i32) -> Result<Interaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let interaction = sqlx::query_as::<_, Interaction>(
            r#"
            UPDATE interactions SET status = $1, point = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(InteractionStatus::Ended)
        .bind(point)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(interaction)
    }

    /// Organizador vê as das suas kermesses, responsável as do seu stand,
    /// pai as dos filhos e criança apenas as próprias.
    pub async fn list_for(
        &self,
        principal: &Principal,
        kermesse_id: Option<Uuid>,
    ) -> Result<Vec<Interaction>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT i.* FROM interactions i");

        match principal.role {
            Role::Organizer => {
                qb.push(" JOIN kermesses k ON k.id = i.kermesse_id WHERE k.user_id = ")
                    .push_bind(principal.id);
            }
            Role::StandHolder => {
                qb.push(" JOIN stands s ON s.id = i.stand_id WHERE s.user_id = ")
                    .push_bind(principal.id);
            }
            Role::Parent => {
                qb.push(" JOIN users u ON u.id = i.user_id WHERE u.parent_id = ")
                    .push_bind(principal.id);
            }
            Role::Child => {
                qb.push(" WHERE i.user_id = ").push_bind(principal.id);
            }
        }

        if let Some(kermesse_id) = kermesse_id {
            qb.push(" AND i.kermesse_id = ").push_bind(kermesse_id);
        }
        qb.push(" ORDER BY i.created_at DESC");

        let interactions = qb.build_query_as::<Interaction>().fetch_all(&self.pool).await?;
        Ok(interactions)
    }
}
