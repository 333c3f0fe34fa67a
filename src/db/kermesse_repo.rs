// src/db/kermesse_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::RowLock, error::AppError},
    models::{
        auth::{Principal, Role},
        kermesse::{Kermesse, KermessePayload, KermesseStats, KermesseStatus},
        tombola::TombolaStatus,
    },
};

// Organizador vê as suas, pai e criança as que participam, responsável de
// stand as que recebem o seu stand.
fn push_visible_to(qb: &mut QueryBuilder<'_, Postgres>, principal: &Principal) {
    match principal.role {
        Role::Organizer => {
            qb.push("k.user_id = ").push_bind(principal.id);
        }
        Role::Parent | Role::Child => {
            qb.push("EXISTS (SELECT 1 FROM kermesses_users ku WHERE ku.kermesse_id = k.id AND ku.user_id = ")
                .push_bind(principal.id)
                .push(")");
        }
        Role::StandHolder => {
            qb.push(
                r#"EXISTS (
                    SELECT 1 FROM kermesses_stands ks
                    JOIN stands s ON s.id = ks.stand_id
                    WHERE ks.kermesse_id = k.id AND s.user_id = "#,
            )
            .push_bind(principal.id)
            .push(")");
        }
    }
}

#[derive(Clone)]
pub struct KermesseRepository {
    pool: PgPool,
}

impl KermesseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  KERMESSES
    // =========================================================================

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        lock: RowLock,
    ) -> Result<Option<Kermesse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT * FROM kermesses WHERE id = $1{}", lock.clause());
        let kermesse = sqlx::query_as::<_, Kermesse>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(kermesse)
    }

    /// Lista filtrada pelo perfil de quem consulta.
    pub async fn list_for(&self, principal: &Principal) -> Result<Vec<Kermesse>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT k.* FROM kermesses k WHERE ");
        push_visible_to(&mut qb, principal);
        qb.push(" ORDER BY k.created_at DESC");

        let kermesses = qb.build_query_as::<Kermesse>().fetch_all(&self.pool).await?;
        Ok(kermesses)
    }

    /// Mesmo recorte de `list_for`, para uma kermesse só.
    pub async fn is_visible_to<'e, E>(&self, executor: E, id: Uuid, principal: &Principal) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT EXISTS (SELECT 1 FROM kermesses k WHERE k.id = ");
        qb.push_bind(id).push(" AND ");
        push_visible_to(&mut qb, principal);
        qb.push(")");

        let visible = qb.build_query_scalar::<bool>().fetch_one(executor).await?;
        Ok(visible)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        organizer_id: Uuid,
        payload: &KermessePayload,
    ) -> Result<Kermesse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kermesse = sqlx::query_as::<_, Kermesse>(
            "INSERT INTO kermesses (user_id, name, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(organizer_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .fetch_one(executor)
        .await?;
        Ok(kermesse)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &KermessePayload,
    ) -> Result<Kermesse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kermesse = sqlx::query_as::<_, Kermesse>(
            r#"
            UPDATE kermesses SET name = $1, description = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(kermesse)
    }

    pub async fn end<'e, E>(&self, executor: E, id: Uuid) -> Result<Kermesse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kermesse = sqlx::query_as::<_, Kermesse>(
            "UPDATE kermesses SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(KermesseStatus::Ended)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(kermesse)
    }

    pub async fn count_started_tombolas<'e, E>(&self, executor: E, id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tombolas WHERE kermesse_id = $1 AND status = $2")
                .bind(id)
                .bind(TombolaStatus::Started)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }

    // =========================================================================
    //  VÍNCULOS (membros e stands)
    // =========================================================================

    pub async fn add_member<'e, E>(&self, executor: E, kermesse_id: Uuid, user_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO kermesses_users (kermesse_id, user_id) VALUES ($1, $2)")
            .bind(kermesse_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn add_stand<'e, E>(&self, executor: E, kermesse_id: Uuid, stand_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO kermesses_stands (kermesse_id, stand_id) VALUES ($1, $2)")
            .bind(kermesse_id)
            .bind(stand_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// O usuário é membro desta kermesse e ela está em andamento?
    pub async fn is_active_member<'e, E>(
        &self,
        executor: E,
        kermesse_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let is_member: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM kermesses_users ku
                JOIN kermesses k ON k.id = ku.kermesse_id
                WHERE ku.kermesse_id = $1 AND ku.user_id = $2 AND k.status = $3
            )
            "#,
        )
        .bind(kermesse_id)
        .bind(user_id)
        .bind(KermesseStatus::Started)
        .fetch_one(executor)
        .await?;
        Ok(is_member)
    }

    /// Caminho membro -> kermesse em andamento <- stand. Retorna a kermesse
    /// onde a compra acontece, se existir.
    pub async fn find_purchase_kermesse<'e, E>(
        &self,
        executor: E,
        buyer_id: Uuid,
        stand_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kermesse_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT k.id
            FROM kermesses k
            JOIN kermesses_stands ks ON ks.kermesse_id = k.id
            JOIN kermesses_users ku ON ku.kermesse_id = k.id
            WHERE ks.stand_id = $1 AND ku.user_id = $2 AND k.status = $3
            LIMIT 1
            "#,
        )
        .bind(stand_id)
        .bind(buyer_id)
        .bind(KermesseStatus::Started)
        .fetch_optional(executor)
        .await?;
        Ok(kermesse_id)
    }

    // =========================================================================
    //  INDICADORES
    // =========================================================================

    pub async fn stats(&self, id: Uuid, principal: &Principal) -> Result<KermesseStats, AppError> {
        let mut stats = KermesseStats::default();

        stats.stand_count = sqlx::query_scalar("SELECT COUNT(*) FROM kermesses_stands WHERE kermesse_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        match principal.role {
            Role::Organizer => {
                stats.tombola_count = sqlx::query_scalar("SELECT COUNT(*) FROM tombolas WHERE kermesse_id = $1")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;

                stats.user_count =
                    sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM kermesses_users WHERE kermesse_id = $1")
                        .bind(id)
                        .fetch_one(&self.pool)
                        .await?;

                let (count, income): (i64, i64) = sqlx::query_as(
                    "SELECT COUNT(*), COALESCE(SUM(credit), 0)::BIGINT FROM interactions WHERE kermesse_id = $1",
                )
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
                stats.interaction_count = count;
                stats.interaction_income = income;

                stats.tombola_income = sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(SUM(t.price), 0)::BIGINT
                    FROM tickets t
                    JOIN tombolas tb ON t.tombola_id = tb.id
                    WHERE tb.kermesse_id = $1
                    "#,
                )
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            }
            Role::Parent => {
                stats.user_count = sqlx::query_scalar(
                    r#"
                    SELECT COUNT(DISTINCT u.id)
                    FROM kermesses_users ku
                    JOIN users u ON ku.user_id = u.id
                    WHERE ku.kermesse_id = $1 AND u.role = $2 AND u.parent_id = $3
                    "#,
                )
                .bind(id)
                .bind(Role::Child)
                .bind(principal.id)
                .fetch_one(&self.pool)
                .await?;
            }
            Role::StandHolder => {
                let (count, income): (i64, i64) = sqlx::query_as(
                    r#"
                    SELECT COUNT(*), COALESCE(SUM(i.credit), 0)::BIGINT
                    FROM interactions i
                    JOIN stands s ON i.stand_id = s.id
                    WHERE i.kermesse_id = $1 AND s.user_id = $2
                    "#,
                )
                .bind(id)
                .bind(principal.id)
                .fetch_one(&self.pool)
                .await?;
                stats.interaction_count = count;
                stats.interaction_income = income;
            }
            Role::Child => {
                stats.points = sqlx::query_scalar(
                    "SELECT COALESCE(SUM(point), 0)::BIGINT FROM interactions WHERE kermesse_id = $1 AND user_id = $2",
                )
                .bind(id)
                .bind(principal.id)
                .fetch_one(&self.pool)
                .await?;
            }
        }

        Ok(stats)
    }
}
