// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::RowLock, error::AppError},
    models::auth::{Role, User},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        lock: RowLock,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT * FROM users WHERE id = $1{}", lock.clause());
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    /// Trava várias contas de uma vez, sempre na mesma ordem (por id),
    /// para que duas transferências cruzadas não entrem em deadlock.
    pub async fn lock_many<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    pub async fn has_stand(&self, id: Uuid) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM stands WHERE user_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn list(&self, kermesse_id: Option<Uuid>) -> Result<Vec<User>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT DISTINCT u.* FROM users u");
        if let Some(kermesse_id) = kermesse_id {
            qb.push(" JOIN kermesses_users ku ON ku.user_id = u.id WHERE ku.kermesse_id = ")
                .push_bind(kermesse_id);
        }
        qb.push(" ORDER BY u.name ASC");

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    pub async fn list_children(
        &self,
        parent_id: Uuid,
        kermesse_id: Option<Uuid>,
    ) -> Result<Vec<User>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT DISTINCT u.* FROM users u");
        if kermesse_id.is_some() {
            qb.push(" JOIN kermesses_users ku ON ku.user_id = u.id");
        }
        qb.push(" WHERE u.role = ")
            .push_bind(Role::Child)
            .push(" AND u.parent_id = ")
            .push_bind(parent_id);
        if let Some(kermesse_id) = kermesse_id {
            qb.push(" AND ku.kermesse_id = ").push_bind(kermesse_id);
        }
        qb.push(" ORDER BY u.name ASC");

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Crianças que ainda não são membros da kermesse.
    pub async fn list_invitable(&self, kermesse_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            WHERE u.role = $1
              AND NOT EXISTS (
                  SELECT 1 FROM kermesses_users ku
                  WHERE ku.user_id = u.id AND ku.kermesse_id = $2
              )
            ORDER BY u.name ASC
            "#,
        )
        .bind(Role::Child)
        .bind(kermesse_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // ---
    // Escrita
    // ---

    // Com tratamento de erro específico para e-mails duplicados.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        parent_id: Option<Uuid>,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (parent_id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(parent_id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn update_password<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Primitiva do livro-razão: `credit += delta`, de forma atômica.
    /// Quem chama já validou `credit + delta >= 0` na mesma transação.
    pub async fn adjust_credit<'e, E>(&self, executor: E, id: Uuid, delta: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET credit = credit + $1, updated_at = NOW() WHERE id = $2 RETURNING credit",
        )
        .bind(delta)
        .bind(id)
        .fetch_optional(executor)
        .await?;

        balance.ok_or(AppError::NotFound("Usuário"))
    }
}
