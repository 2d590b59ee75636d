//! User repository (数据库访问层)

use crate::{
    error::AppError,
    models::user::{NewUser, User},
};
use async_trait::async_trait;
use sqlx::PgPool;

/// Persistence boundary for user accounts.
///
/// `create` must enforce email uniqueness atomically and report a clash as
/// [`AppError::DuplicateEmail`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn create(&self, user: &NewUser) -> Result<User, AppError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

#[async_trait]
impl UserStore for PgUserStore {
    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 创建用户，唯一约束冲突映射为 DuplicateEmail
    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::DuplicateEmail(user.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 分页列出用户
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }
}
