use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, ProfileChanges, User};

/// Persistence seam for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> anyhow::Result<User>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Applies the changes and returns the updated row, `None` if the id is unknown.
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges)
        -> anyhow::Result<Option<User>>;
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()>;
    /// Only matches while `now < reset_password_expires`.
    async fn find_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;
    /// Replaces the password and clears the reset token pair.
    async fn reset_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
}

const USER_COLUMNS: &str = "id, first_name, last_name, user_name, email, password_hash, phone, \
     user_type, reset_password_token, reset_password_expires, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, first_name, last_name, user_name, email, password_hash, phone, user_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.user_name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.phone)
            .bind(&new_user.user_type)
            .fetch_one(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users SET
                first_name    = COALESCE($2, first_name),
                last_name     = COALESCE($3, last_name),
                phone         = COALESCE($4, phone),
                password_hash = COALESCE($5, password_hash),
                user_type     = COALESCE($6, user_type)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.phone)
            .bind(changes.password_hash)
            .bind(changes.user_type)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_password_token = $2, reset_password_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(&self.db)
        .await
        .context("save reset token")?;
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_password_token = $1 AND reset_password_expires > $2"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn reset_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_password_token = NULL, reset_password_expires = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await
        .context("save new password")?;
        Ok(())
    }
}
