use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::users::dto::PublicUser;

/// Server-side session records keyed by the id held in the client's cookie.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a copy of the user and returns the new session id.
    async fn create(&self, user: &PublicUser) -> anyhow::Result<String>;
    /// `None` for unknown or expired ids.
    async fn load(&self, id: &str) -> anyhow::Result<Option<PublicUser>>;
    /// Overwrites the stored user copy of a live session.
    async fn refresh(&self, id: &str, user: &PublicUser) -> anyhow::Result<()>;
    async fn destroy(&self, id: &str) -> anyhow::Result<()>;
    /// Removes expired rows, returning how many went.
    async fn purge_expired(&self) -> anyhow::Result<u64>;
}

pub fn generate_session_id() -> anyhow::Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session id")?;
    Ok(hex::encode(bytes))
}

/// Key under which a session is stored. Only this hash reaches the table;
/// the raw id lives in the client's cookie.
pub fn hash_session_id(id: &str) -> String {
    hex::encode(Sha256::digest(id.as_bytes()))
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
    ttl: time::Duration,
}

impl PgSessionStore {
    pub fn new(db: PgPool, ttl_minutes: i64) -> Self {
        Self {
            db,
            ttl: time::Duration::minutes(ttl_minutes),
        }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user: &PublicUser) -> anyhow::Result<String> {
        let id = generate_session_id()?;
        let expires_at = OffsetDateTime::now_utc() + self.ttl;
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_data, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(hash_session_id(&id))
        .bind(Json(user))
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("insert session")?;
        debug!(user_id = %user.id, "session created");
        Ok(id)
    }

    async fn load(&self, id: &str) -> anyhow::Result<Option<PublicUser>> {
        let row: Option<(Json<PublicUser>,)> = sqlx::query_as(
            r#"
            SELECT user_data
            FROM sessions
            WHERE id = $1 AND expires_at > now()
            "#,
        )
        .bind(hash_session_id(id))
        .fetch_optional(&self.db)
        .await
        .context("load session")?;
        Ok(row.map(|(Json(user),)| user))
    }

    async fn refresh(&self, id: &str, user: &PublicUser) -> anyhow::Result<()> {
        sqlx::query("UPDATE sessions SET user_data = $2 WHERE id = $1")
            .bind(hash_session_id(id))
            .bind(Json(user))
            .execute(&self.db)
            .await
            .context("refresh session")?;
        Ok(())
    }

    async fn destroy(&self, id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(hash_session_id(id))
            .execute(&self.db)
            .await
            .context("destroy session")?;
        Ok(())
    }

    async fn purge_expired(&self) -> anyhow::Result<u64> {
        let done = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.db)
            .await
            .context("purge sessions")?;
        Ok(done.rows_affected())
    }
}

/// Runs forever, sweeping expired sessions every `every`.
pub async fn purge_loop(store: Arc<dyn SessionStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match store.purge_expired().await {
            Ok(0) => {}
            Ok(n) => info!(purged = n, "expired sessions removed"),
            Err(e) => warn!(error = %e, "session purge failed"),
        }
    }
}
