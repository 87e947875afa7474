use crate::config::AppConfig;
use crate::mail::{self, Mailer};
use crate::session::{PgSessionStore, SessionStore};
use crate::users::repo::{PgUserStore, UserStore};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let mailer = mail::from_config(&config.mail)?;
        Ok(Self::with_postgres(db, config, mailer))
    }

    pub fn with_postgres(db: PgPool, config: Arc<AppConfig>, mailer: Arc<dyn Mailer>) -> Self {
        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let sessions =
            Arc::new(PgSessionStore::new(db, config.session.ttl_minutes)) as Arc<dyn SessionStore>;
        Self::from_parts(config, users, sessions, mailer)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            users,
            sessions,
            mailer,
        }
    }

    /// In-memory stores and a recording mailer; nothing touches the network.
    #[cfg(test)]
    pub fn fake() -> (Self, crate::testing::Fakes) {
        crate::testing::fake_state()
    }
}
