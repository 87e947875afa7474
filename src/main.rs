use std::time::Duration;

mod app;
mod config;
mod error;
mod mail;
mod response;
mod session;
mod state;
mod users;
mod validate;

#[cfg(test)]
mod testing;

use crate::{session::store::purge_loop, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "catchup=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    tokio::spawn(purge_loop(
        app_state.sessions.clone(),
        Duration::from_secs(app_state.config.session.purge_interval_secs.max(1)),
    ));

    app::serve(app::build_app(app_state)).await
}
