use anyhow::Context;
use serde::Deserialize;

const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;
const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
    pub purge_interval_secs: u64,
}

/// SMTP transport settings. `host` is the relay (the "service") to connect to;
/// without one, outgoing mail is only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub public_base_url: Option<String>,
    pub reset_token_ttl_minutes: i64,
    pub signup_allowed_types: Vec<String>,
    pub session: SessionConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let session = SessionConfig {
            ttl_minutes: minutes_var("SESSION_TTL_MINUTES", 60 * 24, MAX_SESSION_TTL_MINUTES)?,
            cookie_secure: parse_var("SESSION_COOKIE_SECURE").unwrap_or(false),
            purge_interval_secs: parse_var("SESSION_PURGE_INTERVAL_SECS").unwrap_or(600),
        };

        let user = optional_var("SMTP_USER");
        let mail = MailConfig {
            host: optional_var("SMTP_HOST"),
            password: optional_var("SMTP_PASSWORD"),
            from: optional_var("MAIL_FROM")
                .or_else(|| user.clone())
                .unwrap_or_else(|| "no-reply@localhost".into()),
            user,
        };

        Ok(Self {
            database_url,
            public_base_url: optional_var("PUBLIC_BASE_URL"),
            reset_token_ttl_minutes: minutes_var(
                "RESET_TOKEN_TTL_MINUTES",
                60,
                MAX_RESET_TOKEN_TTL_MINUTES,
            )?,
            signup_allowed_types: split_list(
                &std::env::var("SIGNUP_ALLOWED_TYPES").unwrap_or_else(|_| "user".into()),
            ),
            session,
            mail,
        })
    }

    pub fn type_allowed(&self, user_type: &str) -> bool {
        self.signup_allowed_types.iter().any(|t| t == user_type)
    }
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn minutes_var(key: &str, default: i64, max: i64) -> anyhow::Result<i64> {
    minutes_in_range(key, std::env::var(key).ok().as_deref(), default, max)
}

/// Unset or blank means `default`; anything else must parse and lie in `1..=max`.
fn minutes_in_range(key: &str, raw: Option<&str>, default: i64, max: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    let value: i64 = raw
        .parse()
        .with_context(|| format!("{key} must be a whole number of minutes, got {raw:?}"))?;
    if !(1..=max).contains(&value) {
        anyhow::bail!("{key} must be between 1 and {max} minutes, got {value}");
    }
    Ok(value)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
