use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::{distributions::Uniform, rngs::OsRng, Rng, RngCore};
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::users::{repo::UserStore, repo_types::User};

const SHORT_ID_ALPHABET: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_-";
const SHORT_ID_LEN: usize = 9;
const RESET_TOKEN_BYTES: usize = 15;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// `first_name` followed by a random URL-safe short id.
pub fn generate_user_name(first_name: &str) -> String {
    let pick = Uniform::from(0..SHORT_ID_ALPHABET.len());
    let short_id: String = OsRng
        .sample_iter(pick)
        .take(SHORT_ID_LEN)
        .map(|i| SHORT_ID_ALPHABET[i] as char)
        .collect();
    format!("{first_name}{short_id}")
}

/// 15 random bytes, hex encoded (30 characters).
pub fn generate_reset_token() -> anyhow::Result<String> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| anyhow::anyhow!("failed to generate reset token: {e}"))?;
    Ok(hex::encode(bytes))
}

pub fn reset_link(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/users/reset/{token}")
}

/// Checks the credentials against the stored hash. Unknown email and wrong
/// password produce the same message.
pub async fn authenticate(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let user = match store.find_by_email(email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Authentication("Invalid credentials".into()));
        }
        Err(e) => return Err(ApiError::Database(e)),
    };

    let ok = verify_password(password, &user.password_hash).map_err(ApiError::Internal)?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Authentication("Invalid credentials".into()));
    }

    debug!(user_id = %user.id, "credentials verified");
    Ok(user)
}
