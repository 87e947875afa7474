use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::cookie::extract_session_id;
use crate::{error::ApiError, state::AppState, users::dto::PublicUser};

/// Session id from the request cookie, if any. Never rejects.
pub struct SessionId(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionId(extract_session_id(&parts.headers)))
    }
}

/// Gate for protected routes: resolves the cookie to a live session and
/// yields the user copy stored with it. Rejects with 401 otherwise.
pub struct SessionUser {
    pub session_id: String,
    pub user: PublicUser,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = extract_session_id(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("User not logged in".into()))?;

        match state.sessions.load(&session_id).await {
            Ok(Some(user)) => Ok(SessionUser { session_id, user }),
            Ok(None) => {
                warn!("unknown or expired session");
                Err(ApiError::Unauthorized("User not logged in".into()))
            }
            Err(e) => Err(ApiError::Session(e)),
        }
    }
}
