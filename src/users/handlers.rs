use axum::{
    extract::{Path, State},
    http::{
        header::{HOST, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument};

use crate::{
    error::ApiError,
    mail::ResetMail,
    response::{ok, Envelope},
    session::{
        cookie::{clear_session_cookie, session_cookie},
        SessionId, SessionUser,
    },
    state::AppState,
    users::{
        dto::{
            ForgotPasswordRequest, LoginRequest, PublicUser, ResetPasswordRequest, SignupRequest,
            UpdateProfileRequest,
        },
        repo_types::{NewUser, ProfileChanges},
        services::{
            authenticate, generate_reset_token, generate_user_name, hash_password,
            normalize_email, reset_link,
        },
    },
    validate::ValidatedJson,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/profile", get(get_profile).put(edit_profile))
        .route("/logout", get(logout))
        .route("/forgotPassword", post(forgot_password))
        .route("/reset/:token", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_type = checked_type(&state, payload.user_type)?;
    let password_hash = hash_password(&payload.password).map_err(ApiError::Internal)?;

    let new_user = NewUser {
        user_name: generate_user_name(&payload.first_name),
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: normalize_email(&payload.email),
        password_hash,
        phone: payload.phone,
        user_type,
    };
    let user = state
        .users
        .create(new_user)
        .await
        .map_err(ApiError::Database)?;

    info!(user_id = %user.id, user_name = %user.user_name, "user successfully added to database");
    let user = PublicUser::from(user);
    let cookie = start_session(&state, &user).await?;
    Ok((
        [(SET_COOKIE, cookie)],
        Json(ok("User successfully added to database", Some(user))),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&payload.email);
    let user = authenticate(state.users.as_ref(), &email, &payload.password).await?;

    info!(user_id = %user.id, "user successfully logged in");
    let user = PublicUser::from(user);
    let cookie = start_session(&state, &user).await?;
    Ok((
        [(SET_COOKIE, cookie)],
        Json(ok("User successfully logged in", Some(user))),
    ))
}

#[instrument(skip(state, session), fields(user_id = %session.user.id))]
pub async fn get_profile(
    State(state): State<AppState>,
    session: SessionUser,
) -> Result<Json<Envelope<PublicUser>>, ApiError> {
    let user = state
        .users
        .find_by_id(session.user.id)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ok("Profile Details", Some(PublicUser::from(user)))))
}

#[instrument(skip(state, session, payload), fields(user_id = %session.user.id))]
pub async fn edit_profile(
    State(state): State<AppState>,
    session: SessionUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<Envelope<PublicUser>>, ApiError> {
    let password_hash = match payload.password.as_deref() {
        Some(plain) => Some(hash_password(plain).map_err(ApiError::Internal)?),
        None => None,
    };
    let changes = ProfileChanges {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        password_hash,
        user_type: checked_type(&state, payload.user_type)?,
    };

    let user = state
        .users
        .update_profile(session.user.id, changes)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let user = PublicUser::from(user);

    state
        .sessions
        .refresh(&session.session_id, &user)
        .await
        .map_err(ApiError::Session)?;

    info!("edited profile details");
    Ok(Json(ok("Edited Profile Details", Some(user))))
}

#[instrument(skip(state, session_id))]
pub async fn logout(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(id) = session_id {
        state
            .sessions
            .destroy(&id)
            .await
            .map_err(ApiError::Session)?;
    }

    info!("user logged out");
    Ok((
        [(SET_COOKIE, clear_session_cookie(&state.config.session))],
        Json(ok::<()>("User Logged Out", None)),
    ))
}

#[instrument(skip(state, headers, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<Envelope<String>>, ApiError> {
    let email = normalize_email(&payload.email);
    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let token = generate_reset_token().map_err(ApiError::Internal)?;
    let expires = OffsetDateTime::now_utc() + Duration::minutes(state.config.reset_token_ttl_minutes);
    state
        .users
        .set_reset_token(user.id, &token, expires)
        .await
        .map_err(ApiError::Database)?;
    debug!(user_id = %user.id, "reset token saved");

    let link = reset_link(&public_base_url(&state, &headers), &token);
    // The token stays valid even if the mail below never goes out.
    state
        .mailer
        .send(&ResetMail {
            to: user.email,
            link: link.clone(),
        })
        .await
        .map_err(ApiError::Mail)?;

    info!(user_id = %user.id, "password reset mail successfully sent");
    Ok(Json(ok("Password reset mail successfully sent", Some(link))))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let user = state
        .users
        .find_by_reset_token(&token, OffsetDateTime::now_utc())
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let password_hash = hash_password(&payload.password).map_err(ApiError::Internal)?;
    state
        .users
        .reset_password(user.id, &password_hash)
        .await
        .map_err(ApiError::Database)?;

    info!(user_id = %user.id, "successfully changed password");
    Ok(Json(ok("successfully changed password", None)))
}

async fn start_session(state: &AppState, user: &PublicUser) -> Result<HeaderValue, ApiError> {
    let id = state
        .sessions
        .create(user)
        .await
        .map_err(ApiError::Session)?;
    session_cookie(&state.config.session, &id).map_err(|e| ApiError::Internal(e.into()))
}

/// `type` is only accepted from the configured allow-list.
fn checked_type(state: &AppState, user_type: Option<String>) -> Result<Option<String>, ApiError> {
    match user_type {
        Some(t) if !state.config.type_allowed(&t) => {
            Err(ApiError::Validation(format!("type '{t}' is not allowed")))
        }
        other => Ok(other),
    }
}

fn public_base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return base.clone();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}
