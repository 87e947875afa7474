use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::ApiError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Field validator used by the request schemas.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some("Invalid email".into());
        Err(err)
    }
}

/// JSON body checked against the payload's schema before the handler runs.
/// Malformed bodies and schema violations are answered with a 400 envelope.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        Ok(ValidatedJson(value))
    }
}
