use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::users::repo_types::User;
use crate::validate::validate_email;

/// Request body for signup.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "firstName is required"))]
    pub first_name: String,
    pub last_name: Option<String>,
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[serde(rename = "type")]
    pub user_type: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Request body for profile edit. Anything not listed (email, userName) is ignored.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "firstName must not be empty"))]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = "validate_email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Public part of the user returned to the client and kept in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub user_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            user_name: u.user_name,
            email: u.email,
            phone: u.phone,
            user_type: u.user_type,
            created_at: u.created_at,
        }
    }
}
