use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_name: String,                 // first name + short id
    pub email: String,                     // unique, lower-cased
    #[serde(skip_serializing)]
    pub password_hash: String,             // Argon2 hash, not exposed in JSON
    pub phone: String,
    pub user_type: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Values for a fresh row; the id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub user_type: Option<String>,
}

/// Profile edit. `None` leaves the column untouched. Email and user name
/// have no field here, so they can never be changed through it.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub user_type: Option<String>,
}
