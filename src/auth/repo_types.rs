use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub username: String,             // display / login name
    pub email: String,                // unique, lower-cased
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub google_id: Option<String>,    // set for Google sign-in accounts
    pub picture: Option<String>,      // avatar URL from Google
    pub created_at: OffsetDateTime,   // creation timestamp
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub google_id: Option<String>,
    pub picture: Option<String>,
}
