use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String, // always lowercase
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    #[serde(skip_serializing)]
    pub verification_code: String,
    pub verified: bool,
    pub created_at: OffsetDateTime,
}

/// Values needed to insert a pending user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub verification_code: String,
}
