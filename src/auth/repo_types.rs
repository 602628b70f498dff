use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                            // unique user ID
    pub username: String,                    // unique login name
    #[serde(skip_serializing)]
    pub password_hash: String,               // Argon2 PHC string, salt embedded
    pub created_at: OffsetDateTime,          // creation timestamp
    pub last_login: Option<OffsetDateTime>,  // set on every successful login
}
