use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Exercise logged by a user, tagged with the muscle group it trains.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub muscle_group: String, // capitalized, e.g. "Chest"
    pub sets: i32,
    pub reps: i32,
    pub weight_kg: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
