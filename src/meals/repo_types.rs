use sqlx::FromRow;
use time::OffsetDateTime;

/// Meal row as stored; `difficulty` is constrained to LOW/MED/HIGH by the schema.
#[derive(Debug, Clone, FromRow)]
pub struct MealRow {
    pub id: i64,
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: String,
    pub battles: i64,
    pub wins: i64,
    pub deleted: bool,
    pub created_at: OffsetDateTime,
}
