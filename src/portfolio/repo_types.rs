use rust_decimal::Decimal;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A user's position in one symbol.
#[derive(Debug, Clone, FromRow)]
pub struct Holding {
    pub user_id: Uuid,
    pub symbol: String,
    pub quantity: i64,
    pub average_price: Decimal,
    pub updated_at: OffsetDateTime,
}

/// Append-only trade record.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub user_id: Uuid,
    pub symbol: String,
    pub quantity: i64,
    pub price: Decimal,
    pub transaction_type: String,
    pub created_at: OffsetDateTime,
}
