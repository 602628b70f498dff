use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::TradeSide;
use super::repo_types::{Holding, TransactionRow};

pub async fn list_holdings(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Holding>> {
    let rows = sqlx::query_as::<_, Holding>(
        r#"
        SELECT user_id, symbol, quantity, average_price, updated_at
          FROM portfolio
         WHERE user_id = $1 AND quantity > 0
         ORDER BY symbol ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list holdings")?;
    Ok(rows)
}

/// Held quantity without taking a lock; zero when there is no row.
pub async fn held_quantity(db: &PgPool, user_id: Uuid, symbol: &str) -> anyhow::Result<i64> {
    let qty: Option<i64> = sqlx::query_scalar(
        r#"SELECT quantity FROM portfolio WHERE user_id = $1 AND symbol = $2"#,
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(db)
    .await
    .context("read held quantity")?;
    Ok(qty.unwrap_or(0))
}

/// Makes sure a row exists so the following `FOR UPDATE` always has something to lock.
pub async fn ensure_holding_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    symbol: &str,
    price: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO portfolio (user_id, symbol, quantity, average_price)
        VALUES ($1, $2, 0, $3)
        ON CONFLICT (user_id, symbol) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(symbol)
    .bind(price)
    .execute(&mut **tx)
    .await
    .context("ensure holding row")?;
    Ok(())
}

/// Locks the holding row for the rest of the transaction.
pub async fn lock_holding_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    symbol: &str,
) -> anyhow::Result<Option<(i64, Decimal)>> {
    let row = sqlx::query_as::<_, (i64, Decimal)>(
        r#"
        SELECT quantity, average_price
          FROM portfolio
         WHERE user_id = $1 AND symbol = $2
           FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(&mut **tx)
    .await
    .context("lock holding")?;
    Ok(row)
}

pub async fn update_holding_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    symbol: &str,
    quantity: i64,
    average_price: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE portfolio
           SET quantity = $3, average_price = $4, updated_at = now()
         WHERE user_id = $1 AND symbol = $2
        "#,
    )
    .bind(user_id)
    .bind(symbol)
    .bind(quantity)
    .bind(average_price)
    .execute(&mut **tx)
    .await
    .context("update holding")?;
    Ok(())
}

pub async fn delete_holding_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    symbol: &str,
) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM portfolio WHERE user_id = $1 AND symbol = $2"#)
        .bind(user_id)
        .bind(symbol)
        .execute(&mut **tx)
        .await
        .context("delete holding")?;
    Ok(())
}

/// Appends one trade record, returning its id and timestamp.
pub async fn insert_transaction_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    symbol: &str,
    quantity: i64,
    price: Decimal,
    side: TradeSide,
) -> anyhow::Result<(i64, OffsetDateTime)> {
    let row = sqlx::query_as::<_, (i64, OffsetDateTime)>(
        r#"
        INSERT INTO transactions (user_id, symbol, quantity, price, transaction_type)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, created_at
        "#,
    )
    .bind(user_id)
    .bind(symbol)
    .bind(quantity)
    .bind(price)
    .bind(side.as_str())
    .fetch_one(&mut **tx)
    .await
    .context("insert transaction")?;
    Ok(row)
}

pub async fn list_transactions(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<TransactionRow>> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        r#"
        SELECT id, user_id, symbol, quantity, price, transaction_type, created_at
          FROM transactions
         WHERE user_id = $1
         ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list transactions")?;
    Ok(rows)
}

/// Empties holdings and the transaction log.
pub async fn clear_all(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(r#"TRUNCATE portfolio, transactions RESTART IDENTITY"#)
        .execute(db)
        .await
        .context("truncate portfolio")?;
    Ok(())
}
