use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

use crate::meals::repo_types::MealRow;

const STAGED_MEALS: &str = r#"
    SELECT m.id, m.name, m.cuisine, m.price, m.difficulty,
           m.battles, m.wins, m.deleted, m.created_at
      FROM combatants c
      JOIN meals m ON m.id = c.meal_id
     ORDER BY c.staged_at ASC, c.meal_id ASC
"#;

/// Serialises roster changes; held until the transaction ends.
pub async fn lock_roster_tx(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
    sqlx::query(r#"LOCK TABLE combatants IN EXCLUSIVE MODE"#)
        .execute(&mut **tx)
        .await
        .context("lock combatants")?;
    Ok(())
}

pub async fn staged_tx(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<Vec<MealRow>> {
    let rows = sqlx::query_as::<_, MealRow>(STAGED_MEALS)
        .fetch_all(&mut **tx)
        .await
        .context("list staged combatants")?;
    Ok(rows)
}

pub async fn staged(db: &PgPool) -> anyhow::Result<Vec<MealRow>> {
    let rows = sqlx::query_as::<_, MealRow>(STAGED_MEALS)
        .fetch_all(db)
        .await
        .context("list staged combatants")?;
    Ok(rows)
}

pub async fn stage_tx(tx: &mut Transaction<'_, Postgres>, meal_id: i64) -> anyhow::Result<()> {
    sqlx::query(r#"INSERT INTO combatants (meal_id) VALUES ($1)"#)
        .bind(meal_id)
        .execute(&mut **tx)
        .await
        .context("stage combatant")?;
    Ok(())
}

pub async fn evict_tx(tx: &mut Transaction<'_, Postgres>, meal_id: i64) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM combatants WHERE meal_id = $1"#)
        .bind(meal_id)
        .execute(&mut **tx)
        .await
        .context("evict combatant")?;
    Ok(())
}

pub async fn clear(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM combatants"#)
        .execute(db)
        .await
        .context("clear combatants")?;
    Ok(())
}
