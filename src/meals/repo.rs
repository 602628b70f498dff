use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

use super::dto::{LeaderboardSort, NewMeal};
use super::repo_types::MealRow;

const MEAL_COLUMNS: &str =
    "id, name, cuisine, price, difficulty, battles, wins, deleted, created_at";

pub async fn create(db: &PgPool, meal: &NewMeal) -> Result<MealRow, sqlx::Error> {
    sqlx::query_as::<_, MealRow>(&format!(
        r#"
        INSERT INTO meals (name, cuisine, price, difficulty)
        VALUES ($1, $2, $3, $4)
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(&meal.name)
    .bind(&meal.cuisine)
    .bind(meal.price)
    .bind(meal.difficulty.as_str())
    .fetch_one(db)
    .await
}

/// Looks a meal up by id, including soft-deleted rows.
pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<MealRow>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find meal by id")?;
    Ok(row)
}

pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<MealRow>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE name = $1"
    ))
    .bind(name)
    .fetch_optional(db)
    .await
    .context("find meal by name")?;
    Ok(row)
}

/// Locks the meal row; `None` when the id is unknown.
pub async fn lock_meal_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> anyhow::Result<Option<MealRow>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock meal")?;
    Ok(row)
}

/// Marks the meal deleted and takes it off the battle roster.
pub async fn soft_delete_tx(tx: &mut Transaction<'_, Postgres>, id: i64) -> anyhow::Result<()> {
    sqlx::query(r#"UPDATE meals SET deleted = TRUE WHERE id = $1"#)
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("soft delete meal")?;
    sqlx::query(r#"DELETE FROM combatants WHERE meal_id = $1"#)
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("unstage deleted meal")?;
    Ok(())
}

pub async fn record_battle_result_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    won: bool,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE meals
           SET battles = battles + 1,
               wins = wins + CASE WHEN $2 THEN 1 ELSE 0 END
         WHERE id = $1 AND NOT deleted
        "#,
    )
    .bind(id)
    .bind(won)
    .execute(&mut **tx)
    .await
    .context("update meal stats")?;
    Ok(())
}

pub async fn leaderboard(db: &PgPool, sort: LeaderboardSort) -> anyhow::Result<Vec<MealRow>> {
    let order = match sort {
        LeaderboardSort::Wins => "wins DESC, id ASC",
        LeaderboardSort::WinPct => "(wins::float8 / battles) DESC, wins DESC, id ASC",
    };
    let rows = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
          FROM meals
         WHERE NOT deleted AND battles > 0
         ORDER BY {order}
        "#
    ))
    .fetch_all(db)
    .await
    .context("load leaderboard")?;
    Ok(rows)
}

/// Removes every meal and the roster, restarting ids at 1.
pub async fn clear_all(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(r#"TRUNCATE combatants, meals RESTART IDENTITY"#)
        .execute(db)
        .await
        .context("truncate meals")?;
    Ok(())
}
