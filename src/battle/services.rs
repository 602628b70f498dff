use tracing::{debug, info};

use super::repo;
use crate::error::{AppError, AppResult};
use crate::meals::dto::{Difficulty, Meal};
use crate::meals::repo as meals_repo;
use crate::meals::services::{get_meal_by_name, live_by_id};
use crate::state::AppState;

/// Roster capacity.
pub const MAX_COMBATANTS: usize = 2;

fn difficulty_modifier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::High => 1.0,
        Difficulty::Med => 2.0,
        Difficulty::Low => 3.0,
    }
}

/// `price × len(cuisine) − modifier`, where harder meals lose less.
pub fn battle_score(price: f64, cuisine: &str, difficulty: Difficulty) -> f64 {
    price * cuisine.chars().count() as f64 - difficulty_modifier(difficulty)
}

/// True when the first combatant wins against a uniform draw in `[0, 1)`.
pub fn first_wins(score_1: f64, score_2: f64, draw: f64) -> bool {
    let delta = (score_1 - score_2).abs() / 100.0;
    delta > draw
}

pub async fn prep_combatant(state: &AppState, name: &str) -> AppResult<Vec<Meal>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("meal is required"));
    }
    let meal = get_meal_by_name(state, name).await?;

    let mut tx = state.db.begin().await?;
    repo::lock_roster_tx(&mut tx).await?;
    live_by_id(meals_repo::lock_meal_tx(&mut tx, meal.id).await?, meal.id)?;
    let staged = repo::staged_tx(&mut tx).await?;
    if staged.len() >= MAX_COMBATANTS {
        return Err(AppError::bad_request(
            "Combatant list is full, cannot add more combatants.",
        ));
    }
    if staged.iter().any(|m| m.id == meal.id) {
        return Err(AppError::bad_request(format!(
            "Meal '{}' is already a combatant",
            meal.name
        )));
    }
    repo::stage_tx(&mut tx, meal.id).await?;
    let roster = repo::staged_tx(&mut tx).await?;
    tx.commit().await?;

    info!(meal_id = meal.id, name = %meal.name, "combatant staged");
    roster
        .into_iter()
        .map(|r| Meal::try_from(r).map_err(AppError::from))
        .collect()
}

pub async fn combatants(state: &AppState) -> AppResult<Vec<Meal>> {
    repo::staged(&state.db)
        .await?
        .into_iter()
        .map(|r| Meal::try_from(r).map_err(AppError::from))
        .collect()
}

pub async fn clear_combatants(state: &AppState) -> AppResult<()> {
    repo::clear(&state.db).await?;
    info!("combatants cleared");
    Ok(())
}

/// Runs one battle and returns the winner's name.
pub async fn battle(state: &AppState) -> AppResult<String> {
    let mut tx = state.db.begin().await?;
    repo::lock_roster_tx(&mut tx).await?;
    let staged = repo::staged_tx(&mut tx).await?;
    let [first, second]: [Meal; 2] = match staged.len() {
        MAX_COMBATANTS => {
            let meals = staged
                .into_iter()
                .map(Meal::try_from)
                .collect::<anyhow::Result<Vec<_>>>()?;
            meals
                .try_into()
                .map_err(|_| anyhow::anyhow!("roster changed under lock"))?
        }
        _ => {
            return Err(AppError::bad_request(
                "Two combatants must be prepped for a battle.",
            ))
        }
    };

    let score_1 = battle_score(first.price, &first.cuisine, first.difficulty);
    let score_2 = battle_score(second.price, &second.cuisine, second.difficulty);
    let draw: f64 = rand::random();
    debug!(score_1, score_2, draw, "battle scores");

    let (winner, loser) = if first_wins(score_1, score_2, draw) {
        (first, second)
    } else {
        (second, first)
    };

    meals_repo::record_battle_result_tx(&mut tx, winner.id, true).await?;
    meals_repo::record_battle_result_tx(&mut tx, loser.id, false).await?;
    repo::evict_tx(&mut tx, loser.id).await?;
    tx.commit().await?;

    info!(winner = %winner.name, loser = %loser.name, "battle finished");
    Ok(winner.name)
}
