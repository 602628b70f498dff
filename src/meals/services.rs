use tracing::info;

use super::dto::{
    CreateMealRequest, Difficulty, LeaderboardEntry, LeaderboardSort, Meal, NewMeal,
};
use super::repo;
use super::repo_types::MealRow;
use crate::battle::repo as roster_repo;
use crate::db::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn validate_new_meal(req: &CreateMealRequest) -> AppResult<NewMeal> {
    let name = req.meal.trim();
    let cuisine = req.cuisine.trim();
    let difficulty = req.difficulty.trim();
    let price = match req.price {
        Some(p) if !name.is_empty() && !cuisine.is_empty() && !difficulty.is_empty() => p,
        _ => {
            return Err(AppError::bad_request(
                "meal, cuisine, price and difficulty are required",
            ))
        }
    };
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::bad_request(format!(
            "Invalid price: {price}. Price must be a positive number."
        )));
    }
    let difficulty = difficulty
        .parse::<Difficulty>()
        .map_err(AppError::BadRequest)?;
    Ok(NewMeal {
        name: name.to_string(),
        cuisine: cuisine.to_string(),
        price,
        difficulty,
    })
}

/// Wins over battles as a percentage rounded to one decimal.
pub fn win_pct(wins: i64, battles: i64) -> f64 {
    if battles <= 0 {
        return 0.0;
    }
    (wins as f64 / battles as f64 * 1000.0).round() / 10.0
}

pub fn parse_sort(raw: Option<&str>) -> AppResult<LeaderboardSort> {
    match raw {
        None => Ok(LeaderboardSort::default()),
        Some(s) => s.parse().map_err(AppError::BadRequest),
    }
}

/// Rejects soft-deleted rows so callers only ever see live meals.
pub(crate) fn live_by_id(row: Option<MealRow>, id: i64) -> AppResult<MealRow> {
    match row {
        None => Err(AppError::not_found(format!("Meal with ID {id} not found"))),
        Some(r) if r.deleted => Err(AppError::not_found(format!(
            "Meal with ID {id} has been deleted"
        ))),
        Some(r) => Ok(r),
    }
}

pub async fn create_meal(state: &AppState, req: &CreateMealRequest) -> AppResult<Meal> {
    let new_meal = validate_new_meal(req)?;
    let row = repo::create(&state.db, &new_meal).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::bad_request(format!("Meal with name '{}' already exists", new_meal.name))
        } else {
            e.into()
        }
    })?;
    info!(meal_id = row.id, name = %row.name, "meal created");
    Ok(Meal::try_from(row)?)
}

pub async fn get_meal(state: &AppState, id: i64) -> AppResult<Meal> {
    let row = live_by_id(repo::find_by_id(&state.db, id).await?, id)?;
    Ok(Meal::try_from(row)?)
}

pub async fn get_meal_by_name(state: &AppState, name: &str) -> AppResult<Meal> {
    let row = match repo::find_by_name(&state.db, name).await? {
        None => {
            return Err(AppError::not_found(format!(
                "Meal with name {name} not found"
            )))
        }
        Some(r) if r.deleted => {
            return Err(AppError::not_found(format!(
                "Meal with name {name} has been deleted"
            )))
        }
        Some(r) => r,
    };
    Ok(Meal::try_from(row)?)
}

pub async fn delete_meal(state: &AppState, id: i64) -> AppResult<()> {
    let mut tx = state.db.begin().await?;
    // Roster before meal row, the same order a battle takes them in.
    roster_repo::lock_roster_tx(&mut tx).await?;
    live_by_id(repo::lock_meal_tx(&mut tx, id).await?, id)?;
    repo::soft_delete_tx(&mut tx, id).await?;
    tx.commit().await?;
    info!(meal_id = id, "meal deleted");
    Ok(())
}

pub async fn leaderboard(state: &AppState, sort: LeaderboardSort) -> AppResult<Vec<LeaderboardEntry>> {
    let rows = repo::leaderboard(&state.db, sort).await?;
    rows.into_iter()
        .map(|r| -> AppResult<LeaderboardEntry> {
            let meal = Meal::try_from(r)?;
            Ok(LeaderboardEntry {
                win_pct: win_pct(meal.wins, meal.battles),
                id: meal.id,
                meal: meal.name,
                cuisine: meal.cuisine,
                price: meal.price,
                difficulty: meal.difficulty,
                battles: meal.battles,
                wins: meal.wins,
            })
        })
        .collect()
}

pub async fn clear_meals(state: &AppState) -> AppResult<()> {
    repo::clear_all(&state.db).await?;
    info!("meal catalogue cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn request(meal: &str, cuisine: &str, price: Option<f64>, difficulty: &str) -> CreateMealRequest {
        CreateMealRequest {
            meal: meal.into(),
            cuisine: cuisine.into(),
            price,
            difficulty: difficulty.into(),
        }
    }

    fn row(id: i64, deleted: bool) -> MealRow {
        MealRow {
            id,
            name: "Spaghetti".into(),
            cuisine: "Italian".into(),
            price: 12.5,
            difficulty: "MED".into(),
            battles: 0,
            wins: 0,
            deleted,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn valid_meal_is_trimmed() {
        let m = validate_new_meal(&request(" Spaghetti ", "Italian", Some(12.5), "MED")).unwrap();
        assert_eq!(m.name, "Spaghetti");
        assert_eq!(m.difficulty, Difficulty::Med);
    }

    #[test]
    fn negative_price_rejected() {
        let err = validate_new_meal(&request("Spaghetti", "Italian", Some(-12.99), "MED"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid price: -12.99. Price must be a positive number."
        );
    }

    #[test]
    fn zero_price_rejected() {
        assert!(validate_new_meal(&request("Spaghetti", "Italian", Some(0.0), "MED")).is_err());
    }

    #[test]
    fn unknown_difficulty_rejected() {
        let err = validate_new_meal(&request("Spaghetti", "Italian", Some(9.0), "EASY"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid difficulty level: EASY. Must be 'LOW', 'MED', or 'HIGH'."
        );
    }

    #[test]
    fn missing_fields_rejected() {
        assert!(validate_new_meal(&request("", "Italian", Some(9.0), "LOW")).is_err());
        assert!(validate_new_meal(&request("Soup", "Italian", None, "LOW")).is_err());
    }

    #[test]
    fn win_pct_rounds_to_one_decimal() {
        assert_eq!(win_pct(2, 3), 66.7);
        assert_eq!(win_pct(1, 1), 100.0);
        assert_eq!(win_pct(0, 0), 0.0);
    }

    #[test]
    fn sort_defaults_to_wins() {
        assert_eq!(parse_sort(None).unwrap(), LeaderboardSort::Wins);
        assert_eq!(parse_sort(Some("win_pct")).unwrap(), LeaderboardSort::WinPct);
        let err = parse_sort(Some("losses")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid sort_by parameter: losses");
    }

    #[test]
    fn deleted_and_missing_meals_are_not_found() {
        let err = live_by_id(None, 999).unwrap_err();
        assert_eq!(err.to_string(), "Meal with ID 999 not found");
        let err = live_by_id(Some(row(1, true)), 1).unwrap_err();
        assert_eq!(err.to_string(), "Meal with ID 1 has been deleted");
        assert_eq!(live_by_id(Some(row(2, false)), 2).unwrap().id, 2);
    }
}
