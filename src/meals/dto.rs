use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::meals::repo_types::MealRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Low,
    Med,
    High,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Low => "LOW",
            Difficulty::Med => "MED",
            Difficulty::High => "HIGH",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Difficulty::Low),
            "MED" => Ok(Difficulty::Med),
            "HIGH" => Ok(Difficulty::High),
            other => Err(format!(
                "Invalid difficulty level: {other}. Must be 'LOW', 'MED', or 'HIGH'."
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Meal {
    pub id: i64,
    #[serde(rename = "meal")]
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
    pub battles: i64,
    pub wins: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<MealRow> for Meal {
    type Error = anyhow::Error;

    fn try_from(r: MealRow) -> Result<Self, Self::Error> {
        Ok(Self {
            difficulty: r.difficulty.parse().map_err(anyhow::Error::msg)?,
            id: r.id,
            name: r.name,
            cuisine: r.cuisine,
            price: r.price,
            battles: r.battles,
            wins: r.wins,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    #[serde(default)]
    pub meal: String,
    #[serde(default)]
    pub cuisine: String,
    pub price: Option<f64>,
    #[serde(default)]
    pub difficulty: String,
}

/// Validated input for a new meal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeal {
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardSort {
    #[default]
    Wins,
    WinPct,
}

impl FromStr for LeaderboardSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wins" => Ok(LeaderboardSort::Wins),
            "win_pct" => Ok(LeaderboardSort::WinPct),
            other => Err(format!("Invalid sort_by parameter: {other}")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub meal: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
    pub battles: i64,
    pub wins: i64,
    /// Percentage, one decimal place.
    pub win_pct: f64,
}
