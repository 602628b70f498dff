use serde::{Deserialize, Serialize};

use crate::meals::dto::Meal;

#[derive(Debug, Deserialize)]
pub struct PrepRequest {
    #[serde(default)]
    pub meal: String,
}

#[derive(Debug, Serialize)]
pub struct RosterView {
    pub status: &'static str,
    pub combatants: Vec<Meal>,
}

#[derive(Debug, Serialize)]
pub struct BattleResult {
    pub status: &'static str,
    pub winner: String,
}
