pub mod dto;
pub mod handlers;
pub(crate) mod repo;
pub(crate) mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::meal_routes())
}
