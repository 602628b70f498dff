use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::{db, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(healthcheck))
        .route("/api/db-check", get(db_check))
}

pub async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Connectivity plus presence of every required table.
#[instrument(skip(state))]
pub async fn db_check(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let probe = async {
        db::check_connection(&state.db).await?;
        db::check_tables_exist(&state.db).await
    };
    match probe.await {
        Ok(()) => Ok(Json(json!({ "database_status": "healthy" }))),
        Err(e) => {
            error!(error = ?e, "database check failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}
