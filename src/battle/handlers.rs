use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{BattleResult, PrepRequest, RosterView};
use super::services;
use crate::{
    auth::MessageResponse,
    error::{AppJson, AppResult},
    state::AppState,
};

pub fn battle_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/combatants",
            post(prep_combatant)
                .get(get_combatants)
                .delete(clear_combatants),
        )
        .route("/api/battle", post(battle))
}

#[instrument(skip(state))]
pub async fn prep_combatant(
    State(state): State<AppState>,
    AppJson(req): AppJson<PrepRequest>,
) -> AppResult<Json<RosterView>> {
    let combatants = services::prep_combatant(&state, &req.meal).await?;
    Ok(Json(RosterView {
        status: "success",
        combatants,
    }))
}

#[instrument(skip(state))]
pub async fn get_combatants(State(state): State<AppState>) -> AppResult<Json<RosterView>> {
    let combatants = services::combatants(&state).await?;
    Ok(Json(RosterView {
        status: "success",
        combatants,
    }))
}

#[instrument(skip(state))]
pub async fn clear_combatants(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    services::clear_combatants(&state).await?;
    Ok(Json(MessageResponse::success("Combatants cleared")))
}

#[instrument(skip(state))]
pub async fn battle(State(state): State<AppState>) -> AppResult<Json<BattleResult>> {
    let winner = services::battle(&state).await?;
    Ok(Json(BattleResult {
        status: "success",
        winner,
    }))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn prep_without_meal_is_400() {
        let app = battle_routes().with_state(AppState::fake());
        let req = Request::builder()
            .method("POST")
            .uri("/api/combatants")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "meal is required");
    }
}
