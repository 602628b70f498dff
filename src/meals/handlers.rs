use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::dto::{CreateMealRequest, LeaderboardQuery};
use super::services;
use crate::{
    auth::MessageResponse,
    error::{AppJson, AppResult},
    state::AppState,
};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/api/meals", post(create_meal))
        .route("/api/meals/clear", delete(clear_meals))
        .route("/api/meals/by-name/:name", get(get_meal_by_name))
        .route("/api/meals/:id", get(get_meal).delete(delete_meal))
        .route("/api/leaderboard", get(get_leaderboard))
}

#[instrument(skip(state))]
pub async fn create_meal(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateMealRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let meal = services::create_meal(&state, &req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "meal": meal })),
    ))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let meal = services::get_meal(&state, id).await?;
    Ok(Json(json!({ "status": "success", "meal": meal })))
}

#[instrument(skip(state))]
pub async fn get_meal_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Value>> {
    let meal = services::get_meal_by_name(&state, &name).await?;
    Ok(Json(json!({ "status": "success", "meal": meal })))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_meal(&state, id).await?;
    Ok(Json(MessageResponse::success(format!("Meal {id} deleted"))))
}

#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(q): Query<LeaderboardQuery>,
) -> AppResult<Json<Value>> {
    let sort = services::parse_sort(q.sort.as_deref())?;
    let leaderboard = services::leaderboard(&state, sort).await?;
    Ok(Json(json!({ "status": "success", "leaderboard": leaderboard })))
}

#[instrument(skip(state))]
pub async fn clear_meals(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    services::clear_meals(&state).await?;
    Ok(Json(MessageResponse::success("All meals cleared")))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;

    async fn send(req: Request<Body>) -> (StatusCode, Value) {
        let app = meal_routes().with_state(AppState::fake());
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn invalid_meal_rejected_before_db() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/meals")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"meal":"Spaghetti","cuisine":"Italian","price":-12.99,"difficulty":"MED"}"#,
            ))
            .unwrap();
        let (status, body) = send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid price: -12.99. Price must be a positive number."
        );
    }

    #[tokio::test]
    async fn leaderboard_rejects_unknown_sort() {
        let req = Request::builder()
            .uri("/api/leaderboard?sort=losses")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid sort_by parameter: losses");
    }
}
