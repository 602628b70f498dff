use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AccountCreatedResponse, AuthResponse, CredentialsRequest, MessageResponse,
            PublicUser, RefreshRequest, UpdatePasswordRequest,
        },
        extractors::AuthUser,
        password::{hash_password, verify_password},
        repo_types::User,
        services::{validate_credentials, validate_new_password, JwtKeys},
    },
    db::is_unique_violation,
    error::{AppError, AppJson, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/create-account", post(create_account))
        .route("/users/login", post(login))
        .route("/users/refresh", post(refresh))
        .route("/users/clear", delete(clear_users))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/update-password", post(update_password))
}

#[instrument(skip(state, payload))]
pub async fn create_account(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<AccountCreatedResponse>)> {
    let username = validate_credentials(&payload.username, &payload.password).map_err(|e| {
        warn!(error = %e, "rejected registration");
        e
    })?;

    let hash = hash_password(&payload.password)?;

    let user = match User::create(&state.db, &username, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(%username, "username already taken");
            return Err(AppError::bad_request(format!(
                "Username '{username}' is already taken"
            )));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AccountCreatedResponse {
            message: "Account created successfully",
            user_id: user.id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CredentialsRequest>,
) -> AppResult<Json<AuthResponse>> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }

    let user = match User::find_by_username(&state.db, username).await? {
        Some(u) => u,
        None => {
            warn!(%username, "login unknown username");
            return Err(AppError::unauthorized("Invalid username or password"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid username or password"));
    }

    User::touch_last_login(&state.db, user.id).await?;

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = keys.sign_pair(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful",
        user_id: user.id,
        username: user.username,
        access_token,
        refresh_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "rejected refresh token");
        AppError::unauthorized("Invalid or expired token")
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    let (access_token, refresh_token) = keys.sign_pair(user.id)?;
    Ok(Json(AuthResponse {
        message: "Token refreshed",
        user_id: user.id,
        username: user.username,
        access_token,
        refresh_token,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        error!(user_id = %user_id, "user not found");
        AppError::unauthorized("User not found")
    })?;

    Ok(Json(PublicUser {
        id: user.id,
        username: user.username,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::bad_request("All fields are required"));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(%user_id, "update password with wrong current password");
        return Err(AppError::bad_request("Current password is incorrect"));
    }
    validate_new_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user_id, &hash).await?;

    info!(%user_id, "password updated");
    Ok(Json(MessageResponse::success("Password updated successfully")))
}

#[instrument(skip(state))]
pub async fn clear_users(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    User::clear_all(&state.db).await?;
    info!("all users cleared");
    Ok(Json(MessageResponse::success("All users cleared")))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::router;

    async fn send(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let app = router().with_state(AppState::fake());
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_account_requires_credentials() {
        let (status, body) = send(post_json(
            "/users/create-account",
            serde_json::json!({ "username": "alice" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username and password are required");
    }

    #[tokio::test]
    async fn login_requires_credentials() {
        let (status, body) =
            send(post_json("/users/login", serde_json::json!({ "password": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username and password are required");
    }

    #[tokio::test]
    async fn me_requires_token() {
        let req = Request::builder().uri("/users/me").body(Body::empty()).unwrap();
        let (status, body) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing Authorization header");
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let access = keys.sign_access(uuid::Uuid::new_v4()).unwrap();
        let (status, body) = send(post_json(
            "/users/refresh",
            serde_json::json!({ "refresh_token": access }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn refresh_hides_token_decoding_errors() {
        let (status, body) = send(post_json(
            "/users/refresh",
            serde_json::json!({ "refresh_token": "not.a.jwt" }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            username: "alice".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("alice"));
        assert!(json.contains("id"));
    }
}
