use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::services::JwtKeys;
use crate::error::AppError;

/// Extracts and validates a bearer access token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header"))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(AppError::unauthorized("Invalid or expired token"));
            }
        };

        if !claims.is_access() {
            return Err(AppError::unauthorized("Access token required"));
        }

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;
    use crate::state::AppState;

    async fn extract(header: Option<String>) -> Result<Uuid, AppError> {
        let state = AppState::fake();
        let mut builder = Request::builder().uri("/api/portfolio");
        if let Some(h) = header {
            builder = builder.header("authorization", h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|AuthUser(id)| id)
    }

    #[tokio::test]
    async fn accepts_access_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id).unwrap();
        assert_eq!(extract(Some(format!("Bearer {token}"))).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing Authorization header");
    }

    #[tokio::test]
    async fn rejects_refresh_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let token = keys.sign_refresh(Uuid::new_v4()).unwrap();
        let err = extract(Some(format!("Bearer {token}"))).await.unwrap_err();
        assert_eq!(err.to_string(), "Access token required");
    }

    #[tokio::test]
    async fn rejects_garbage_token() {
        let err = extract(Some("Bearer not.a.jwt".into())).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired token");
        let err = extract(Some("Basic abc".into())).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid Authorization header");
    }
}
