use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Access tokens authorise API calls; refresh tokens only mint new pairs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    /// Claims for `user_id` valid for `ttl` from now.
    pub fn issue(
        user_id: Uuid,
        kind: TokenKind,
        issuer: &str,
        audience: &str,
        ttl: Duration,
    ) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            sub: user_id,
            iat: now,
            exp: now.saturating_add(ttl.as_secs() as i64),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            kind,
        }
    }

    pub fn is_access(&self) -> bool {
        self.kind == TokenKind::Access
    }
}
