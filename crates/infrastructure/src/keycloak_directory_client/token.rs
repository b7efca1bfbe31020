use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

/// Remaining validity below which a cached token is replaced.
const REFRESH_MARGIN_SECS: i64 = 30;

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) expires_in: i64,
}

/// Admin API bearer token with its expiry.
#[derive(Debug, Clone)]
pub(super) struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub(super) fn issued(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            expires_at: now + TimeDelta::seconds(response.expires_in.max(0)),
        }
    }

    pub(super) fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    pub(super) fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > TimeDelta::seconds(REFRESH_MARGIN_SECS)
    }
}
