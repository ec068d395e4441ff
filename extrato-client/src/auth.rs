//! OAuth2 client-credentials token lifecycle.
//!
//! One `TokenManager` per credential set; the cached token is replaced
//! wholesale on refresh, never patched. Nothing is persisted to disk.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Scope for account/balance/statement reads.
pub const SCOPE_STATEMENTS: &str = "open_banking_balances_statement";
/// Alternate spelling accepted by newer provider API versions; tried once
/// when the primary scope is rejected.
pub const SCOPE_STATEMENTS_ALT: &str =
    "account_information.balances.read account_information.transactions.read";

/// Tokens are considered expired this many seconds before the provider says
/// so, to keep an in-flight page request from racing the expiry.
const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;
/// Observed provider default when `expires_in` is missing.
const DEFAULT_EXPIRES_IN_SECS: i64 = 900;

/// One fund's credential set. Immutable after config load.
#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    /// Fund tax id; diagnostics only, never sent on requests.
    pub cnpj: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// A cached bearer token and the instant it stops being usable.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    scope: Option<String>,
}

/// Acquires and caches one bearer token per credential set.
pub struct TokenManager {
    http: reqwest::Client,
    auth_base: String,
    credential: Credential,
    cached: Option<Token>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, auth_base: impl Into<String>, credential: Credential) -> Self {
        Self {
            http,
            auth_base: auth_base.into(),
            credential,
            cached: None,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Drop the cached token so the next call performs a fresh exchange.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Return a valid bearer token, exchanging credentials when the cache is
    /// empty or expired. A rejected primary scope gets exactly one retry
    /// with the alternate scope; after that the failure propagates so the
    /// fund-level loop can move on.
    pub async fn bearer(&mut self) -> ApiResult<String> {
        if let Some(token) = &self.cached {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
        }

        let token = match self.exchange(SCOPE_STATEMENTS).await {
            Ok(token) => token,
            Err(ApiError::Auth { status, .. }) => {
                warn!(%status, "primary scope rejected, retrying with alternate scope");
                self.exchange(SCOPE_STATEMENTS_ALT).await?
            }
            Err(e) => return Err(e),
        };

        let bearer = token.access_token.clone();
        self.cached = Some(token);
        Ok(bearer)
    }

    async fn exchange(&self, scope: &str) -> ApiResult<Token> {
        let url = format!("{}/oauth/v2/token", self.auth_base);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.credential.client_id, Some(&self.credential.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", scope)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth { status, body });
        }

        let parsed: TokenResponse = response.json().await?;
        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        if let Some(granted) = &parsed.scope {
            debug!(%granted, requested = scope, "token granted");
        }

        Ok(Token {
            access_token: parsed.access_token,
            expires_at: Utc::now() + Duration::seconds(expires_in - TOKEN_SAFETY_MARGIN_SECS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_validity_window() {
        let now = Utc::now();
        let token = Token {
            access_token: "abc".to_string(),
            expires_at: now + Duration::seconds(840),
        };
        assert!(token.is_valid_at(now));
        assert!(token.is_valid_at(now + Duration::seconds(839)));
        assert!(!token.is_valid_at(now + Duration::seconds(840)));
        assert!(!token.is_valid_at(now + Duration::seconds(3600)));
    }
}
