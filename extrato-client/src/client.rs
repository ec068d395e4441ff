//! HTTP client construction and the shared authenticated-GET plumbing.

use std::fs;
use std::time::Duration;

use reqwest::{Identity, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::{Credential, TokenManager};
use crate::error::{ApiError, ApiResult};

/// Every request gets this long before it is treated as failed; there is no
/// unlimited retry loop on top.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Provider base URLs and bank id. Overridable from config for sandboxes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub auth_base: String,
    pub api_base: String,
    pub bank_id: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_base: "https://trust-open.api.santander.com.br/auth".to_string(),
            api_base: "https://trust-open.api.santander.com.br/bank_account_information/v1"
                .to_string(),
            bank_id: "90400888000142".to_string(),
        }
    }
}

/// One fund's authenticated API client: mTLS identity, token manager and
/// endpoint set. Never shared across funds.
pub struct ApiClient {
    http: reqwest::Client,
    tokens: TokenManager,
    endpoints: Endpoints,
    app_key: String,
}

impl ApiClient {
    pub fn new(credential: Credential, endpoints: Endpoints) -> ApiResult<Self> {
        let identity = load_identity(&credential)?;
        let http = reqwest::Client::builder()
            .identity(identity)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let app_key = credential.client_id.clone();
        let tokens = TokenManager::new(http.clone(), endpoints.auth_base.clone(), credential);

        Ok(Self {
            http,
            tokens,
            endpoints,
            app_key,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut TokenManager {
        &mut self.tokens
    }

    /// Bearer-authenticated GET returning the parsed JSON body. 401/403 maps
    /// to `ApiError::Auth` so callers can apply their fallback policies.
    pub(crate) async fn get_json(&mut self, url: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let bearer = self.tokens.bearer().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(bearer)
            .header("X-Application-Key", &self.app_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth { status, body });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Provider { status, body });
        }

        Ok(response.json().await?)
    }
}

/// Build the mTLS identity from the configured cert/key PEM pair. The two
/// files are concatenated; rustls takes the combined bundle.
fn load_identity(credential: &Credential) -> ApiResult<Identity> {
    let mut pem = fs::read(&credential.cert_path)?;
    pem.extend_from_slice(&fs::read(&credential.key_path)?);
    Ok(Identity::from_pem(&pem)?)
}

/// Numeric field that some provider versions send as a JSON string.
pub(crate) fn json_f64(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String field that some provider versions send as a JSON number.
pub(crate) fn json_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_endpoints() {
        let e = Endpoints::default();
        assert!(e.auth_base.ends_with("/auth"));
        assert!(e.api_base.contains("bank_account_information"));
        assert_eq!(e.bank_id, "90400888000142");
    }

    #[test]
    fn test_json_f64_accepts_number_and_string() {
        let v = json!({"a": 12.5, "b": "488571.24", "c": true});
        assert_eq!(json_f64(&v, "a"), Some(12.5));
        assert_eq!(json_f64(&v, "b"), Some(488571.24));
        assert_eq!(json_f64(&v, "c"), None);
        assert_eq!(json_f64(&v, "missing"), None);
    }

    #[test]
    fn test_json_string_accepts_number() {
        let v = json!({"doc": 123456, "name": "PIX"});
        assert_eq!(json_string(&v, "doc"), Some("123456".to_string()));
        assert_eq!(json_string(&v, "name"), Some("PIX".to_string()));
    }
}
