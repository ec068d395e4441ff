//! Account listing with envelope tolerance.
//!
//! The provider has shipped at least four response envelopes for the same
//! endpoint across API versions. Extraction is an ordered strategy chain:
//! each extractor either yields the account array or passes; the first match
//! wins, and no match is a schema error (degraded to zero results upstream).

use serde_json::Value;
use tracing::{debug, warn};

use extrato_core::AccountRef;

use crate::client::{json_string, ApiClient};
use crate::error::{ApiError, ApiResult};

const ACCOUNTS_PAGE_LIMIT: usize = 50;

impl ApiClient {
    /// List the fund's bank accounts. A 401/403 surfaces as
    /// `ApiError::Auth` so the orchestrator can substitute its configured
    /// known-accounts table.
    pub async fn list_accounts(&mut self) -> ApiResult<Vec<AccountRef>> {
        let url = format!(
            "{}/banks/{}/accounts",
            self.endpoints().api_base,
            self.endpoints().bank_id
        );
        let query = [
            ("_offset", "1".to_string()),
            ("_limit", ACCOUNTS_PAGE_LIMIT.to_string()),
        ];

        let body = self.get_json(&url, &query).await?;
        let raw = extract_accounts(&body)?;

        let mut accounts = Vec::with_capacity(raw.len());
        for value in raw {
            match parse_account(value) {
                Some(account) => accounts.push(account),
                None => warn!(record = %value, "account record missing branch or number, skipped"),
            }
        }
        Ok(accounts)
    }
}

/// The ordered extractor chain over the known envelopes.
fn extract_accounts(body: &Value) -> ApiResult<&Vec<Value>> {
    let extractors: [(&str, fn(&Value) -> Option<&Vec<Value>>); 4] = [
        ("data.accounts", |v| {
            v.get("data")?.get("accounts")?.as_array()
        }),
        ("data", |v| v.get("data")?.as_array()),
        ("_content", |v| v.get("_content")?.as_array()),
        ("accounts", |v| v.get("accounts")?.as_array()),
    ];

    for (name, extract) in extractors {
        if let Some(accounts) = extract(body) {
            debug!(envelope = name, count = accounts.len(), "accounts extracted");
            return Ok(accounts);
        }
    }

    let keys = body
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    Err(ApiError::UnexpectedSchema { keys })
}

/// Field aliases vary with the envelope: `branchCode`/`agencyCode` and
/// `number`/`accountNumber`.
fn parse_account(value: &Value) -> Option<AccountRef> {
    let branch = json_string(value, "branchCode").or_else(|| json_string(value, "agencyCode"))?;
    let number = json_string(value, "number").or_else(|| json_string(value, "accountNumber"))?;
    Some(AccountRef::new(branch, number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_data_accounts() {
        let body = json!({"data": {"accounts": [{"branchCode": "2271", "number": "130137784"}]}});
        let accounts = extract_accounts(&body).unwrap();
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn test_envelope_data_as_array() {
        let body = json!({"data": [{"branchCode": "1", "number": "2"}, {"branchCode": "3", "number": "4"}]});
        assert_eq!(extract_accounts(&body).unwrap().len(), 2);
    }

    #[test]
    fn test_envelope_content() {
        let body = json!({"_content": [{"agencyCode": "2271", "accountNumber": "130176356"}]});
        let accounts = extract_accounts(&body).unwrap();
        assert_eq!(
            parse_account(&accounts[0]),
            Some(AccountRef::new("2271", "130176356"))
        );
    }

    #[test]
    fn test_envelope_accounts_direct() {
        let body = json!({"accounts": [{"branchCode": "9", "number": "8"}]});
        assert_eq!(extract_accounts(&body).unwrap().len(), 1);
    }

    #[test]
    fn test_chain_order_prefers_nested_data() {
        // Both shapes present: the first extractor in the chain must win.
        let body = json!({
            "data": {"accounts": [{"branchCode": "1", "number": "1"}]},
            "accounts": [{"branchCode": "2", "number": "2"}, {"branchCode": "3", "number": "3"}]
        });
        assert_eq!(extract_accounts(&body).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_envelope_is_a_schema_error() {
        let body = json!({"results": [], "meta": {}});
        match extract_accounts(&body) {
            Err(ApiError::UnexpectedSchema { keys }) => {
                assert!(keys.contains(&"results".to_string()));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_account_numeric_fields() {
        let value = json!({"branchCode": 2271, "number": 130137784});
        assert_eq!(
            parse_account(&value),
            Some(AccountRef::new("2271", "130137784"))
        );
    }

    #[test]
    fn test_parse_account_missing_number() {
        let value = json!({"branchCode": "2271"});
        assert_eq!(parse_account(&value), None);
    }
}
