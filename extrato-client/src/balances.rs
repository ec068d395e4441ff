//! Current-balance endpoint.

use serde_json::Value;

use extrato_core::{AccountRef, BalanceSnapshot};

use crate::client::{json_f64, ApiClient};
use crate::error::ApiResult;

impl ApiClient {
    /// Fetch the account's current balance. Callers treat a failure here as
    /// non-fatal: the statement still renders, with unknown balances.
    pub async fn fetch_balance(&mut self, account: &AccountRef) -> ApiResult<BalanceSnapshot> {
        let url = format!(
            "{}/banks/{}/balances/{}",
            self.endpoints().api_base,
            self.endpoints().bank_id,
            account.statement_id()
        );
        let body = self.get_json(&url, &[]).await?;
        Ok(parse_balance(&body))
    }
}

/// Missing fields default to zero, matching how the provider omits the
/// blocked/invested figures on accounts that never had them.
fn parse_balance(body: &Value) -> BalanceSnapshot {
    BalanceSnapshot {
        available: json_f64(body, "availableAmount").unwrap_or(0.0),
        blocked: json_f64(body, "blockedAmount").unwrap_or(0.0),
        auto_invested: json_f64(body, "automaticallyInvestedAmount").unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_balance_full() {
        let body = json!({
            "availableAmount": 488571.24,
            "blockedAmount": "1000.00",
            "automaticallyInvestedAmount": 0
        });
        let snap = parse_balance(&body);
        assert_eq!(snap.available, 488571.24);
        assert_eq!(snap.blocked, 1000.0);
        assert_eq!(snap.gross(), 489571.24);
    }

    #[test]
    fn test_parse_balance_missing_fields_default_to_zero() {
        let snap = parse_balance(&json!({"availableAmount": 10.0}));
        assert_eq!(snap.blocked, 0.0);
        assert_eq!(snap.auto_invested, 0.0);
    }
}
