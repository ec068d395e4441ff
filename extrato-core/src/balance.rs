use serde::{Deserialize, Serialize};

/// Current balance as reported by the balance endpoint.
///
/// `available` is the figure the ledger reconciles against; the other two
/// only feed the balance-composition block of the rendered statement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub available: f64,
    pub blocked: f64,
    pub auto_invested: f64,
}

impl BalanceSnapshot {
    /// Gross account balance (available + blocked), line "A" of the
    /// statement's balance box.
    pub fn gross(&self) -> f64 {
        self.available + self.blocked
    }
}
