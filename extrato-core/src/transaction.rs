use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Credit/debit marker as the provider reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditDebit {
    #[serde(rename = "CREDITO")]
    Credit,
    #[serde(rename = "DEBITO")]
    Debit,
}

/// One statement record as returned by the provider, before reconciliation.
///
/// `amount` is an unsigned magnitude; the sign lives in `kind`. Records are
/// validated at the parse boundary and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub document_number: String,
    pub amount: f64,
    pub kind: CreditDebit,
    pub provider_id: String,
}

impl RawTransaction {
    /// Amount with the sign normalized: debits negative, credits positive,
    /// regardless of the sign the provider put on `amount`.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            CreditDebit::Debit => -self.amount.abs(),
            CreditDebit::Credit => self.amount.abs(),
        }
    }
}

/// Requested statement date range (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
}
