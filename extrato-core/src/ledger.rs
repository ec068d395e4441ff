//! Reconciled ledger construction.
//!
//! The provider returns statement pages in an unspecified order (observed:
//! reverse-chronological) and only ever exposes the *current* balance, never
//! a balance as of the start of an arbitrary range. The builder therefore
//! sorts, normalizes signs, derives the opening balance backwards from the
//! current one, and walks the sequence accumulating running balances.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::account::AccountRef;
use crate::balance::BalanceSnapshot;
use crate::money::round_cents;
use crate::transaction::{Period, RawTransaction};

/// Computed closing balance may drift from the reported one by at most this
/// much (currency units) before a mismatch warning is attached.
pub const RECONCILE_TOLERANCE: f64 = 0.01;

/// One reconciled statement line.
///
/// `running_balance` is `None` when the current balance could not be
/// retrieved; the entry sequence itself is still complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub txn: RawTransaction,
    pub signed_amount: f64,
    pub running_balance: Option<f64>,
}

/// Data-quality warning: the walked closing balance does not match the
/// balance the provider reported. The bank's numbers are ground truth, so
/// this is surfaced, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationMismatch {
    pub expected: f64,
    pub computed: f64,
}

impl ReconciliationMismatch {
    pub fn difference(&self) -> f64 {
        round_cents(self.computed - self.expected)
    }
}

/// The reconciled statement for one account and period. Built once per run,
/// handed to the renderers, then discarded; the rendered documents are the
/// persisted artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementReport {
    pub fund_name: String,
    pub account: AccountRef,
    pub period: Period,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    pub entries: Vec<LedgerEntry>,
    pub balance: Option<BalanceSnapshot>,
    pub reconciliation: Option<ReconciliationMismatch>,
    /// Records dropped because their provider id repeated an earlier one.
    pub duplicates_dropped: usize,
}

impl StatementReport {
    pub fn total_net(&self) -> f64 {
        round_cents(self.entries.iter().map(|e| e.signed_amount).sum())
    }
}

/// Build the reconciled ledger for one account.
///
/// Steps: drop duplicate provider ids (first occurrence wins), stable-sort
/// ascending by date (same-day order stays as the provider sent it — the
/// provider exposes no sub-day ordering), normalize signs, derive the
/// opening balance as `available - total_net`, then accumulate.
///
/// A missing `balance` never fails the build: statement completeness matters
/// more than balance display, so the report is produced with unknown
/// balances and the renderers show an explicit marker instead.
pub fn build_report(
    fund_name: impl Into<String>,
    account: AccountRef,
    period: Period,
    raw: Vec<RawTransaction>,
    balance: Option<BalanceSnapshot>,
) -> StatementReport {
    let mut seen = HashSet::new();
    let before = raw.len();
    let mut txns: Vec<RawTransaction> = raw
        .into_iter()
        .filter(|t| seen.insert(t.provider_id.clone()))
        .collect();
    let duplicates_dropped = before - txns.len();

    txns.sort_by_key(|t| t.date);

    let total_net: f64 = txns.iter().map(|t| t.signed_amount()).sum();
    let opening_balance = balance.map(|b| round_cents(b.available - total_net));

    let mut running = opening_balance;
    let entries: Vec<LedgerEntry> = txns
        .into_iter()
        .map(|txn| {
            let signed = txn.signed_amount();
            running = running.map(|r| round_cents(r + signed));
            LedgerEntry {
                txn,
                signed_amount: signed,
                running_balance: running,
            }
        })
        .collect();

    let closing_balance = match (running, opening_balance) {
        (Some(r), _) => Some(r),
        (None, opening) => opening,
    };

    let reconciliation = match (closing_balance, balance) {
        (Some(computed), Some(b)) if (computed - b.available).abs() > RECONCILE_TOLERANCE => {
            Some(ReconciliationMismatch {
                expected: b.available,
                computed,
            })
        }
        _ => None,
    };

    StatementReport {
        fund_name: fund_name.into(),
        account,
        period,
        opening_balance,
        closing_balance,
        entries,
        balance,
        reconciliation,
        duplicates_dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::CreditDebit;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn txn(id: &str, date: NaiveDate, amount: f64, kind: CreditDebit) -> RawTransaction {
        RawTransaction {
            date,
            description: format!("txn {id}"),
            document_number: String::new(),
            amount,
            kind,
            provider_id: id.to_string(),
        }
    }

    fn period() -> Period {
        Period {
            from: day(11),
            to: day(18),
        }
    }

    fn snapshot(available: f64) -> BalanceSnapshot {
        BalanceSnapshot {
            available,
            blocked: 0.0,
            auto_invested: 0.0,
        }
    }

    /// Worked example from a real statement: opening 57.365,08, five
    /// transactions, closing 49.369.604,96.
    #[test]
    fn test_running_balance_matches_bank_statement() {
        let raw = vec![
            txn("1", day(18), 5.25, CreditDebit::Debit),
            txn("2", day(18), 7.20, CreditDebit::Debit),
            txn("3", day(18), 127.80, CreditDebit::Debit),
            txn("4", day(18), 385714.00, CreditDebit::Credit),
            txn("5", day(18), 48926666.13, CreditDebit::Credit),
        ];
        let report = build_report(
            "MAKENA",
            AccountRef::new("2271", "130107983"),
            period(),
            raw,
            Some(snapshot(49369604.96)),
        );

        assert_eq!(report.opening_balance, Some(57365.08));
        let balances: Vec<f64> = report
            .entries
            .iter()
            .map(|e| e.running_balance.unwrap())
            .collect();
        assert_eq!(
            balances,
            vec![57359.83, 57352.63, 57224.83, 442938.83, 49369604.96]
        );
        assert_eq!(report.closing_balance, Some(49369604.96));
        assert!(report.reconciliation.is_none());
    }

    #[test]
    fn test_step_invariant_holds_for_every_entry() {
        let raw = vec![
            txn("a", day(12), 100.10, CreditDebit::Credit),
            txn("b", day(13), 0.33, CreditDebit::Debit),
            txn("c", day(14), 7777.77, CreditDebit::Credit),
            txn("d", day(14), 12.00, CreditDebit::Debit),
        ];
        let report = build_report(
            "F",
            AccountRef::new("1", "2"),
            period(),
            raw,
            Some(snapshot(12345.67)),
        );

        let mut prev = report.opening_balance.unwrap();
        for e in &report.entries {
            let expected = round_cents(prev + e.signed_amount);
            assert_eq!(e.running_balance, Some(expected));
            prev = expected;
        }
        assert_eq!(report.closing_balance, Some(prev));
    }

    #[test]
    fn test_sorts_ascending_and_keeps_same_day_provider_order() {
        // Provider sends reverse-chronological; same-day relative order must
        // survive the sort untouched.
        let raw = vec![
            txn("x", day(18), 1.0, CreditDebit::Credit),
            txn("y", day(18), 2.0, CreditDebit::Credit),
            txn("z", day(11), 3.0, CreditDebit::Credit),
        ];
        let report = build_report("F", AccountRef::new("1", "2"), period(), raw, None);

        let ids: Vec<&str> = report
            .entries
            .iter()
            .map(|e| e.txn.provider_id.as_str())
            .collect();
        assert_eq!(ids, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_duplicate_provider_ids_are_dropped() {
        let raw = vec![
            txn("1", day(12), 10.0, CreditDebit::Credit),
            txn("1", day(12), 10.0, CreditDebit::Credit),
            txn("2", day(13), 5.0, CreditDebit::Debit),
        ];
        let report = build_report(
            "F",
            AccountRef::new("1", "2"),
            period(),
            raw,
            Some(snapshot(105.0)),
        );

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.duplicates_dropped, 1);
        assert_eq!(report.opening_balance, Some(100.0));
        assert_eq!(report.closing_balance, Some(105.0));
    }

    #[test]
    fn test_empty_period_collapses_to_reported_balance() {
        let report = build_report(
            "F",
            AccountRef::new("1", "2"),
            period(),
            vec![],
            Some(snapshot(488571.24)),
        );

        assert!(report.entries.is_empty());
        assert_eq!(report.opening_balance, Some(488571.24));
        assert_eq!(report.closing_balance, Some(488571.24));
        assert!(report.reconciliation.is_none());
    }

    #[test]
    fn test_unknown_balance_still_builds_a_complete_ledger() {
        let raw = vec![
            txn("1", day(12), 10.0, CreditDebit::Credit),
            txn("2", day(13), 4.0, CreditDebit::Debit),
        ];
        let report = build_report("F", AccountRef::new("1", "2"), period(), raw, None);

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.opening_balance, None);
        assert_eq!(report.closing_balance, None);
        assert!(report.entries.iter().all(|e| e.running_balance.is_none()));
        // Sign normalization is independent of balance availability.
        assert_eq!(report.entries[1].signed_amount, -4.0);
    }

    #[test]
    fn test_total_net_sums_signed_amounts() {
        let raw = vec![
            txn("1", day(12), 10.0, CreditDebit::Credit),
            txn("2", day(13), 4.0, CreditDebit::Debit),
        ];
        let report = build_report("F", AccountRef::new("1", "2"), period(), raw, None);
        assert_eq!(report.total_net(), 6.0);
    }
}
