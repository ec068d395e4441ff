//! extrato-core: domain types and the ledger builder for bank statement syncs.

pub mod account;
pub mod balance;
pub mod ledger;
pub mod money;
pub mod transaction;

pub use account::AccountRef;
pub use balance::BalanceSnapshot;
pub use ledger::{build_report, LedgerEntry, ReconciliationMismatch, StatementReport};
pub use money::{format_brl, round_cents};
pub use transaction::{CreditDebit, Period, RawTransaction};
