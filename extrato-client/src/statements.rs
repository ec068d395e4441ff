//! Paginated statement fetching.
//!
//! The provider paginates with `_offset`/`_limit` where the offset counts
//! records, not pages, and signals continuation with a `_links.next` entry.
//! `PageCursor` holds the pure state machine so the termination rules are
//! testable without HTTP; `fetch_statement` drives it against the API.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use extrato_core::{AccountRef, CreditDebit, Period, RawTransaction};

use crate::client::{json_f64, json_string, ApiClient};
use crate::error::{ApiError, ApiResult};

/// Records per page request.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Hard ceiling on accumulated records. Guarantees termination if the
/// provider's continuation signal is ever inconsistent; not a business
/// limit.
pub const MAX_STATEMENT_RECORDS: usize = 100_000;

/// Pagination state machine: offset-as-record-index, advancing by the page
/// size until an empty page, a missing continuation marker, or the safety
/// ceiling ends the sequence.
#[derive(Debug)]
pub struct PageCursor {
    offset: usize,
    page_size: usize,
    total: usize,
    pages: usize,
    done: bool,
}

impl PageCursor {
    pub fn new(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size,
            total: 0,
            pages: 0,
            done: false,
        }
    }

    /// `(offset, limit)` for the next page request, or `None` once done.
    pub fn next_request(&self) -> Option<(usize, usize)> {
        if self.done {
            None
        } else {
            Some((self.offset, self.page_size))
        }
    }

    /// Record a received page and advance or terminate.
    pub fn record_page(&mut self, records: usize, has_next: bool) {
        self.pages += 1;
        self.total += records;

        if records == 0 || !has_next {
            self.done = true;
        } else if self.total >= MAX_STATEMENT_RECORDS {
            warn!(total = self.total, "statement safety ceiling reached, stopping pagination");
            self.done = true;
        } else {
            self.offset += self.page_size;
        }
    }

    /// Terminate early (page-level failure after retries).
    pub fn abort(&mut self) {
        self.done = true;
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Everything one statement fetch produced. `partial` is set when a page
/// failed after its retry and the sequence ended early; `rejected` counts
/// records the parse boundary refused.
#[derive(Debug)]
pub struct FetchOutcome {
    pub transactions: Vec<RawTransaction>,
    pub partial: bool,
    pub page_requests: usize,
    pub rejected: usize,
}

impl ApiClient {
    /// Fetch every statement record for `account` within `period`.
    ///
    /// No ordering guarantee: records come back in whatever order the
    /// provider sent them (observed reverse-chronological); sorting and
    /// duplicate suppression belong to the ledger builder. An auth failure
    /// mid-sequence gets one fresh token and one retry of that page; a
    /// transient failure gets one retry with the same token; a second
    /// failure returns what was accumulated, flagged partial.
    pub async fn fetch_statement(
        &mut self,
        account: &AccountRef,
        period: Period,
        page_size: usize,
    ) -> ApiResult<FetchOutcome> {
        let url = format!(
            "{}/banks/{}/statements/{}",
            self.endpoints().api_base,
            self.endpoints().bank_id,
            account.statement_id()
        );

        let mut cursor = PageCursor::new(page_size);
        let mut transactions = Vec::new();
        let mut partial = false;
        let mut rejected = 0usize;

        while let Some((offset, limit)) = cursor.next_request() {
            let body = match self.statement_page(&url, period, offset, limit).await {
                Ok(body) => body,
                Err(e) if e.is_auth() => {
                    warn!(offset, error = %e, "auth failure mid-fetch, refreshing token");
                    self.tokens_mut().invalidate();
                    match self.statement_page(&url, period, offset, limit).await {
                        Ok(body) => body,
                        Err(e) => {
                            // Before any page landed this is a credential
                            // problem, not a pagination hiccup: let the
                            // fund-level loop record it.
                            if cursor.pages() == 0 {
                                return Err(e);
                            }
                            warn!(offset, error = %e, "page failed after token refresh");
                            partial = true;
                            cursor.abort();
                            continue;
                        }
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(offset, error = %e, "transient failure, retrying page");
                    match self.statement_page(&url, period, offset, limit).await {
                        Ok(body) => body,
                        Err(e) => {
                            warn!(offset, error = %e, "page failed after retry");
                            partial = true;
                            cursor.abort();
                            continue;
                        }
                    }
                }
                Err(e) => return Err(e),
            };

            let (records, has_next) = match split_page(&body) {
                Ok(page) => page,
                Err(ApiError::UnexpectedSchema { keys }) => {
                    // Known to vary across provider versions: degrade to
                    // zero results instead of a hard failure.
                    warn!(offset, ?keys, "unrecognized statement envelope, treating as empty");
                    cursor.record_page(0, false);
                    continue;
                }
                Err(e) => return Err(e),
            };

            for record in records {
                match parse_transaction(record, transactions.len()) {
                    Ok(txn) => transactions.push(txn),
                    Err(reason) => {
                        warn!(offset, %reason, "malformed statement record rejected");
                        rejected += 1;
                    }
                }
            }

            cursor.record_page(records.len(), has_next);
        }

        info!(
            account = %account,
            records = transactions.len(),
            pages = cursor.pages(),
            partial,
            "statement fetch complete"
        );

        Ok(FetchOutcome {
            transactions,
            partial,
            page_requests: cursor.pages(),
            rejected,
        })
    }

    async fn statement_page(
        &mut self,
        url: &str,
        period: Period,
        offset: usize,
        limit: usize,
    ) -> ApiResult<Value> {
        let query = [
            ("initialDate", period.from.format("%Y-%m-%d").to_string()),
            ("finalDate", period.to.format("%Y-%m-%d").to_string()),
            ("_limit", limit.to_string()),
            ("_offset", offset.to_string()),
        ];
        self.get_json(url, &query).await
    }
}

/// Split a statement page into its record array and continuation flag.
fn split_page(body: &Value) -> ApiResult<(&Vec<Value>, bool)> {
    let Some(content) = body.get("_content").and_then(Value::as_array) else {
        let keys = body
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        return Err(ApiError::UnexpectedSchema { keys });
    };
    let has_next = body
        .get("_links")
        .and_then(|l| l.get("next"))
        .is_some();
    Ok((content, has_next))
}

/// Validate one provider record into a `RawTransaction`, rejecting it at
/// this boundary when the date or amount is unusable. `seq` disambiguates
/// records the provider shipped without a transaction id, so they are never
/// falsely deduplicated downstream.
fn parse_transaction(value: &Value, seq: usize) -> Result<RawTransaction, String> {
    let date_raw =
        json_string(value, "transactionDate").ok_or_else(|| "missing transactionDate".to_string())?;
    let date = parse_provider_date(&date_raw)
        .ok_or_else(|| format!("unparseable transactionDate {date_raw:?}"))?;

    let amount = json_f64(value, "amount").ok_or_else(|| "missing amount".to_string())?;

    let kind = match json_string(value, "creditDebitType").as_deref() {
        Some("DEBITO") => CreditDebit::Debit,
        _ => CreditDebit::Credit,
    };

    let provider_id = json_string(value, "transactionId")
        .unwrap_or_else(|| format!("row-{seq}-{}-{amount}", date.format("%Y%m%d")));

    Ok(RawTransaction {
        date,
        description: json_string(value, "transactionName").unwrap_or_default(),
        document_number: json_string(value, "documentNumber").unwrap_or_default(),
        amount,
        kind,
        provider_id,
    })
}

/// Both date spellings observed in the wild: ISO (`2025-11-18`, possibly
/// with a time suffix) and pt-BR (`18/11/2025`).
fn parse_provider_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = if s.len() >= 10 { &s[..10] } else { s };
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%d/%m/%Y"))
        .ok()
}
