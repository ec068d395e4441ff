//! The sync orchestrator: funds → accounts → balance → statement → ledger →
//! documents. Strictly sequential, one fund at a time; a fund-level failure
//! is recorded in the summary and never aborts the remaining funds.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Local;
use tracing::{info, warn};

use extrato_client::{ApiClient, ApiError};
use extrato_core::{build_report, AccountRef, Period};
use extrato_render::{pdf_filename, render_pdf, render_spreadsheet, spreadsheet_filename};

use crate::config::{Config, FundConfig};

pub struct SyncOptions {
    pub period: Period,
    pub out_dir: PathBuf,
    pub page_size: usize,
    /// Empty = every configured fund.
    pub funds: Vec<String>,
}

/// Tri-state run outcome: every configured fund lands in exactly one bucket.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub with_transactions: Vec<String>,
    pub zero_transactions: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub files: Vec<PathBuf>,
}

struct FundOutcome {
    had_transactions: bool,
    files: Vec<PathBuf>,
}

/// Process every selected fund and collect the summary. Errors never escape
/// the per-fund boundary.
pub async fn run(config: &Config, opts: &SyncOptions) -> RunSummary {
    let mut summary = RunSummary::default();

    for (fund_id, fund) in &config.funds {
        if !opts.funds.is_empty() && !opts.funds.contains(fund_id) {
            continue;
        }
        info!(fund = %fund_id, "processing fund");

        match process_fund(fund, config, opts).await {
            Ok(outcome) => {
                if outcome.had_transactions {
                    summary.with_transactions.push(fund.name.clone());
                } else {
                    summary.zero_transactions.push(fund.name.clone());
                }
                summary.files.extend(outcome.files);
            }
            Err(e) => {
                warn!(fund = %fund_id, error = %e, "fund failed");
                summary.failed.push((fund.name.clone(), format!("{e:#}")));
            }
        }
    }

    summary
}

async fn process_fund(fund: &FundConfig, config: &Config, opts: &SyncOptions) -> Result<FundOutcome> {
    // One client (and so one token cache) per fund; never shared.
    let mut client = ApiClient::new(fund.credential.clone(), config.endpoints.clone())?;

    let accounts = resolve_accounts(&mut client, fund, config).await?;
    if accounts.is_empty() {
        bail!("no accounts found for {}", fund.name);
    }

    let mut had_transactions = false;
    let mut files = Vec::new();

    for account in &accounts {
        info!(%account, "processing account");

        // A missing balance degrades the report, it does not stop it.
        let balance = match client.fetch_balance(account).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(%account, error = %e, "balance unavailable, proceeding without it");
                None
            }
        };

        let outcome = client
            .fetch_statement(account, opts.period, opts.page_size)
            .await?;
        if outcome.partial {
            warn!(%account, "statement fetch ended early, ledger will be partial");
        }
        if outcome.rejected > 0 {
            warn!(%account, rejected = outcome.rejected, "malformed records were skipped");
        }
        if !outcome.transactions.is_empty() {
            had_transactions = true;
        }

        let report = build_report(
            fund.name.clone(),
            account.clone(),
            opts.period,
            outcome.transactions,
            balance,
        );
        if report.duplicates_dropped > 0 {
            warn!(%account, dropped = report.duplicates_dropped, "duplicate provider ids dropped");
        }
        if let Some(mismatch) = &report.reconciliation {
            warn!(
                %account,
                expected = mismatch.expected,
                computed = mismatch.computed,
                "closing balance does not reconcile with the reported balance"
            );
        }

        let generated_at = Local::now().naive_local();
        let xlsx_path = opts
            .out_dir
            .join(spreadsheet_filename(&fund.name, account, generated_at.date()));
        render_spreadsheet(&report, generated_at.date(), &xlsx_path)?;
        files.push(xlsx_path);

        let pdf_path = opts.out_dir.join(pdf_filename(&fund.name, account));
        render_pdf(&report, generated_at, &pdf_path)?;
        files.push(pdf_path);
    }

    Ok(FundOutcome {
        had_transactions,
        files,
    })
}

/// Dynamic listing first; on an auth rejection, fall back to the configured
/// known-accounts table (explicit and logged — capability substitution, not
/// a hidden default). A schema surprise degrades to zero accounts.
async fn resolve_accounts(
    client: &mut ApiClient,
    fund: &FundConfig,
    config: &Config,
) -> Result<Vec<AccountRef>> {
    match client.list_accounts().await {
        Ok(accounts) => Ok(accounts),
        Err(e @ ApiError::Auth { .. }) => {
            let fallback = config.fallback_accounts(&fund.name);
            if fallback.is_empty() {
                bail!("account listing rejected ({e}) and no known accounts configured");
            }
            warn!(
                fund = %fund.name,
                count = fallback.len(),
                "account listing rejected, using known-accounts table"
            );
            Ok(fallback)
        }
        Err(ApiError::UnexpectedSchema { keys }) => {
            warn!(?keys, "unrecognized accounts envelope, treating as zero results");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
