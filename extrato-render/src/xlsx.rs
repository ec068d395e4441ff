//! Spreadsheet renderer: the portal's fixed 6-column export grid.
//!
//! Layout contract (must match the bank's own export row for row):
//!   row 1: AGENCIA | <branch> | CONTA | <number>
//!   row 2: blank
//!   row 3: Data | <blank> | Histórico | Documento | Valor (R$) | Saldo (R$)
//!   row 4: previous-balance line
//!   row 5+: one line per ledger entry
//! Negative amounts are red; the running-balance column is never colored.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, Workbook};

use extrato_core::{format_brl, StatementReport};

use crate::BALANCE_UNAVAILABLE;

const MONEY_FORMAT: &str = "#,##0.00";
const MIN_COL_WIDTH: f64 = 10.0;
const MAX_COL_WIDTH: f64 = 50.0;

/// Render the report into an XLSX file at `path`. `generated_on` only feeds
/// the previous-balance row of an empty statement; cell content is otherwise
/// a pure function of the report.
pub fn render_spreadsheet(
    report: &StatementReport,
    generated_on: NaiveDate,
    path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let money = Format::new().set_num_format(MONEY_FORMAT);
    let money_negative = Format::new()
        .set_num_format(MONEY_FORMAT)
        .set_font_color(Color::Red);

    // Column width auto-sizing tracks the rendered length of every cell.
    let mut widths = [0usize; 6];
    let mut track = |col: usize, text: &str| {
        widths[col] = widths[col].max(text.chars().count());
    };

    // Row 1: branch/account identifiers.
    for (col, text) in [
        (0u16, "AGENCIA"),
        (1, report.account.branch.as_str()),
        (2, "CONTA"),
        (3, report.account.number.as_str()),
    ] {
        track(col as usize, text);
        sheet.write_string(0, col, text)?;
    }

    // Row 2 stays blank. Row 3: column titles.
    for (col, title) in [
        (0u16, "Data"),
        (2, "Histórico"),
        (3, "Documento"),
        (4, "Valor (R$)"),
        (5, "Saldo (R$)"),
    ] {
        track(col as usize, title);
        sheet.write_string(2, col, title)?;
    }

    // Row 4: previous balance, dated at the first entry (or the generation
    // day when the period had no movement).
    let first_date = report
        .entries
        .first()
        .map(|e| e.txn.date)
        .unwrap_or(generated_on);
    let date_text = first_date.format("%d/%m/%Y").to_string();
    track(0, &date_text);
    sheet.write_string(3, 0, &date_text)?;
    track(2, "SALDO ANTERIOR");
    sheet.write_string(3, 2, "SALDO ANTERIOR")?;
    match report.opening_balance {
        Some(opening) => {
            track(5, &format_brl(opening));
            sheet.write_number_with_format(3, 5, opening, &money)?;
        }
        None => {
            track(5, BALANCE_UNAVAILABLE);
            sheet.write_string(3, 5, BALANCE_UNAVAILABLE)?;
        }
    }

    // Rows 5+: ledger entries.
    for (i, entry) in report.entries.iter().enumerate() {
        let row = 4 + i as u32;

        let date_text = entry.txn.date.format("%d/%m/%Y").to_string();
        track(0, &date_text);
        sheet.write_string(row, 0, &date_text)?;

        track(2, &entry.txn.description);
        sheet.write_string(row, 2, &entry.txn.description)?;

        if !entry.txn.document_number.is_empty() {
            track(3, &entry.txn.document_number);
            sheet.write_string(row, 3, &entry.txn.document_number)?;
        }

        track(4, &format_brl(entry.signed_amount));
        let amount_format = if entry.signed_amount < 0.0 {
            &money_negative
        } else {
            &money
        };
        sheet.write_number_with_format(row, 4, entry.signed_amount, amount_format)?;

        if let Some(balance) = entry.running_balance {
            track(5, &format_brl(balance));
            sheet.write_number_with_format(row, 5, balance, &money)?;
        }
    }

    for (col, len) in widths.iter().enumerate() {
        let width = ((len + 2) as f64).clamp(MIN_COL_WIDTH, MAX_COL_WIDTH);
        sheet.set_column_width(col as u16, width)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
