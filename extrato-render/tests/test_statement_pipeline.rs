//! End-to-end over the offline half of the pipeline: provider-ordered raw
//! transactions → reconciled ledger → both rendered documents.

use chrono::{NaiveDate, NaiveDateTime};
use extrato_core::{build_report, AccountRef, BalanceSnapshot, CreditDebit, Period, RawTransaction};
use extrato_render::{pdf_filename, render_pdf, render_spreadsheet, spreadsheet_filename};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
}

fn generated_at() -> NaiveDateTime {
    day(19).and_hms_opt(14, 45, 0).unwrap()
}

fn txn(id: &str, date: NaiveDate, amount: f64, kind: CreditDebit, desc: &str) -> RawTransaction {
    RawTransaction {
        date,
        description: desc.to_string(),
        document_number: String::new(),
        amount,
        kind,
        provider_id: id.to_string(),
    }
}

/// The provider returns newest-first; this is the bank's own worked example
/// with the opening balance of R$ 57.365,08.
fn provider_ordered_transactions() -> Vec<RawTransaction> {
    vec![
        txn("5", day(18), 48926666.13, CreditDebit::Credit, "RESGATE FUNDO DE INVESTIMENTO"),
        txn("4", day(18), 385714.00, CreditDebit::Credit, "PIX RECEBIDO"),
        txn("3", day(17), 127.80, CreditDebit::Debit, "TAR PIX PGTO FORNEC - OUTRA INST"),
        txn("2", day(14), 7.20, CreditDebit::Debit, "TAR PIX PGTO FORNEC - MESMA INST"),
        txn("1", day(13), 5.25, CreditDebit::Debit, "TAR EMISSAO TED CIP PGTO FORNEC"),
    ]
}

fn balance() -> BalanceSnapshot {
    BalanceSnapshot {
        available: 49369604.96,
        blocked: 0.0,
        auto_invested: 0.0,
    }
}

#[test]
fn test_ledger_reconciles_and_both_documents_render() {
    let account = AccountRef::new("2271", "130107983");
    let period = Period {
        from: day(11),
        to: day(18),
    };
    let report = build_report(
        "MAKENA FIDC",
        account.clone(),
        period,
        provider_ordered_transactions(),
        Some(balance()),
    );

    assert_eq!(report.opening_balance, Some(57365.08));
    assert_eq!(report.closing_balance, Some(49369604.96));
    assert!(report.reconciliation.is_none());

    // Chronological after the build, regardless of provider order.
    let dates: Vec<NaiveDate> = report.entries.iter().map(|e| e.txn.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    let dir = tempfile::tempdir().unwrap();
    let xlsx = dir
        .path()
        .join(spreadsheet_filename(&report.fund_name, &account, generated_at().date()));
    let pdf = dir.path().join(pdf_filename(&report.fund_name, &account));

    render_spreadsheet(&report, generated_at().date(), &xlsx).unwrap();
    render_pdf(&report, generated_at(), &pdf).unwrap();

    assert!(xlsx.file_name().unwrap().to_str().unwrap().contains("MAKENA FIDC-2271-130107983"));
    assert_eq!(
        pdf.file_name().unwrap().to_str().unwrap(),
        "comprovante-ibe-MAKENA FIDC-2271-130107983.pdf"
    );
    assert!(std::fs::metadata(&xlsx).unwrap().len() > 0);
    assert!(std::fs::metadata(&pdf).unwrap().len() > 0);
}

/// Rendering the same report twice must produce the same table content.
/// The PDF container embeds its own creation timestamp and document id
/// (fixed width), so structural identity shows up as identical file sizes.
#[test]
fn test_pdf_render_is_deterministic() {
    let account = AccountRef::new("2271", "130107983");
    let report = build_report(
        "MAKENA FIDC",
        account,
        Period {
            from: day(11),
            to: day(18),
        },
        provider_ordered_transactions(),
        Some(balance()),
    );

    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    render_pdf(&report, generated_at(), &a).unwrap();
    render_pdf(&report, generated_at(), &b).unwrap();

    assert_eq!(
        std::fs::metadata(&a).unwrap().len(),
        std::fs::metadata(&b).unwrap().len()
    );
}

/// Zero transactions with a known balance: documents still render, showing
/// only the balance line.
#[test]
fn test_empty_period_renders_balance_only_documents() {
    let account = AccountRef::new("2271", "130137784");
    let report = build_report(
        "CONDOLIVRE FIDC",
        account.clone(),
        Period {
            from: day(11),
            to: day(18),
        },
        vec![],
        Some(balance()),
    );

    assert!(report.entries.is_empty());
    assert_eq!(report.opening_balance, report.closing_balance);

    let dir = tempfile::tempdir().unwrap();
    let xlsx = dir.path().join("vazio.xlsx");
    let pdf = dir.path().join("vazio.pdf");
    render_spreadsheet(&report, generated_at().date(), &xlsx).unwrap();
    render_pdf(&report, generated_at(), &pdf).unwrap();
    assert!(xlsx.exists() && pdf.exists());
}
