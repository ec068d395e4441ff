//! Artifact file names, matching what the bank's own portal exports.

use chrono::{Datelike, NaiveDate};

use extrato_core::AccountRef;

const PT_MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// `exportar-Santander - Extrato DD de <mês> de YYYY-<fundo>-<agência>-<conta>.xlsx`
pub fn spreadsheet_filename(fund_name: &str, account: &AccountRef, generated_on: NaiveDate) -> String {
    let month = PT_MONTHS[generated_on.month0() as usize];
    format!(
        "exportar-Santander - Extrato {:02} de {} de {}-{}-{}-{}.xlsx",
        generated_on.day(),
        month,
        generated_on.year(),
        fund_name,
        account.branch,
        account.number
    )
}

/// `comprovante-ibe-<fundo>-<agência>-<conta>.pdf` (deliberately no unique
/// suffix: re-running a period overwrites the previous artifact).
pub fn pdf_filename(fund_name: &str, account: &AccountRef) -> String {
    format!(
        "comprovante-ibe-{}-{}-{}.pdf",
        fund_name, account.branch, account.number
    )
}
