//! extrato-render: fixed-layout statement documents (XLSX and PDF) built
//! from a reconciled `StatementReport`. Both renderers are pure functions of
//! the report plus an output path; neither touches the network or tokens.

pub mod filename;
pub mod pdf;
pub mod xlsx;

pub use filename::{pdf_filename, spreadsheet_filename};
pub use pdf::render_pdf;
pub use xlsx::render_spreadsheet;

/// Balance cell text when the current balance could not be retrieved.
pub const BALANCE_UNAVAILABLE: &str = "indisponível";
