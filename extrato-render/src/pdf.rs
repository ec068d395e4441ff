//! PDF renderer: replica of the bank portal's statement layout.
//!
//! Geometry is kept in points (the unit the reference document was measured
//! in) and converted to millimeters at the draw boundary. Column widths,
//! font sizes and colors come from measurements of a portal-issued
//! statement; they are fixed, not derived from content.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use extrato_core::{format_brl, StatementReport};

use crate::BALANCE_UNAVAILABLE;

const PAGE_W: f64 = 595.28; // A4, pt
const PAGE_H: f64 = 841.89;
const MARGIN: f64 = 29.0;

/// Transaction table: 6 columns at fixed widths, 513 pt total.
const COL_WIDTHS: [f64; 6] = [54.0, 13.0, 276.0, 56.0, 58.0, 56.0];
const CELL_PAD: f64 = 3.0;
const TABLE_FONT: f64 = 7.0;
const TABLE_HEADER_ROW_H: f64 = 19.0;
const TABLE_ROW_H: f64 = 15.0;

/// Balance-composition box: spacer, label, value, spacer.
const BOX_WIDTHS: [f64; 4] = [10.0, 370.0, 80.0, 10.0];
const BOX_ROW_H: f64 = 13.0;

fn mm(pt: f64) -> Mm {
    Mm((pt * 25.4 / 72.0) as f32)
}

fn santander_red() -> Rgb {
    Rgb::new(0.933, 0.114, 0.137, None)
}

fn body_color() -> Rgb {
    Rgb::new(0.255, 0.333, 0.369, None)
}

fn rule_gray() -> Rgb {
    Rgb::new(0.663, 0.663, 0.663, None)
}

/// Render the report into a PDF at `path`. `generated_at` feeds the
/// metadata block (and the previous-balance date of an empty statement).
pub fn render_pdf(report: &StatementReport, generated_at: NaiveDateTime, path: &Path) -> Result<()> {
    let (doc, page, layer) = PdfDocument::new(
        "Internet Banking Empresarial",
        mm(PAGE_W),
        mm(PAGE_H),
        "Camada 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut w = Writer {
        doc,
        layer,
        regular,
        bold,
        y: MARGIN,
    };

    draw_header(&mut w, report);
    draw_metadata(&mut w, report, generated_at);
    draw_table(&mut w, report, generated_at);
    draw_legend(&mut w);
    draw_balance_box(&mut w, report, generated_at);
    draw_footer(&mut w);

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    w.doc.save(&mut BufWriter::new(file))?;
    Ok(())
}

/// Page cursor: `y` grows downward from the page top, in points.
struct Writer {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f64,
}

impl Writer {
    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(mm(PAGE_W), mm(PAGE_H), "Camada 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = MARGIN;
    }

    fn ensure(&mut self, needed: f64) {
        if self.y + needed > PAGE_H - MARGIN {
            self.new_page();
        }
    }

    fn advance(&mut self, dy: f64) {
        self.y += dy;
    }

    /// Text with its baseline `size` below the current cursor.
    fn text(&self, s: &str, size: f64, x: f64, bold: bool, color: &Rgb) {
        self.text_at(s, size, x, self.y, bold, color);
    }

    fn text_at(&self, s: &str, size: f64, x: f64, y_top: f64, bold: bool, color: &Rgb) {
        self.layer.set_fill_color(Color::Rgb(color.clone()));
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(s, size as f32, mm(x), mm(PAGE_H - y_top - size), font);
    }

    fn text_right_at(&self, s: &str, size: f64, right: f64, y_top: f64, bold: bool, color: &Rgb) {
        let x = right - text_width(s, size);
        self.text_at(s, size, x, y_top, bold, color);
    }

    /// Bold label followed by regular text on the same line.
    fn label_value(&self, label: &str, value: &str, size: f64, x: f64, color: &Rgb) {
        self.text(label, size, x, true, color);
        self.text(value, size, x + text_width_bold(label, size), false, color);
    }

    fn hline_at(&self, x1: f64, x2: f64, y_top: f64, thickness: f64, color: &Rgb) {
        self.stroke(
            Point::new(mm(x1), mm(PAGE_H - y_top)),
            Point::new(mm(x2), mm(PAGE_H - y_top)),
            thickness,
            color,
        );
    }

    fn vline_at(&self, x: f64, y1_top: f64, y2_top: f64, thickness: f64, color: &Rgb) {
        self.stroke(
            Point::new(mm(x), mm(PAGE_H - y1_top)),
            Point::new(mm(x), mm(PAGE_H - y2_top)),
            thickness,
            color,
        );
    }

    fn stroke(&self, a: Point, b: Point, thickness: f64, color: &Rgb) {
        self.layer.set_outline_color(Color::Rgb(color.clone()));
        self.layer.set_outline_thickness(thickness as f32);
        self.layer.add_line(Line {
            points: vec![(a, false), (b, false)],
            is_closed: false,
        });
    }
}

fn draw_header(w: &mut Writer, report: &StatementReport) {
    w.text_right_at(
        "Internet Banking Empresarial",
        18.0,
        PAGE_W - MARGIN,
        w.y,
        false,
        &santander_red(),
    );
    w.advance(18.0 + 20.0);

    w.hline_at(MARGIN, PAGE_W - MARGIN, w.y, 1.0, &rule_gray());
    w.advance(15.0);

    let fund_line = format!(
        "{}    Agência: {}    Conta: {}",
        report.fund_name.to_uppercase(),
        report.account.branch,
        report.account.number
    );
    w.text(&fund_line, 7.0, MARGIN, false, &body_color());
    w.advance(7.0 + 10.0);

    w.hline_at(MARGIN, PAGE_W - MARGIN, w.y, 1.0, &rule_gray());
    w.advance(10.0);

    w.text("Conta Corrente > Extrato >", 8.2, MARGIN, false, &body_color());
    w.advance(8.2 + 2.0);
    w.text("Consultar", 10.5, MARGIN, false, &body_color());
    w.advance(10.5 + 15.0);
}

fn draw_metadata(w: &mut Writer, report: &StatementReport, generated_at: NaiveDateTime) {
    let color = body_color();

    w.label_value("Opção de Pesquisa: ", "Todos", 7.0, MARGIN, &color);
    w.advance(10.0);

    // The portal prints the *requested* period, not the span of whatever
    // came back.
    let period = format!(
        "{} a {}",
        report.period.from.format("%a %b %d 00:00:00 GMT-03:00 %Y"),
        report.period.to.format("%a %b %d 23:59:59 GMT-03:00 %Y")
    );
    w.label_value("Períodos: ", &period, 7.0, MARGIN, &color);
    w.advance(10.0);

    let stamp = generated_at.format("%d/%m/%Y às %Hh%M").to_string();
    w.label_value("Data/Hora: ", &stamp, 7.0, MARGIN, &color);
    w.advance(10.0 + 10.0);
}

/// Column left edges, absolute.
fn col_edges() -> [f64; 7] {
    let mut edges = [0.0f64; 7];
    edges[0] = MARGIN;
    for i in 0..6 {
        edges[i + 1] = edges[i] + COL_WIDTHS[i];
    }
    edges
}

fn draw_table(w: &mut Writer, report: &StatementReport, generated_at: NaiveDateTime) {
    let edges = col_edges();
    let color = body_color();
    let gray = rule_gray();

    // Header row.
    w.ensure(TABLE_HEADER_ROW_H + TABLE_ROW_H);
    w.hline_at(edges[0], edges[6], w.y, 0.5, &gray);
    let titles = ["Data", "", "Histórico", "Documento", "Valor (R$)", "Saldo (R$)"];
    draw_row(w, &edges, &titles, TABLE_HEADER_ROW_H, 6.0, true, &color);

    // Previous-balance row: opening balance dated at the first movement, or
    // today's current balance when the period had none.
    let (label, date) = match report.entries.first() {
        Some(first) => ("SALDO ANTERIOR", first.txn.date),
        None => ("SALDO ATUAL", generated_at.date()),
    };
    let opening_text = report
        .opening_balance
        .map(format_brl)
        .unwrap_or_else(|| BALANCE_UNAVAILABLE.to_string());
    let date_text = date.format("%d/%m/%Y").to_string();
    let cells = [date_text.as_str(), "", label, "", "", opening_text.as_str()];
    w.ensure(TABLE_ROW_H);
    draw_row(w, &edges, &cells, TABLE_ROW_H, 4.0, false, &color);

    for entry in &report.entries {
        let date_text = entry.txn.date.format("%d/%m/%Y").to_string();
        let amount_text = format_brl(entry.signed_amount);
        let balance_text = entry.running_balance.map(format_brl).unwrap_or_default();
        let cells = [
            date_text.as_str(),
            "",
            entry.txn.description.as_str(),
            entry.txn.document_number.as_str(),
            amount_text.as_str(),
            balance_text.as_str(),
        ];
        w.ensure(TABLE_ROW_H);
        draw_row(w, &edges, &cells, TABLE_ROW_H, 4.0, false, &color);
    }

    w.advance(10.0);
}

/// One table row: cell text, vertical rules, and the rule below. Columns
/// 0..=3 are left-aligned, 4..=5 right-aligned, as in the portal's table.
fn draw_row(
    w: &mut Writer,
    edges: &[f64; 7],
    cells: &[&str; 6],
    row_h: f64,
    pad_top: f64,
    bold: bool,
    color: &Rgb,
) {
    let y = w.y;
    for (i, cell) in cells.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        let text = fit_text(cell, TABLE_FONT, COL_WIDTHS[i] - 2.0 * CELL_PAD);
        if i >= 4 {
            w.text_right_at(&text, TABLE_FONT, edges[i + 1] - CELL_PAD, y + pad_top, bold, color);
        } else {
            w.text_at(&text, TABLE_FONT, edges[i] + CELL_PAD, y + pad_top, bold, color);
        }
    }

    let gray = rule_gray();
    for (i, x) in edges.iter().enumerate() {
        let thickness = if i == 0 || i == 6 { 0.5 } else { 0.25 };
        w.vline_at(*x, y, y + row_h, thickness, &gray);
    }
    w.hline_at(edges[0], edges[6], y + row_h, 0.25, &gray);
    w.advance(row_h);
}

fn draw_legend(w: &mut Writer) {
    let color = body_color();
    w.ensure(3.0 * 10.0 + 8.0);
    w.label_value(
        "a",
        " = Bloqueio Dia / ADM    Entenda a composição do seu saldo no quadro abaixo.",
        7.0,
        MARGIN,
        &color,
    );
    w.advance(10.0);
    w.label_value("b", " = Bloqueado", 7.0, MARGIN, &color);
    w.advance(10.0);
    w.label_value("p", " = Lançamento Provisionado", 7.0, MARGIN, &color);
    w.advance(10.0 + 8.0);
}

fn draw_balance_box(w: &mut Writer, report: &StatementReport, generated_at: NaiveDateTime) {
    let color = body_color();
    let gray = rule_gray();

    let (gross, blocked, available) = match report.balance {
        Some(b) => (format_brl(b.gross()), format_brl(b.blocked), format_brl(b.available)),
        None => (
            BALANCE_UNAVAILABLE.to_string(),
            format_brl(0.0),
            BALANCE_UNAVAILABLE.to_string(),
        ),
    };

    let position = format!("Posição em:{}", generated_at.format("%d/%m/%Y"));
    let summary = format!("C - Saldo Disponível em Conta Corrente (A - B) {available}");
    let rows: [(&str, &str, bool); 10] = [
        ("Saldo", "Valor (R$)", true),
        (position.as_str(), "", false),
        ("", "", false),
        ("Saldo", "Valor (R$)", true),
        ("A - Saldo de Conta Corrente", gross.as_str(), false),
        ("B - Saldo Bloqueado", blocked.as_str(), false),
        ("    Desbloqueio em 1 dia", "0,00", false),
        ("    Desbloqueio em 2 dias", "0,00", false),
        ("    Desbloqueio em mais de 2 dias", "0,00", false),
        (summary.as_str(), "", false),
    ];

    let box_w: f64 = BOX_WIDTHS.iter().sum();
    let box_h = BOX_ROW_H * rows.len() as f64;
    w.ensure(box_h + 15.0);
    let top = w.y;

    for (i, (label, value, bold)) in rows.iter().enumerate() {
        let y = top + BOX_ROW_H * i as f64;
        // The final summary line spans the whole box; the others sit in the
        // label/value columns.
        let label_x = if i == rows.len() - 1 {
            MARGIN + 4.0
        } else {
            MARGIN + BOX_WIDTHS[0] + 4.0
        };
        if !label.is_empty() {
            w.text_at(label, 7.0, label_x, y + 3.0, *bold, &color);
        }
        if !value.is_empty() {
            let right = MARGIN + BOX_WIDTHS[0] + BOX_WIDTHS[1] + BOX_WIDTHS[2] - 4.0;
            w.text_right_at(value, 7.0, right, y + 3.0, *bold, &color);
        }
    }

    // Box outline plus the two section separators and internal verticals.
    w.hline_at(MARGIN, MARGIN + box_w, top, 0.5, &gray);
    w.hline_at(MARGIN, MARGIN + box_w, top + box_h, 0.5, &gray);
    w.hline_at(MARGIN, MARGIN + box_w, top + BOX_ROW_H, 0.5, &gray);
    w.hline_at(MARGIN, MARGIN + box_w, top + 4.0 * BOX_ROW_H, 0.5, &gray);
    let mut x = MARGIN;
    w.vline_at(x, top, top + box_h, 0.5, &gray);
    for width in &BOX_WIDTHS[..3] {
        x += width;
        w.vline_at(x, top, top + box_h, 0.25, &gray);
    }
    w.vline_at(MARGIN + box_w, top, top + box_h, 0.5, &gray);

    w.y = top + box_h;
    w.advance(15.0);
}

fn draw_footer(w: &mut Writer) {
    // (bold lead-in, regular remainder); empty pairs are blank lines.
    let lines: [(&str, &str); 20] = [
        (
            "Central de Atendimento Santander Empresarial",
            " - Das 8h às 20h, de segunda a sexta-feira",
        ),
        ("", "4004-2125 (Capitais e Regiões Metropolitanas)"),
        ("", "0800 702 2125 (Demais Localidades)"),
        ("", ""),
        (
            "Central de Atendimento Getnet",
            " - Atendimento 24h por dia, todos os dias",
        ),
        ("", "4002-4000 (Capitais e Regiões Metropolitanas)"),
        ("", "4003-4000 (Capitais e Regiões Metropolitanas)"),
        ("", "0800 648 8000 (Demais Localidades)"),
        ("", ""),
        (
            "Central de Vendas PJ",
            " - Das 8h às 20h, de segunda a sexta-feira, exceto feriados.",
        ),
        ("", "0800 013 7333"),
        ("", ""),
        ("SAC", " - Atendimento 24h por dia, todos os dias."),
        ("", "Reclamações cancelamentos e informações:"),
        ("", "0800 762 7777"),
        ("", ""),
        (
            "Ouvidoria",
            " - Disponível das 9h às 18h, de segunda a sexta-feira, exceto feriados.",
        ),
        ("", "Se não ficar satisfeito com a solução apresentada:"),
        ("", "0800 726 0322"),
        ("", "55 (11) 3012 0322 (No exterior, ligue a cobrar)"),
    ];

    let color = body_color();
    w.ensure(lines.len() as f64 * 9.0);
    for (lead, rest) in lines {
        if lead.is_empty() && rest.is_empty() {
            w.advance(9.0);
            continue;
        }
        if lead.is_empty() {
            w.text(rest, 7.0, MARGIN, false, &color);
        } else {
            w.label_value(lead, rest, 7.0, MARGIN, &color);
        }
        w.advance(9.0);
    }
}

/// Truncate to the given width, dropping trailing characters. Descriptions
/// from the provider fit comfortably; this only guards pathological input.
fn fit_text(s: &str, size: f64, max_width: f64) -> String {
    if text_width(s, size) <= max_width {
        return s.to_string();
    }
    let mut out: String = s.to_string();
    while !out.is_empty() && text_width(&out, size) > max_width {
        out.pop();
    }
    out
}

/// Helvetica advance widths (per-mille of em) for the glyphs this layout
/// uses; anything exotic falls back to a typical lowercase width.
fn glyph_width(c: char) -> f64 {
    match c {
        ' ' | ',' | '.' | '/' | ':' | ';' | '!' => 278.0,
        '-' => 333.0,
        '(' | ')' => 333.0,
        '$' => 556.0,
        '%' => 889.0,
        '0'..='9' => 556.0,
        'i' | 'j' | 'l' => 222.0,
        'f' | 't' => 278.0,
        'r' => 333.0,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500.0,
        'm' => 833.0,
        'w' => 722.0,
        'I' => 278.0,
        'J' => 500.0,
        'L' => 556.0,
        'F' | 'T' | 'Z' => 611.0,
        'A' | 'B' | 'E' | 'K' | 'V' | 'X' | 'Y' => 667.0,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722.0,
        'G' | 'O' | 'Q' => 778.0,
        'M' => 833.0,
        'W' => 944.0,
        'P' | 'S' => 667.0,
        _ => 556.0,
    }
}

fn text_width(s: &str, size: f64) -> f64 {
    s.chars().map(glyph_width).sum::<f64>() * size / 1000.0
}

/// Bold runs a touch wider; close enough for label offsets.
fn text_width_bold(s: &str, size: f64) -> f64 {
    text_width(s, size) * 1.06
}
