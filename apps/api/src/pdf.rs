//! # Sales Report PDF
//!
//! Renders a [`SalesReport`] as a plain-text PDF 1.4 document.
//!
//! ## Document Layout
//! ```text
//! %PDF-1.4
//! 1 0 obj  Catalog ──► 2 0 obj Pages ──► Kids [page, page, ...]
//! 3 0 obj  Font /Helvetica
//! 4 0 obj  Page 1 ──► 5 0 obj content stream (up to LINES_PER_PAGE lines)
//! 6 0 obj  Page 2 ──► 7 0 obj content stream
//! ...
//! xref / trailer / startxref
//! ```

use std::fmt::Write as _;

use tienda_core::{Money, SalesReport};

/// Lines of text that fit on one US Letter page at the chosen leading.
const LINES_PER_PAGE: usize = 50;
const FONT_SIZE: u32 = 11;
const LEADING: u32 = 14;
const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN_LEFT: u32 = 50;
const FIRST_BASELINE: u32 = 750;

/// Turns a report into a downloadable document.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, report: &SalesReport) -> Vec<u8>;

    fn content_type(&self) -> &'static str;
}

/// Minimal PDF writer using the built-in Helvetica font.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl DocumentRenderer for PdfRenderer {
    fn render(&self, report: &SalesReport) -> Vec<u8> {
        write_pdf(&report_lines(report))
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

/// The report as lines of text, in reading order.
fn report_lines(report: &SalesReport) -> Vec<String> {
    let mut lines = vec![
        "Sales Report".to_string(),
        format!("Generated at: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        String::new(),
        format!("Transactions: {}", report.transaction_count),
        format!("Total revenue: {}", Money::from_cents(report.total_revenue_cents)),
        format!("Average ticket: {}", Money::from_cents(report.average_ticket_cents)),
        String::new(),
        "By payment method".to_string(),
    ];

    for (method, bucket) in &report.by_payment_method {
        lines.push(format!(
            "  {:<10} {:>6} tx   {}",
            method.as_str(),
            bucket.count,
            Money::from_cents(bucket.revenue_cents)
        ));
    }

    lines.push(String::new());
    lines.push("By status".to_string());
    for (status, bucket) in &report.by_status {
        lines.push(format!(
            "  {:<10} {:>6} tx   {}",
            status.as_str(),
            bucket.count,
            Money::from_cents(bucket.revenue_cents)
        ));
    }

    lines.push(String::new());
    lines.push("Products".to_string());
    if report.products.is_empty() {
        lines.push("  No sales recorded".to_string());
    }
    for product in &report.products {
        lines.push(format!(
            "  {} ({}): {} units in {} tx, {}",
            product.name,
            product.product,
            product.units_sold,
            product.transaction_count,
            Money::from_cents(product.revenue_cents)
        ));
    }

    lines
}

/// Escapes a line for a PDF literal string. Non-ASCII becomes `?`.
fn escape_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn page_stream(lines: &[String]) -> String {
    let mut stream = String::new();
    let _ = write!(
        stream,
        "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
        FONT_SIZE, LEADING, MARGIN_LEFT, FIRST_BASELINE
    );
    for line in lines {
        let _ = writeln!(stream, "({}) Tj T*", escape_text(line));
    }
    stream.push_str("ET\n");
    stream
}

/// Serializes the objects and builds the cross-reference table.
fn write_pdf(lines: &[String]) -> Vec<u8> {
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![lines]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    // Objects 1-3 are fixed; each page adds a page object and its stream.
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + i * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    for (page, page_id) in pages.iter().zip(&page_ids) {
        let stream = page_stream(page);
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, body).as_bytes());
    }

    let xref_start = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(xref, "{:010} 00000 n ", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_start
    );
    out.extend_from_slice(xref.as_bytes());

    out
}
