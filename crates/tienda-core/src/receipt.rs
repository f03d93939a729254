//! # Receipt Email
//!
//! Builds the HTML confirmation sent to a client after a transaction is
//! recorded. Composition only; delivery lives in the API's notifier.

use serde::Serialize;
use std::fmt::Write;

use crate::money::Money;
use crate::types::Transaction;

/// A ready-to-send email message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Subject line for a transaction confirmation.
pub fn confirmation_subject(transaction_id: &str) -> String {
    format!("Transaction confirmation {}", transaction_id)
}

/// Composes the confirmation for `tx` addressed to `recipient`.
///
/// ## Layout
/// ```text
/// Transaction confirmation
///   Transaction: <id>
///   Client: <document>
///   ┌─────────┬──────────┬─────────┐
///   │ Product │ Quantity │ Total   │   one row per line item
///   └─────────┴──────────┴─────────┘
///   Payment method / Status / Total
/// ```
pub fn compose_confirmation(recipient: &str, tx: &Transaction) -> EmailMessage {
    let mut rows = String::new();
    for line in &tx.products {
        // Writing into a String cannot fail
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&line.product_name),
            line.quantity,
            Money::from_cents(line.total_cents)
        );
    }

    let html = format!(
        "<html><body>\
         <h2>Transaction confirmation</h2>\
         <p>Transaction: <strong>{id}</strong></p>\
         <p>Client: {client}</p>\
         <table border=\"1\" cellpadding=\"4\">\
         <tr><th>Product</th><th>Quantity</th><th>Total</th></tr>\
         {rows}\
         </table>\
         <p>Payment method: {method}</p>\
         <p>Status: {status}</p>\
         <p><strong>Total: {total}</strong></p>\
         </body></html>",
        id = escape_html(&tx.id),
        client = escape_html(&tx.client),
        rows = rows,
        method = tx.payment_method,
        status = tx.status,
        total = tx.total(),
    );

    EmailMessage {
        to: recipient.to_string(),
        subject: confirmation_subject(&tx.id),
        html,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
