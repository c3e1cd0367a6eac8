//! Plain-text rendering of the invoice and the catalog.

use std::fmt::Write as _;

use invoice_builder_core::Money;
use invoice_builder_invoicing::{Catalog, InvoiceDraft, LineItem};
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

const NO_SERVICE: &str = "(no service)";

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Unit Price")]
    unit_price: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Line Total")]
    line_total: String,
}

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
}

fn service_label(line: &LineItem) -> &str {
    if !line.service_name.is_empty() {
        &line.service_name
    } else if line.has_service() {
        &line.service_id
    } else {
        NO_SERVICE
    }
}

/// Columns from `first_numeric` onwards are right-aligned.
fn table<R: Tabled>(rows: Vec<R>, first_numeric: usize) -> String {
    let mut table = Table::new(rows);
    table
        .with(Style::sharp())
        .with(Modify::new(Columns::new(first_numeric..)).with(Alignment::right()));
    table.to_string()
}

/// Line-item table followed by the totals block.
pub fn invoice(draft: &InvoiceDraft) -> String {
    let mut out = String::new();
    let lines = draft.lines();

    if lines.is_empty() {
        out.push_str("No line items. Run `add` to start one.\n");
    } else {
        let rows: Vec<LineRow> = lines
            .iter()
            .map(|line| LineRow {
                id: line.id.to_string(),
                service: service_label(line).to_string(),
                unit_price: Money::new(line.unit_price).to_string(),
                quantity: line.quantity.to_string(),
                line_total: line.line_total().to_string(),
            })
            .collect();
        out.push_str(&table(rows, 2));
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&totals(draft));
    out
}

/// `Subtotal`, `Tax (<rate>%)`, `Discount: -<amount>` and `Total`.
pub fn totals(draft: &InvoiceDraft) -> String {
    let totals = draft.totals();
    let rows = [
        ("Subtotal:".to_string(), totals.subtotal.to_string()),
        (
            format!("Tax ({}%):", draft.tax_rate()),
            totals.tax.to_string(),
        ),
        ("Discount:".to_string(), format!("-{}", totals.discount)),
        ("Total:".to_string(), totals.total.to_string()),
    ];

    let label_w = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let amount_w = rows.iter().map(|(_, a)| a.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (label, amount) in &rows {
        let _ = writeln!(out, "{label:<label_w$}  {amount:>amount_w$}");
    }
    out
}

pub fn catalog(catalog: &Catalog) -> String {
    let rows: Vec<ServiceRow> = catalog
        .iter()
        .map(|service| ServiceRow {
            id: service.id.clone(),
            name: service.name.clone(),
            price: Money::new(service.unit_price).to_string(),
        })
        .collect();
    let mut out = table(rows, 2);
    out.push('\n');
    out
}
