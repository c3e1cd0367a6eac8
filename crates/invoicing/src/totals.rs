//! Derived invoice figures.

use serde::Serialize;

use invoice_builder_core::{Money, Percentage};

use crate::line_item::LineItem;

/// Subtotal, tax, discount and grand total for a set of line items.
///
/// Always computed from scratch; the work is linear in the number of lines.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    /// `subtotal + tax - discount`. May go negative when the discount rate
    /// exceeds 100% plus the tax rate.
    pub total: Money,
}

impl InvoiceTotals {
    pub fn compute(lines: &[LineItem], tax_rate: Percentage, discount_rate: Percentage) -> Self {
        let subtotal: Money = lines.iter().map(LineItem::line_total).sum();
        let tax = subtotal * tax_rate.fraction();
        let discount = subtotal * discount_rate.fraction();
        Self {
            subtotal,
            tax,
            discount,
            total: subtotal + tax - discount,
        }
    }
}
