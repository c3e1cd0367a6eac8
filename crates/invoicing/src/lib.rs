//! Invoicing domain module.
//!
//! This crate contains the business rules for building an invoice from
//! catalog services: line items, the draft aggregate and totals arithmetic.
//! It is pure, deterministic domain logic (no IO, no storage).

pub mod catalog;
pub mod draft;
pub mod line_item;
pub mod totals;

pub use catalog::{Catalog, Service};
pub use draft::{
    AddLineItem, ClearLineItems, DEFAULT_TAX_RATE, DraftId, InvoiceDraft, InvoiceDraftCommand,
    InvoiceDraftEvent, LineItemUpdate, RemoveLineItem, SelectService, SetDiscountRate, SetTaxRate,
    UpdateLineItem,
};
pub use line_item::{LineItem, LineItemId};
pub use totals::InvoiceTotals;
