//! One user action against an open session.
//!
//! One-shot subcommands and the interactive loop both funnel into
//! [`perform`], so they behave identically.

use std::io::Write;

use thiserror::Error;

use invoice_builder_core::IdGenerator;
use invoice_builder_infra::{InvoiceSession, KeyValueStorage};
use invoice_builder_invoicing::{LineItemId, LineItemUpdate};

use crate::args::Command;
use crate::render;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Catalog,
    Add,
    Select { id: LineItemId, service: String },
    Price { id: LineItemId, raw: String },
    Qty { id: LineItemId, raw: String },
    Remove { id: LineItemId },
    Show,
    Clear,
    Tax { raw: String },
    Discount { raw: String },
}

impl Action {
    fn target(&self) -> Option<LineItemId> {
        match self {
            Action::Select { id, .. }
            | Action::Price { id, .. }
            | Action::Qty { id, .. }
            | Action::Remove { id } => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("no line item with id {0}")]
    UnknownLineItem(LineItemId),
}

impl TryFrom<&Command> for Action {
    type Error = ();

    /// `session` has no single-action counterpart.
    fn try_from(command: &Command) -> Result<Self, Self::Error> {
        Ok(match command {
            Command::Catalog => Action::Catalog,
            Command::Add => Action::Add,
            Command::Select { id, service } => Action::Select {
                id: *id,
                service: service.clone(),
            },
            Command::Price { id, value } => Action::Price {
                id: *id,
                raw: value.clone(),
            },
            Command::Qty { id, value } => Action::Qty {
                id: *id,
                raw: value.clone(),
            },
            Command::Remove { id } => Action::Remove { id: *id },
            Command::Show => Action::Show,
            Command::Clear => Action::Clear,
            Command::Session => return Err(()),
        })
    }
}

/// Run `action` and write its output.
///
/// `add` prints only the new id so scripts can capture it; every other
/// mutation prints the updated invoice.
pub fn perform<S, G, W>(
    session: &mut InvoiceSession<S, G>,
    action: Action,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    G: IdGenerator,
    W: Write + ?Sized,
{
    if let Some(id) = action.target() {
        if !session.draft().contains(id) {
            return Err(ActionError::UnknownLineItem(id).into());
        }
    }

    tracing::debug!(?action, "performing action");

    match action {
        Action::Catalog => {
            write!(out, "{}", render::catalog(session.catalog()))?;
            return Ok(());
        }
        Action::Show => {
            write!(out, "{}", render::invoice(session.draft()))?;
            return Ok(());
        }
        Action::Add => {
            let id = session.add_item()?;
            writeln!(out, "{id}")?;
            return Ok(());
        }
        Action::Select { id, service } => session.select_service(id, &service)?,
        Action::Price { id, raw } => {
            session.update_item(id, LineItemUpdate::SetUnitPrice(raw))?
        }
        Action::Qty { id, raw } => session.update_item(id, LineItemUpdate::SetQuantity(raw))?,
        Action::Remove { id } => session.remove_item(id)?,
        Action::Clear => session.clear()?,
        Action::Tax { raw } => {
            session.set_tax_rate(&raw)?;
        }
        Action::Discount { raw } => {
            session.set_discount_rate(&raw)?;
        }
    }

    write!(out, "{}", render::invoice(session.draft()))?;
    Ok(())
}
