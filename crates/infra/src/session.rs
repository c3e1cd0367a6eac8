//! Invoice session: command execution followed by persistence.
//!
//! ```text
//! Command
//!   ↓
//! 1. Handle (pure decision logic, produces events)
//!   ↓
//! 2. Apply events to the in-memory draft
//!   ↓
//! 3. Save the full line-item sequence (only if a line-item event was applied)
//! ```
//!
//! Mutation and persistence are one explicit, sequenced call here rather than a
//! watcher reacting to state changes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use invoice_builder_core::{AggregateRoot, ClockIdGenerator, DomainError, IdGenerator, Percentage};
use invoice_builder_events::{Event, execute};
use invoice_builder_invoicing::{
    AddLineItem, Catalog, ClearLineItems, DEFAULT_TAX_RATE, DraftId, InvoiceDraft,
    InvoiceDraftCommand, InvoiceDraftEvent, InvoiceTotals, LineItem, LineItemId, LineItemUpdate,
    RemoveLineItem, SelectService, SetDiscountRate, SetTaxRate, UpdateLineItem,
};

use crate::repository::LineItemRepository;
use crate::storage::{KeyValueStorage, StorageError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What to do when the stored line items cannot be read back.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptStatePolicy {
    /// Log a warning and start from an empty invoice. The bad entry is
    /// overwritten by the next save.
    #[default]
    Reset,
    /// Refuse to open the session.
    Fail,
}

impl core::str::FromStr for CorruptStatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown corrupt-state policy {other:?} (expected reset or fail)"
            )),
        }
    }
}

/// Starting rates and recovery behavior for a session.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SessionOptions {
    pub tax_rate: Percentage,
    pub discount_rate: Percentage,
    pub on_corrupt: CorruptStatePolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tax_rate: Percentage::new(DEFAULT_TAX_RATE),
            discount_rate: Percentage::ZERO,
            on_corrupt: CorruptStatePolicy::Reset,
        }
    }
}

/// One run of the invoice builder: owns the draft and keeps storage in step.
#[derive(Debug)]
pub struct InvoiceSession<S, G = ClockIdGenerator> {
    draft: InvoiceDraft,
    repository: LineItemRepository<S>,
    ids: G,
}

impl<S, G> InvoiceSession<S, G>
where
    S: KeyValueStorage,
    G: IdGenerator,
{
    /// Load the stored line items once and build the draft around them.
    pub fn open(
        repository: LineItemRepository<S>,
        catalog: Catalog,
        mut ids: G,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let draft_id = DraftId::new(repository.key());

        // Stored entries that break a draft invariant are as unusable as
        // unparseable ones, so both are reported as corrupt storage.
        let restored = repository.load().and_then(|lines| {
            InvoiceDraft::from_line_items(
                draft_id.clone(),
                catalog.clone(),
                lines,
                options.tax_rate,
                options.discount_rate,
            )
            .map_err(|err| StorageError::Corrupt {
                key: repository.key().to_string(),
                message: err.to_string(),
            })
        });

        let draft = match restored {
            Ok(draft) => draft,
            Err(err) if err.is_corrupt() && options.on_corrupt == CorruptStatePolicy::Reset => {
                tracing::warn!(
                    key = repository.key(),
                    error = %err,
                    "stored line items are unreadable; starting with an empty invoice"
                );
                InvoiceDraft::from_line_items(
                    draft_id,
                    catalog,
                    Vec::new(),
                    options.tax_rate,
                    options.discount_rate,
                )?
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(max) = draft.max_line_item_id() {
            ids.observe(max.as_i64());
        }

        tracing::info!(
            key = repository.key(),
            line_items = draft.lines().len(),
            tax_rate = draft.tax_rate().value(),
            discount_rate = draft.discount_rate().value(),
            "invoice session opened"
        );

        Ok(Self {
            draft,
            repository,
            ids,
        })
    }

    /// Execute a command and persist the line items if they changed.
    ///
    /// If the save fails the in-memory draft keeps the change and the error is
    /// returned; the next successful save writes the full sequence again.
    pub fn dispatch(
        &mut self,
        command: InvoiceDraftCommand,
    ) -> Result<Vec<InvoiceDraftEvent>, SessionError> {
        let events = execute(&mut self.draft, &command)?;

        for event in &events {
            tracing::debug!(
                event = %event.qualified_type(),
                version = self.draft.version(),
                "event applied"
            );
        }

        if events.iter().any(InvoiceDraftEvent::touches_line_items) {
            self.repository.save(self.draft.lines())?;
            tracing::debug!(
                key = self.repository.key(),
                line_items = self.draft.lines().len(),
                "line items saved"
            );
        }

        Ok(events)
    }

    /// Append a fresh, unselected line item and return its id.
    pub fn add_item(&mut self) -> Result<LineItemId, SessionError> {
        let line_item_id = LineItemId::new(self.ids.next_id()?);
        self.dispatch(InvoiceDraftCommand::AddLineItem(AddLineItem {
            line_item_id,
            occurred_at: Utc::now(),
        }))?;
        Ok(line_item_id)
    }

    pub fn select_service(
        &mut self,
        line_item_id: LineItemId,
        service_id: &str,
    ) -> Result<(), SessionError> {
        self.dispatch(InvoiceDraftCommand::SelectService(SelectService {
            line_item_id,
            service_id: service_id.to_string(),
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    pub fn update_item(
        &mut self,
        line_item_id: LineItemId,
        update: LineItemUpdate,
    ) -> Result<(), SessionError> {
        self.dispatch(InvoiceDraftCommand::UpdateLineItem(UpdateLineItem {
            line_item_id,
            update,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    pub fn remove_item(&mut self, line_item_id: LineItemId) -> Result<(), SessionError> {
        self.dispatch(InvoiceDraftCommand::RemoveLineItem(RemoveLineItem {
            line_item_id,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.dispatch(InvoiceDraftCommand::ClearLineItems(ClearLineItems {
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    pub fn set_tax_rate(&mut self, raw: &str) -> Result<Percentage, SessionError> {
        self.dispatch(InvoiceDraftCommand::SetTaxRate(SetTaxRate {
            raw: raw.to_string(),
            occurred_at: Utc::now(),
        }))?;
        Ok(self.draft.tax_rate())
    }

    pub fn set_discount_rate(&mut self, raw: &str) -> Result<Percentage, SessionError> {
        self.dispatch(InvoiceDraftCommand::SetDiscountRate(SetDiscountRate {
            raw: raw.to_string(),
            occurred_at: Utc::now(),
        }))?;
        Ok(self.draft.discount_rate())
    }

    pub fn draft(&self) -> &InvoiceDraft {
        &self.draft
    }

    pub fn catalog(&self) -> &Catalog {
        self.draft.catalog()
    }

    pub fn line_items(&self) -> &[LineItem] {
        self.draft.lines()
    }

    pub fn tax_rate(&self) -> Percentage {
        self.draft.tax_rate()
    }

    pub fn discount_rate(&self) -> Percentage {
        self.draft.discount_rate()
    }

    pub fn totals(&self) -> InvoiceTotals {
        self.draft.totals()
    }
}
