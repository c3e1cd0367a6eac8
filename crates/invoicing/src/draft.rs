use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoice_builder_core::{
    Aggregate, AggregateRoot, DomainError, Percentage, first_duplicate_id, parse_non_negative,
};
use invoice_builder_events::Event;

use crate::catalog::Catalog;
use crate::line_item::{LineItem, LineItemId};
use crate::totals::InvoiceTotals;

/// Tax rate a new draft starts with.
pub const DEFAULT_TAX_RATE: f64 = 8.0;

/// Draft identifier: the name of the storage entry the draft persists under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(String);

impl DraftId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for DraftId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregate root: the invoice being built.
///
/// Holds the ordered line items and the two rates. Line items are what gets
/// persisted; the rates live only as long as the draft.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    id: DraftId,
    catalog: Catalog,
    lines: Vec<LineItem>,
    tax_rate: Percentage,
    discount_rate: Percentage,
    version: u64,
}

impl InvoiceDraft {
    /// An empty draft with the default rates (8% tax, no discount).
    pub fn empty(id: DraftId, catalog: Catalog) -> Self {
        Self {
            id,
            catalog,
            lines: Vec::new(),
            tax_rate: Percentage::new(DEFAULT_TAX_RATE),
            discount_rate: Percentage::ZERO,
            version: 0,
        }
    }

    /// Rehydrate from stored line items.
    ///
    /// Rejects rows that break the line-item invariants: duplicate ids, and
    /// negative or non-finite prices or quantities.
    pub fn from_line_items(
        id: DraftId,
        catalog: Catalog,
        lines: Vec<LineItem>,
        tax_rate: Percentage,
        discount_rate: Percentage,
    ) -> Result<Self, DomainError> {
        if let Some(line) = lines.iter().find(|l| !l.is_well_formed()) {
            return Err(DomainError::invariant(format!(
                "line item {} has a negative or non-finite price or quantity",
                line.id
            )));
        }
        if let Some(id) = first_duplicate_id(&lines) {
            return Err(DomainError::conflict(format!("duplicate line item id {id}")));
        }

        Ok(Self {
            id,
            catalog,
            lines,
            tax_rate,
            discount_rate,
            version: 0,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, line_item_id: LineItemId) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.id == line_item_id)
    }

    pub fn contains(&self, line_item_id: LineItemId) -> bool {
        self.line(line_item_id).is_some()
    }

    pub fn max_line_item_id(&self) -> Option<LineItemId> {
        self.lines.iter().map(|l| l.id).max()
    }

    pub fn tax_rate(&self) -> Percentage {
        self.tax_rate
    }

    pub fn discount_rate(&self) -> Percentage {
        self.discount_rate
    }

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::compute(&self.lines, self.tax_rate, self.discount_rate)
    }

    fn line_mut(&mut self, line_item_id: LineItemId) -> Option<&mut LineItem> {
        self.lines.iter_mut().find(|l| l.id == line_item_id)
    }
}

impl AggregateRoot for InvoiceDraft {
    type Id = DraftId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// A single-field edit of an existing line item.
///
/// Numeric values arrive as raw user input and are clamped to `>= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineItemUpdate {
    SetUnitPrice(String),
    SetQuantity(String),
    /// Writes the service id verbatim; name and price are left alone.
    /// Use `SelectService` to pull them from the catalog.
    SetServiceId(String),
}

/// Command: AddLineItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLineItem {
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SelectService.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectService {
    pub line_item_id: LineItemId,
    /// Unknown or empty ids clear the selection.
    pub service_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLineItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLineItem {
    pub line_item_id: LineItemId,
    pub update: LineItemUpdate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLineItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLineItem {
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClearLineItems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearLineItems {
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetTaxRate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTaxRate {
    pub raw: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetDiscountRate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDiscountRate {
    pub raw: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceDraftCommand {
    AddLineItem(AddLineItem),
    SelectService(SelectService),
    UpdateLineItem(UpdateLineItem),
    RemoveLineItem(RemoveLineItem),
    ClearLineItems(ClearLineItems),
    SetTaxRate(SetTaxRate),
    SetDiscountRate(SetDiscountRate),
}

/// Event: LineItemAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemAdded {
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ServiceSelected. Carries the resolved catalog values; all empty/zero
/// when the selection was cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSelected {
    pub line_item_id: LineItemId,
    pub service_id: String,
    pub service_name: String,
    pub unit_price: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UnitPriceSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPriceSet {
    pub line_item_id: LineItemId,
    pub unit_price: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantitySet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySet {
    pub line_item_id: LineItemId,
    pub quantity: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ServiceIdSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceIdSet {
    pub line_item_id: LineItemId,
    pub service_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemRemoved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRemoved {
    pub line_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineItemsCleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemsCleared {
    pub removed: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TaxRateSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateSet {
    pub rate: Percentage,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DiscountRateSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRateSet {
    pub rate: Percentage,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvoiceDraftEvent {
    LineItemAdded(LineItemAdded),
    ServiceSelected(ServiceSelected),
    UnitPriceSet(UnitPriceSet),
    QuantitySet(QuantitySet),
    ServiceIdSet(ServiceIdSet),
    LineItemRemoved(LineItemRemoved),
    LineItemsCleared(LineItemsCleared),
    TaxRateSet(TaxRateSet),
    DiscountRateSet(DiscountRateSet),
}

impl InvoiceDraftEvent {
    /// Whether the event changed the persisted line-item sequence.
    pub fn touches_line_items(&self) -> bool {
        !matches!(
            self,
            InvoiceDraftEvent::TaxRateSet(_) | InvoiceDraftEvent::DiscountRateSet(_)
        )
    }
}

impl Event for InvoiceDraftEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceDraftEvent::LineItemAdded(_) => "invoicing.line_item.added",
            InvoiceDraftEvent::ServiceSelected(_) => "invoicing.line_item.service_selected",
            InvoiceDraftEvent::UnitPriceSet(_) => "invoicing.line_item.unit_price_set",
            InvoiceDraftEvent::QuantitySet(_) => "invoicing.line_item.quantity_set",
            InvoiceDraftEvent::ServiceIdSet(_) => "invoicing.line_item.service_id_set",
            InvoiceDraftEvent::LineItemRemoved(_) => "invoicing.line_item.removed",
            InvoiceDraftEvent::LineItemsCleared(_) => "invoicing.draft.cleared",
            InvoiceDraftEvent::TaxRateSet(_) => "invoicing.draft.tax_rate_set",
            InvoiceDraftEvent::DiscountRateSet(_) => "invoicing.draft.discount_rate_set",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceDraftEvent::LineItemAdded(e) => e.occurred_at,
            InvoiceDraftEvent::ServiceSelected(e) => e.occurred_at,
            InvoiceDraftEvent::UnitPriceSet(e) => e.occurred_at,
            InvoiceDraftEvent::QuantitySet(e) => e.occurred_at,
            InvoiceDraftEvent::ServiceIdSet(e) => e.occurred_at,
            InvoiceDraftEvent::LineItemRemoved(e) => e.occurred_at,
            InvoiceDraftEvent::LineItemsCleared(e) => e.occurred_at,
            InvoiceDraftEvent::TaxRateSet(e) => e.occurred_at,
            InvoiceDraftEvent::DiscountRateSet(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InvoiceDraft {
    type Command = InvoiceDraftCommand;
    type Event = InvoiceDraftEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceDraftEvent::LineItemAdded(e) => {
                self.lines.push(LineItem::new(e.line_item_id));
            }
            InvoiceDraftEvent::ServiceSelected(e) => {
                if let Some(line) = self.line_mut(e.line_item_id) {
                    line.service_id = e.service_id.clone();
                    line.service_name = e.service_name.clone();
                    line.unit_price = e.unit_price;
                }
            }
            InvoiceDraftEvent::UnitPriceSet(e) => {
                if let Some(line) = self.line_mut(e.line_item_id) {
                    line.unit_price = e.unit_price;
                }
            }
            InvoiceDraftEvent::QuantitySet(e) => {
                if let Some(line) = self.line_mut(e.line_item_id) {
                    line.quantity = e.quantity;
                }
            }
            InvoiceDraftEvent::ServiceIdSet(e) => {
                if let Some(line) = self.line_mut(e.line_item_id) {
                    line.service_id = e.service_id.clone();
                }
            }
            InvoiceDraftEvent::LineItemRemoved(e) => {
                self.lines.retain(|l| l.id != e.line_item_id);
            }
            InvoiceDraftEvent::LineItemsCleared(_) => {
                self.lines.clear();
            }
            InvoiceDraftEvent::TaxRateSet(e) => {
                self.tax_rate = e.rate;
            }
            InvoiceDraftEvent::DiscountRateSet(e) => {
                self.discount_rate = e.rate;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceDraftCommand::AddLineItem(cmd) => self.handle_add(cmd),
            InvoiceDraftCommand::SelectService(cmd) => Ok(self.handle_select(cmd)),
            InvoiceDraftCommand::UpdateLineItem(cmd) => Ok(self.handle_update(cmd)),
            InvoiceDraftCommand::RemoveLineItem(cmd) => Ok(self.handle_remove(cmd)),
            InvoiceDraftCommand::ClearLineItems(cmd) => Ok(self.handle_clear(cmd)),
            InvoiceDraftCommand::SetTaxRate(cmd) => {
                Ok(vec![InvoiceDraftEvent::TaxRateSet(TaxRateSet {
                    rate: Percentage::from_input(&cmd.raw),
                    occurred_at: cmd.occurred_at,
                })])
            }
            InvoiceDraftCommand::SetDiscountRate(cmd) => {
                Ok(vec![InvoiceDraftEvent::DiscountRateSet(DiscountRateSet {
                    rate: Percentage::from_input(&cmd.raw),
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

impl InvoiceDraft {
    fn handle_add(&self, cmd: &AddLineItem) -> Result<Vec<InvoiceDraftEvent>, DomainError> {
        if self.contains(cmd.line_item_id) {
            return Err(DomainError::conflict(format!(
                "line item {} already exists",
                cmd.line_item_id
            )));
        }

        Ok(vec![InvoiceDraftEvent::LineItemAdded(LineItemAdded {
            line_item_id: cmd.line_item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_select(&self, cmd: &SelectService) -> Vec<InvoiceDraftEvent> {
        if !self.contains(cmd.line_item_id) {
            return vec![];
        }

        let (service_id, service_name, unit_price) = match self.catalog.get(&cmd.service_id) {
            Some(service) => (service.id.clone(), service.name.clone(), service.unit_price),
            None => (String::new(), String::new(), 0.0),
        };

        vec![InvoiceDraftEvent::ServiceSelected(ServiceSelected {
            line_item_id: cmd.line_item_id,
            service_id,
            service_name,
            unit_price,
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_update(&self, cmd: &UpdateLineItem) -> Vec<InvoiceDraftEvent> {
        if !self.contains(cmd.line_item_id) {
            return vec![];
        }

        let line_item_id = cmd.line_item_id;
        let occurred_at = cmd.occurred_at;
        let event = match &cmd.update {
            LineItemUpdate::SetUnitPrice(raw) => InvoiceDraftEvent::UnitPriceSet(UnitPriceSet {
                line_item_id,
                unit_price: parse_non_negative(raw),
                occurred_at,
            }),
            LineItemUpdate::SetQuantity(raw) => InvoiceDraftEvent::QuantitySet(QuantitySet {
                line_item_id,
                quantity: parse_non_negative(raw),
                occurred_at,
            }),
            LineItemUpdate::SetServiceId(raw) => InvoiceDraftEvent::ServiceIdSet(ServiceIdSet {
                line_item_id,
                service_id: raw.clone(),
                occurred_at,
            }),
        };
        vec![event]
    }

    fn handle_remove(&self, cmd: &RemoveLineItem) -> Vec<InvoiceDraftEvent> {
        if !self.contains(cmd.line_item_id) {
            return vec![];
        }

        vec![InvoiceDraftEvent::LineItemRemoved(LineItemRemoved {
            line_item_id: cmd.line_item_id,
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_clear(&self, cmd: &ClearLineItems) -> Vec<InvoiceDraftEvent> {
        if self.lines.is_empty() {
            return vec![];
        }

        vec![InvoiceDraftEvent::LineItemsCleared(LineItemsCleared {
            removed: self.lines.len(),
            occurred_at: cmd.occurred_at,
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoice_builder_events::execute;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_draft() -> InvoiceDraft {
        InvoiceDraft::empty(DraftId::new("invoice-items"), Catalog::standard())
    }

    fn add(draft: &mut InvoiceDraft, id: i64) -> LineItemId {
        let line_item_id = LineItemId::new(id);
        execute(
            draft,
            &InvoiceDraftCommand::AddLineItem(AddLineItem {
                line_item_id,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        line_item_id
    }

    fn select(
        draft: &mut InvoiceDraft,
        id: LineItemId,
        service_id: &str,
    ) -> Vec<InvoiceDraftEvent> {
        execute(
            draft,
            &InvoiceDraftCommand::SelectService(SelectService {
                line_item_id: id,
                service_id: service_id.to_string(),
                occurred_at: test_time(),
            }),
        )
        .unwrap()
    }

    fn update(
        draft: &mut InvoiceDraft,
        id: LineItemId,
        update: LineItemUpdate,
    ) -> Vec<InvoiceDraftEvent> {
        execute(
            draft,
            &InvoiceDraftCommand::UpdateLineItem(UpdateLineItem {
                line_item_id: id,
                update,
                occurred_at: test_time(),
            }),
        )
        .unwrap()
    }

    fn remove(draft: &mut InvoiceDraft, id: LineItemId) -> Vec<InvoiceDraftEvent> {
        execute(
            draft,
            &InvoiceDraftCommand::RemoveLineItem(RemoveLineItem {
                line_item_id: id,
                occurred_at: test_time(),
            }),
        )
        .unwrap()
    }

    fn set_rates(draft: &mut InvoiceDraft, tax: &str, discount: &str) {
        execute(
            draft,
            &InvoiceDraftCommand::SetTaxRate(SetTaxRate {
                raw: tax.to_string(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        execute(
            draft,
            &InvoiceDraftCommand::SetDiscountRate(SetDiscountRate {
                raw: discount.to_string(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
    }

    #[test]
    fn new_draft_uses_default_rates() {
        let draft = test_draft();
        assert_eq!(draft.tax_rate(), Percentage::new(8.0));
        assert_eq!(draft.discount_rate(), Percentage::ZERO);
        assert!(draft.lines().is_empty());
        assert_eq!(draft.version(), 0);
    }

    #[test]
    fn added_item_starts_unselected_and_zeroed() {
        let mut draft = test_draft();
        let id = add(&mut draft, 1);
        assert_eq!(draft.lines(), &[LineItem::new(id)]);
        assert_eq!(draft.version(), 1);
    }

    #[test]
    fn adding_an_existing_id_is_a_conflict() {
        let mut draft = test_draft();
        add(&mut draft, 7);
        let err = draft
            .handle(&InvoiceDraftCommand::AddLineItem(AddLineItem {
                line_item_id: LineItemId::new(7),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Conflict(msg) if msg.contains("already exists") => {}
            _ => panic!("Expected Conflict for duplicate line item id"),
        }
        assert_eq!(draft.lines().len(), 1);
    }

    #[test]
    fn walk60_times_three_with_default_tax() {
        let mut draft = test_draft();
        let id = add(&mut draft, 1);
        select(&mut draft, id, "walk60");
        update(&mut draft, id, LineItemUpdate::SetQuantity("3".into()));

        let line = draft.line(id).unwrap();
        assert_eq!(line.service_name, "Dog Walk – 60 min");
        assert_eq!(line.line_total().to_string(), "$90.00");

        let totals = draft.totals();
        assert_eq!(totals.subtotal.to_string(), "$90.00");
        assert_eq!(totals.tax.to_string(), "$7.20");
        assert_eq!(totals.total.to_string(), "$97.20");
    }

    #[test]
    fn dropin_and_boarding_with_ten_percent_discount() {
        let mut draft = test_draft();
        let a = add(&mut draft, 1);
        select(&mut draft, a, "dropin");
        update(&mut draft, a, LineItemUpdate::SetQuantity("2".into()));
        let b = add(&mut draft, 2);
        select(&mut draft, b, "boarding");
        update(&mut draft, b, LineItemUpdate::SetQuantity("1".into()));
        set_rates(&mut draft, "0", "10");

        assert_eq!(draft.line(a).unwrap().line_total().to_string(), "$45.00");
        let totals = draft.totals();
        assert_eq!(totals.subtotal.to_string(), "$110.00");
        assert_eq!(totals.tax.to_string(), "$0.00");
        assert_eq!(totals.discount.to_string(), "$11.00");
        assert_eq!(totals.total.to_string(), "$99.00");
    }

    #[test]
    fn removing_the_only_item_zeroes_everything() {
        let mut draft = test_draft();
        let id = add(&mut draft, 1);
        select(&mut draft, id, "walk30");
        update(&mut draft, id, LineItemUpdate::SetQuantity("2".into()));
        remove(&mut draft, id);

        assert!(draft.lines().is_empty());
        let totals = draft.totals();
        assert_eq!(totals.subtotal.amount(), 0.0);
        assert_eq!(totals.tax.amount(), 0.0);
        assert_eq!(totals.discount.amount(), 0.0);
        assert_eq!(totals.total.amount(), 0.0);
    }

    #[test]
    fn unknown_service_clears_selection_but_keeps_quantity() {
        let mut draft = test_draft();
        let id = add(&mut draft, 1);
        select(&mut draft, id, "boarding");
        update(&mut draft, id, LineItemUpdate::SetQuantity("2".into()));

        select(&mut draft, id, "grooming");
        let line = draft.line(id).unwrap();
        assert_eq!(line.service_id, "");
        assert_eq!(line.service_name, "");
        assert_eq!(line.unit_price, 0.0);
        assert_eq!(line.quantity, 2.0);

        select(&mut draft, id, "walk30");
        select(&mut draft, id, "");
        assert!(!draft.line(id).unwrap().has_service());
    }

    #[test]
    fn numeric_updates_clamp_bad_input_to_zero() {
        let mut draft = test_draft();
        let id = add(&mut draft, 1);

        update(&mut draft, id, LineItemUpdate::SetUnitPrice("-12".into()));
        assert_eq!(draft.line(id).unwrap().unit_price, 0.0);

        update(&mut draft, id, LineItemUpdate::SetUnitPrice("19.99".into()));
        assert_eq!(draft.line(id).unwrap().unit_price, 19.99);

        update(&mut draft, id, LineItemUpdate::SetQuantity("lots".into()));
        assert_eq!(draft.line(id).unwrap().quantity, 0.0);
    }

    #[test]
    fn manual_price_override_keeps_service_name() {
        let mut draft = test_draft();
        let id = add(&mut draft, 1);
        select(&mut draft, id, "walk30");
        update(&mut draft, id, LineItemUpdate::SetUnitPrice("15".into()));

        let line = draft.line(id).unwrap();
        assert_eq!(line.service_id, "walk30");
        assert_eq!(line.unit_price, 15.0);
    }

    #[test]
    fn set_service_id_writes_verbatim() {
        let mut draft = test_draft();
        let id = add(&mut draft, 1);
        select(&mut draft, id, "walk30");
        update(&mut draft, id, LineItemUpdate::SetServiceId("custom".into()));

        let line = draft.line(id).unwrap();
        assert_eq!(line.service_id, "custom");
        assert_eq!(line.service_name, "Dog Walk – 30 min");
        assert_eq!(line.unit_price, 18.0);
    }

    #[test]
    fn commands_on_missing_items_are_no_ops() {
        let mut draft = test_draft();
        add(&mut draft, 1);
        let before = draft.clone();
        let ghost = LineItemId::new(99);

        assert!(select(&mut draft, ghost, "walk30").is_empty());
        assert!(update(&mut draft, ghost, LineItemUpdate::SetQuantity("4".into())).is_empty());
        assert!(remove(&mut draft, ghost).is_empty());
        assert_eq!(draft, before);
    }

    #[test]
    fn clearing_removes_every_item_once() {
        let mut draft = test_draft();
        add(&mut draft, 1);
        add(&mut draft, 2);
        let clear = InvoiceDraftCommand::ClearLineItems(ClearLineItems {
            occurred_at: test_time(),
        });

        let events = execute(&mut draft, &clear).unwrap();
        assert!(matches!(
            events.as_slice(),
            [InvoiceDraftEvent::LineItemsCleared(LineItemsCleared { removed: 2, .. })]
        ));
        assert!(draft.lines().is_empty());
        assert!(execute(&mut draft, &clear).unwrap().is_empty());
    }

    #[test]
    fn rate_inputs_are_clamped() {
        let mut draft = test_draft();
        set_rates(&mut draft, "-5", "abc");
        assert_eq!(draft.tax_rate(), Percentage::ZERO);
        assert_eq!(draft.discount_rate(), Percentage::ZERO);
    }

    #[test]
    fn only_rate_events_skip_persistence() {
        let mut draft = test_draft();
        let id = add(&mut draft, 1);
        let events = select(&mut draft, id, "walk30");
        assert!(events.iter().all(InvoiceDraftEvent::touches_line_items));

        let rate = draft
            .handle(&InvoiceDraftCommand::SetTaxRate(SetTaxRate {
                raw: "5".into(),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert!(!rate[0].touches_line_items());
        assert_eq!(rate[0].event_type(), "invoicing.draft.tax_rate_set");
    }

    #[test]
    fn rehydration_rejects_duplicate_ids() {
        let lines = vec![LineItem::new(LineItemId::new(1)), LineItem::new(LineItemId::new(1))];
        let err = InvoiceDraft::from_line_items(
            DraftId::new("invoice-items"),
            Catalog::standard(),
            lines,
            Percentage::new(8.0),
            Percentage::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn rehydration_rejects_negative_quantities() {
        let mut line = LineItem::new(LineItemId::new(1));
        line.quantity = -1.0;
        let err = InvoiceDraft::from_line_items(
            DraftId::new("invoice-items"),
            Catalog::standard(),
            vec![line],
            Percentage::new(8.0),
            Percentage::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn rehydration_keeps_order_and_stored_prices() {
        let mut a = LineItem::new(LineItemId::new(20));
        a.select(Catalog::standard().get("walk60").unwrap());
        a.unit_price = 28.0;
        let b = LineItem::new(LineItemId::new(10));

        let draft = InvoiceDraft::from_line_items(
            DraftId::new("invoice-items"),
            Catalog::standard(),
            vec![a.clone(), b.clone()],
            Percentage::new(8.0),
            Percentage::ZERO,
        )
        .unwrap();
        assert_eq!(draft.lines(), &[a, b]);
        assert_eq!(draft.max_line_item_id(), Some(LineItemId::new(20)));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add,
            Select(usize, String),
            Price(usize, String),
            Quantity(usize, String),
            Remove(usize),
        }

        fn arb_service_id() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("walk30".to_string()),
                Just("walk60".to_string()),
                Just("dropin".to_string()),
                Just("boarding".to_string()),
                Just(String::new()),
                "[a-z]{1,8}",
            ]
        }

        fn arb_raw_number() -> impl Strategy<Value = String> {
            prop_oneof![
                (0.0f64..1000.0).prop_map(|v| v.to_string()),
                (-1000.0f64..0.0).prop_map(|v| v.to_string()),
                "[a-z ]{0,6}",
                Just("NaN".to_string()),
            ]
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Add),
                (any::<usize>(), arb_service_id()).prop_map(|(i, s)| Op::Select(i, s)),
                (any::<usize>(), arb_raw_number()).prop_map(|(i, r)| Op::Price(i, r)),
                (any::<usize>(), arb_raw_number()).prop_map(|(i, r)| Op::Quantity(i, r)),
                any::<usize>().prop_map(Op::Remove),
            ]
        }

        /// Pick an existing id, or an id that was never issued.
        fn target(draft: &InvoiceDraft, pick: usize) -> LineItemId {
            let lines = draft.lines();
            if lines.is_empty() || pick % 5 == 0 {
                LineItemId::new(-1)
            } else {
                lines[pick % lines.len()].id
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: ids stay unique and values stay non-negative under any op sequence.
            #[test]
            fn ids_unique_and_values_non_negative(ops in prop::collection::vec(arb_op(), 0..60)) {
                let mut draft = test_draft();
                let mut next_id = 0i64;

                for op in ops {
                    match op {
                        Op::Add => {
                            next_id += 1;
                            add(&mut draft, next_id);
                        }
                        Op::Select(i, s) => {
                            let id = target(&draft, i);
                            select(&mut draft, id, &s);
                        }
                        Op::Price(i, raw) => {
                            let id = target(&draft, i);
                            update(&mut draft, id, LineItemUpdate::SetUnitPrice(raw));
                        }
                        Op::Quantity(i, raw) => {
                            let id = target(&draft, i);
                            update(&mut draft, id, LineItemUpdate::SetQuantity(raw));
                        }
                        Op::Remove(i) => {
                            let id = target(&draft, i);
                            remove(&mut draft, id);
                        }
                    }

                    let mut ids: Vec<LineItemId> = draft.lines().iter().map(|l| l.id).collect();
                    let count = ids.len();
                    ids.sort();
                    ids.dedup();
                    prop_assert_eq!(ids.len(), count);
                    prop_assert!(draft.lines().iter().all(LineItem::is_well_formed));
                }
            }

            /// Property: negative or non-numeric price/quantity input is stored as 0.
            #[test]
            fn bad_numeric_input_stores_zero(
                raw in prop_oneof![
                    (-1.0e9f64..-1.0e-9).prop_map(|v| v.to_string()),
                    "[a-zA-Z_]{1,10}",
                ]
            ) {
                let mut draft = test_draft();
                let id = add(&mut draft, 1);
                update(&mut draft, id, LineItemUpdate::SetUnitPrice("5".into()));
                update(&mut draft, id, LineItemUpdate::SetQuantity("5".into()));

                update(&mut draft, id, LineItemUpdate::SetUnitPrice(raw.clone()));
                update(&mut draft, id, LineItemUpdate::SetQuantity(raw));
                let line = draft.line(id).unwrap();
                prop_assert_eq!(line.unit_price, 0.0);
                prop_assert_eq!(line.quantity, 0.0);
            }

            /// Property: selection copies catalog values exactly or clears them.
            #[test]
            fn selection_mirrors_catalog(service_id in arb_service_id()) {
                let mut draft = test_draft();
                let id = add(&mut draft, 1);
                update(&mut draft, id, LineItemUpdate::SetUnitPrice("123".into()));
                select(&mut draft, id, &service_id);

                let line = draft.line(id).unwrap();
                match Catalog::standard().get(&service_id) {
                    Some(service) => {
                        prop_assert_eq!(&line.service_id, &service.id);
                        prop_assert_eq!(&line.service_name, &service.name);
                        prop_assert_eq!(line.unit_price, service.unit_price);
                    }
                    None => {
                        prop_assert_eq!(line.service_id.as_str(), "");
                        prop_assert_eq!(line.service_name.as_str(), "");
                        prop_assert_eq!(line.unit_price, 0.0);
                    }
                }
            }
        }
    }
}
