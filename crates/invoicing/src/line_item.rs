use core::str::FromStr;

use serde::{Deserialize, Serialize};

use invoice_builder_core::{DomainError, Entity, Money};

use crate::catalog::Service;

/// Line item identifier, unique within a draft for its whole lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(i64);

impl LineItemId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for LineItemId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for LineItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|e| DomainError::invalid_id(format!("LineItemId: {e}")))?;
        Ok(Self(id))
    }
}

/// One row of the invoice.
///
/// Service name and unit price are copied from the catalog when the service is
/// selected, so a stored row keeps its price even if the catalog changes.
/// Field names in the serialized form are camelCase
/// (`id`, `serviceId`, `serviceName`, `unitPrice`, `quantity`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    /// Empty when no service is selected.
    pub service_id: String,
    pub service_name: String,
    pub unit_price: f64,
    pub quantity: f64,
}

impl LineItem {
    /// A fresh, unselected row.
    pub fn new(id: LineItemId) -> Self {
        Self {
            id,
            service_id: String::new(),
            service_name: String::new(),
            unit_price: 0.0,
            quantity: 0.0,
        }
    }

    pub fn has_service(&self) -> bool {
        !self.service_id.is_empty()
    }

    /// Copy name and price from the catalog entry.
    pub fn select(&mut self, service: &Service) {
        self.service_id = service.id.clone();
        self.service_name = service.name.clone();
        self.unit_price = service.unit_price;
    }

    pub fn clear_service(&mut self) {
        self.service_id.clear();
        self.service_name.clear();
        self.unit_price = 0.0;
    }

    pub fn line_total(&self) -> Money {
        Money::new(self.unit_price * self.quantity)
    }

    /// Price and quantity are finite and non-negative.
    pub fn is_well_formed(&self) -> bool {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        ok(self.unit_price) && ok(self.quantity)
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
