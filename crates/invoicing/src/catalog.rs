//! The fixed service catalog.

use serde::{Deserialize, Serialize};

use invoice_builder_core::{DomainError, DomainResult, ValueObject};

/// A purchasable service and its unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub unit_price: f64,
}

impl ValueObject for Service {}

impl Service {
    fn new(id: &str, name: &str, unit_price: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            unit_price,
        }
    }
}

/// Ordered list of services, looked up by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    services: Vec<Service>,
}

impl Catalog {
    /// Build a catalog, enforcing unique ids and non-negative prices.
    pub fn new(services: Vec<Service>) -> DomainResult<Self> {
        for (i, service) in services.iter().enumerate() {
            if service.id.is_empty() {
                return Err(DomainError::validation("service id must not be empty"));
            }
            if !(service.unit_price.is_finite() && service.unit_price >= 0.0) {
                return Err(DomainError::validation(format!(
                    "service {} has an invalid unit price",
                    service.id
                )));
            }
            if services[..i].iter().any(|s| s.id == service.id) {
                return Err(DomainError::conflict(format!(
                    "duplicate service id {}",
                    service.id
                )));
            }
        }
        Ok(Self { services })
    }

    /// The pet-care services offered on every invoice.
    pub fn standard() -> Self {
        Self {
            services: vec![
                Service::new("walk30", "Dog Walk – 30 min", 18.0),
                Service::new("walk60", "Dog Walk – 60 min", 30.0),
                Service::new("dropin", "Drop-in Visit", 22.5),
                Service::new("boarding", "Overnight Boarding (per night)", 65.0),
            ],
        }
    }

    pub fn get(&self, service_id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == service_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_the_four_services_in_order() {
        let catalog = Catalog::standard();
        let ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["walk30", "walk60", "dropin", "boarding"]);

        let prices: Vec<f64> = catalog.iter().map(|s| s.unit_price).collect();
        assert_eq!(prices, vec![18.0, 30.0, 22.5, 65.0]);
    }

    #[test]
    fn lookup_misses_unknown_and_empty_ids() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.get("dropin").map(|s| s.unit_price), Some(22.5));
        assert!(catalog.get("").is_none());
        assert!(catalog.get("WALK30").is_none());
    }

    #[test]
    fn custom_catalog_rejects_duplicates_and_negative_prices() {
        let dup = Catalog::new(vec![
            Service::new("a", "A", 1.0),
            Service::new("a", "A again", 2.0),
        ]);
        assert!(matches!(dup, Err(DomainError::Conflict(_))));

        let negative = Catalog::new(vec![Service::new("a", "A", -1.0)]);
        assert!(matches!(negative, Err(DomainError::Validation(_))));
    }
}
