//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values.
/// `Money(30.0)` is a value object; a line item with an id is an entity.
///
/// Value objects are immutable: to "modify" one, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
