//! `invoice-builder-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no terminal IO).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::{Entity, first_duplicate_id};
pub use error::{DomainError, DomainResult};
pub use id::{ClockIdGenerator, IdGenerator, SequentialIdGenerator};
pub use money::{Money, Percentage, parse_non_negative};
pub use value_object::ValueObject;
