//! Entity trait: identity that survives edits.

/// Something with an id that stays fixed while its other fields change
/// (a line item keeps its id through service, price and quantity edits).
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

/// The first id that occurs more than once in `entities`, in slice order.
pub fn first_duplicate_id<E: Entity>(entities: &[E]) -> Option<&E::Id> {
    let mut seen = std::collections::HashSet::with_capacity(entities.len());
    entities.iter().map(Entity::id).find(|id| !seen.insert(*id))
}
