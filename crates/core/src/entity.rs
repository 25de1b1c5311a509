//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Line items and field representatives are entities: they are compared and
/// looked up by id even as their other attributes change.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
