//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one. A recorded supplier payment is the canonical example here:
/// once logged it never changes, and two payments with identical fields are
/// indistinguishable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
