use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dispatchdesk_core::{DomainError, DomainResult, Entity, FieldRepId};

/// A field representative holding a pool of stock out in the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRep {
    pub id: FieldRepId,
    pub name: String,
    pub phone: String,
    /// Area the rep operates in (e.g. "Westlands").
    pub location: String,
}

impl FieldRep {
    pub fn new(
        id: FieldRepId,
        name: impl Into<String>,
        phone: impl Into<String>,
        location: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("field rep name cannot be empty"));
        }
        Ok(Self {
            id,
            name: name.trim().to_string(),
            phone: phone.into(),
            location: location.into(),
        })
    }
}

impl Entity for FieldRep {
    type Id = FieldRepId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Read-only directory of field representatives, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRepRoster {
    reps: BTreeMap<FieldRepId, FieldRep>,
}

impl FieldRepRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster; duplicate ids are rejected.
    pub fn from_reps(reps: impl IntoIterator<Item = FieldRep>) -> DomainResult<Self> {
        let mut roster = Self::new();
        for rep in reps {
            if roster.reps.contains_key(&rep.id) {
                return Err(DomainError::conflict(format!("duplicate field rep id {}", rep.id)));
            }
            roster.reps.insert(rep.id.clone(), rep);
        }
        Ok(roster)
    }

    pub fn get(&self, id: &FieldRepId) -> Option<&FieldRep> {
        self.reps.get(id)
    }

    pub fn contains(&self, id: &FieldRepId) -> bool {
        self.reps.contains_key(id)
    }

    /// Reps in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldRep> {
        self.reps.values()
    }

    pub fn len(&self) -> usize {
        self.reps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }
}
