use serde::{Deserialize, Serialize};

use dispatchdesk_core::{DomainError, DomainResult, ValueObject};

/// Customer an invoice is billed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> DomainResult<Self> {
        let name = required(name.into(), "customer name")?;
        Ok(Self {
            name,
            phone: phone.into().trim().to_string(),
        })
    }
}

impl ValueObject for Customer {}

/// Supplier an outsourced purchase order is placed with.
///
/// Both name and phone are required: the phone is how payments are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    pub phone: String,
}

impl Supplier {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            name: required(name.into(), "supplier name")?,
            phone: required(phone.into(), "supplier phone")?,
        })
    }
}

impl ValueObject for Supplier {}

fn required(value: String, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}
