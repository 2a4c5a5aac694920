use super::id::CustomerId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum CustomerCategory {
    Regular,
    Premium,
}

impl fmt::Display for CustomerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomerCategory::Regular => f.write_str("Regular"),
            CustomerCategory::Premium => f.write_str("Premium"),
        }
    }
}

/// Details supplied by the caller when registering a customer.
///
/// Input formatting (names, phone numbers, addresses) is validated upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub age: u8,
    pub contact: String,
    pub address: String,
    pub category: CustomerCategory,
}

/// An account holder. Immutable once registered and shared read-only
/// between every account that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub age: u8,
    pub contact: String,
    pub address: String,
    pub category: CustomerCategory,
}

impl Customer {
    pub fn new(id: CustomerId, details: NewCustomer) -> Self {
        Self {
            id,
            name: details.name,
            age: details.age,
            contact: details.contact,
            address: details.address,
            category: details.category,
        }
    }

    pub fn is_premium(&self) -> bool {
        self.category == CustomerCategory::Premium
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}
