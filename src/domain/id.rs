use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ACCOUNT_PREFIX: &str = "ACC";
pub const TRANSACTION_PREFIX: &str = "TXN";
pub const CUSTOMER_PREFIX: &str = "CUS";
pub const ID_WIDTH: usize = 3;

/// Issues sequential identifiers such as `ACC001` or `TXN042`.
///
/// The generator owns its counter and is not synchronised; whoever holds it
/// is responsible for serialising access. When resuming from a snapshot,
/// [`IdGenerator::seed_counter`] must run before the first `generate_id`.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: &'static str,
    width: usize,
    counter: u32,
}

impl IdGenerator {
    pub fn new(prefix: &'static str, width: usize) -> Self {
        Self {
            prefix,
            width,
            counter: 0,
        }
    }

    pub fn accounts() -> Self {
        Self::new(ACCOUNT_PREFIX, ID_WIDTH)
    }

    pub fn transactions() -> Self {
        Self::new(TRANSACTION_PREFIX, ID_WIDTH)
    }

    pub fn customers() -> Self {
        Self::new(CUSTOMER_PREFIX, ID_WIDTH)
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Returns the next identifier. Indices start at 1 and grow past the
    /// configured width once it is exhausted (`ACC999` is followed by `ACC1000`).
    /// Fails once the `u32` index space is used up; the counter is left as is.
    pub fn generate_id(&mut self) -> Result<String> {
        self.counter = self.counter.checked_add(1).ok_or_else(|| {
            LedgerError::CapacityExceeded(format!("no {} ids left to issue", self.prefix))
        })?;
        Ok(format!("{}{:0width$}", self.prefix, self.counter, width = self.width))
    }

    /// Number of identifiers issued so far (or the seeded high-water mark).
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Parses the numeric suffix of an identifier issued with this prefix.
    pub fn extract_index(&self, id: &str) -> Result<u32> {
        let malformed = || LedgerError::MalformedId(format!("{id} is not a valid {} id", self.prefix));

        let suffix = id.strip_prefix(self.prefix).ok_or_else(malformed)?;
        if suffix.len() < self.width || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        suffix.parse().map_err(|_| malformed())
    }

    /// Raises the counter to `max_index` so future ids never collide with
    /// previously issued ones. Never lowers it.
    pub fn seed_counter(&mut self, max_index: u32) {
        self.counter = self.counter.max(max_index);
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Unique key of an account in the ledger, e.g. `ACC001`.
    AccountNumber
);
string_id!(
    /// Identifier of a proposed or confirmed transaction, e.g. `TXN001`.
    TransactionId
);
string_id!(CustomerId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sequential_ids() {
        let mut generator = IdGenerator::accounts();
        assert_eq!(generator.generate_id().unwrap(), "ACC001");
        assert_eq!(generator.generate_id().unwrap(), "ACC002");
        assert_eq!(generator.counter(), 2);
    }

    #[test]
    fn test_extract_index_round_trip() {
        let mut generator = IdGenerator::transactions();
        for expected in 1..=25 {
            let id = generator.generate_id().unwrap();
            assert_eq!(generator.extract_index(&id).unwrap(), expected);
            assert_eq!(generator.counter(), expected);
        }
    }

    #[test]
    fn test_extract_index_rejects_malformed() {
        let generator = IdGenerator::accounts();
        for bad in ["TXN001", "ACC", "ACC01", "ACC0x1", "acc001", "ACC-01", ""] {
            assert!(
                matches!(generator.extract_index(bad), Err(LedgerError::MalformedId(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_ids_grow_past_width() {
        let mut generator = IdGenerator::accounts();
        generator.seed_counter(999);
        let id = generator.generate_id().unwrap();
        assert_eq!(id, "ACC1000");
        assert_eq!(generator.extract_index(&id).unwrap(), 1000);
    }

    #[test]
    fn test_seed_counter_avoids_collisions() {
        let mut generator = IdGenerator::customers();
        generator.seed_counter(7);
        assert_eq!(generator.generate_id().unwrap(), "CUS008");

        // Seeding below the current counter is ignored.
        generator.seed_counter(3);
        assert_eq!(generator.generate_id().unwrap(), "CUS009");
    }

    #[test]
    fn test_exhausted_index_space() {
        let mut generator = IdGenerator::accounts();
        let index = generator.extract_index("ACC4294967295").unwrap();
        assert_eq!(index, u32::MAX);
        generator.seed_counter(index);

        let result = generator.generate_id();
        assert!(matches!(result, Err(LedgerError::CapacityExceeded(_))));
        assert_eq!(generator.counter(), u32::MAX);

        assert!(matches!(
            generator.extract_index("ACC4294967296"),
            Err(LedgerError::MalformedId(_))
        ));
    }
}
