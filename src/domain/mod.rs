//! Domain layer: value objects, entities and the persistence port.
//!
//! Nothing in here knows about locking or threads. Accounts enforce their own
//! balance rules and transactions are plain values.

pub mod account;
pub mod customer;
pub mod id;
pub mod money;
pub mod ports;
pub mod transaction;
