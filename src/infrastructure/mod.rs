//! Storage adapters: the in-memory ledger and journal, plus snapshot stores
//! implementing [`crate::domain::ports::SnapshotStore`].

pub mod csv_snapshot;
pub mod in_memory;
mod record;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
