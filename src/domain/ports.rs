use super::account::Account;
use super::id::AccountNumber;
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Persists point-in-time snapshots of the ledger and journal.
///
/// This is not a transaction log: a snapshot is written on demand and read
/// back once at startup to rehydrate the in-memory stores.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save_accounts(&self, accounts: &[Account]) -> Result<()>;
    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<()>;
    async fn load_accounts(&self) -> Result<HashMap<AccountNumber, Account>>;
    async fn load_transactions(&self) -> Result<HashMap<AccountNumber, Vec<Transaction>>>;
}

pub type SnapshotStoreBox = Box<dyn SnapshotStore>;
