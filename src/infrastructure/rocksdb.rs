use super::record::AccountRecord;
use crate::domain::account::Account;
use crate::domain::id::AccountNumber;
use crate::domain::ports::SnapshotStore;
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Column Family holding one JSON account record per account number.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family holding each account's journal as a JSON array, keyed by account number.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent snapshot store using RocksDB.
///
/// Each save is written as a single `WriteBatch`, so a crash never leaves
/// half of a snapshot behind. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbSnapshotStore {
    db: Arc<DB>,
}

impl RocksDbSnapshotStore {
    /// Opens or creates a RocksDB instance at `path` with both column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_transactions])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn column(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::Io(std::io::Error::other(format!(
                "{name} column family not found"
            )))
        })
    }
}

#[async_trait]
impl SnapshotStore for RocksDbSnapshotStore {
    async fn save_accounts(&self, accounts: &[Account]) -> Result<()> {
        let cf = self.column(CF_ACCOUNTS)?;
        let mut batch = WriteBatch::default();
        for account in accounts {
            let value = serde_json::to_vec(&AccountRecord::from(account))?;
            batch.put_cf(&cf, account.number.as_str(), value);
        }
        self.db.write(batch)?;
        Ok(())
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        let mut by_account: HashMap<&AccountNumber, Vec<&Transaction>> = HashMap::new();
        for transaction in transactions {
            by_account
                .entry(&transaction.account_number)
                .or_default()
                .push(transaction);
        }

        let cf = self.column(CF_TRANSACTIONS)?;
        let mut batch = WriteBatch::default();
        for (number, history) in by_account {
            batch.put_cf(&cf, number.as_str(), serde_json::to_vec(&history)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    async fn load_accounts(&self) -> Result<HashMap<AccountNumber, Account>> {
        let handle = self.column(CF_ACCOUNTS)?;
        let mut customers = HashMap::new();
        let mut accounts = HashMap::new();

        for item in self.db.iterator_cf(handle, IteratorMode::Start) {
            let (_key, value) = item?;
            let record: AccountRecord = serde_json::from_slice(&value)?;
            let account = record.into_account(&mut customers)?;
            accounts.insert(account.number.clone(), account);
        }

        Ok(accounts)
    }

    async fn load_transactions(&self) -> Result<HashMap<AccountNumber, Vec<Transaction>>> {
        let handle = self.column(CF_TRANSACTIONS)?;
        let mut by_account = HashMap::new();

        for item in self.db.iterator_cf(handle, IteratorMode::Start) {
            let (key, value) = item?;
            let number = AccountNumber::new(String::from_utf8_lossy(&key));
            let history: Vec<Transaction> = serde_json::from_slice(&value)?;
            by_account.insert(number, history);
        }

        Ok(by_account)
    }
}
