use super::record::AccountRecord;
use crate::domain::account::Account;
use crate::domain::id::AccountNumber;
use crate::domain::ports::SnapshotStore;
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ACCOUNTS_FILE: &str = "accounts.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

/// Snapshot store backed by two CSV files in a directory.
///
/// Every save rewrites its file from scratch. A missing file loads as an
/// empty snapshot, so a fresh directory behaves like a new bank.
#[derive(Debug, Clone)]
pub struct CsvSnapshotStore {
    dir: PathBuf,
}

impl CsvSnapshotStore {
    /// Uses `dir` for the snapshot files, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn accounts_path(&self) -> PathBuf {
        self.dir.join(ACCOUNTS_FILE)
    }

    fn transactions_path(&self) -> PathBuf {
        self.dir.join(TRANSACTIONS_FILE)
    }
}

fn reader(path: &Path) -> Result<csv::Reader<fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?)
}

#[async_trait]
impl SnapshotStore for CsvSnapshotStore {
    async fn save_accounts(&self, accounts: &[Account]) -> Result<()> {
        let mut writer = csv::Writer::from_path(self.accounts_path())?;
        for account in accounts {
            writer.serialize(AccountRecord::from(account))?;
        }
        writer.flush()?;
        Ok(())
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        let mut writer = csv::Writer::from_path(self.transactions_path())?;
        for transaction in transactions {
            writer.serialize(transaction)?;
        }
        writer.flush()?;
        Ok(())
    }

    async fn load_accounts(&self) -> Result<HashMap<AccountNumber, Account>> {
        let path = self.accounts_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let mut customers = HashMap::new();
        let mut accounts = HashMap::new();
        for record in reader(&path)?.into_deserialize::<AccountRecord>() {
            let account = record?.into_account(&mut customers)?;
            let number = account.number.clone();
            if accounts.insert(number.clone(), account).is_some() {
                return Err(LedgerError::DuplicateAccountNumber(number.to_string()));
            }
        }
        Ok(accounts)
    }

    async fn load_transactions(&self) -> Result<HashMap<AccountNumber, Vec<Transaction>>> {
        let path = self.transactions_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let mut by_account: HashMap<AccountNumber, Vec<Transaction>> = HashMap::new();
        for transaction in reader(&path)?.into_deserialize::<Transaction>() {
            let transaction = transaction?;
            by_account
                .entry(transaction.account_number.clone())
                .or_default()
                .push(transaction);
        }
        Ok(by_account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::application::banking::BankingService;
    use crate::domain::account::AccountType;
    use crate::domain::customer::{CustomerCategory, NewCustomer};
    use crate::domain::money::{Amount, Balance};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    async fn populated_service() -> BankingService {
        let service = BankingService::new(LedgerConfig::default());
        let customer = service.register_customer(NewCustomer {
            name: "Efua Asante".to_string(),
            age: 39,
            contact: "+233555000111".to_string(),
            address: "Sunyani".to_string(),
            category: CustomerCategory::Regular,
        })
        .unwrap();
        service
            .open_account(
                AccountType::Savings,
                customer.clone(),
                Amount::new(dec!(800)).unwrap(),
            )
            .await
            .unwrap();
        let (checking, _) = service
            .open_account(AccountType::Checking, customer, Amount::new(dec!(50)).unwrap())
            .await
            .unwrap();

        let handle = service.account_handle(&checking.number).await.unwrap();
        let withdrawal = service
            .propose_withdrawal(&checking, Amount::new(dec!(120.25)).unwrap())
            .unwrap();
        service.confirm(&handle, withdrawal).await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let dir = tempdir().unwrap();
        let store = CsvSnapshotStore::open(dir.path().join("snapshot")).unwrap();

        assert!(store.load_accounts().await.unwrap().is_empty());
        assert!(store.load_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_snapshot() {
        let dir = tempdir().unwrap();
        let store = CsvSnapshotStore::open(dir.path()).unwrap();
        let service = populated_service().await;

        let accounts = service.view_all_accounts().await;
        let transactions = service.view_all_transactions().await;
        store.save_accounts(&accounts).await.unwrap();
        store.save_transactions(&transactions).await.unwrap();

        let loaded_accounts = store.load_accounts().await.unwrap();
        let loaded_transactions = store.load_transactions().await.unwrap();

        assert_eq!(loaded_accounts.len(), 2);
        let checking = &loaded_accounts[&AccountNumber::from("ACC002")];
        assert_eq!(checking.balance(), Balance::new(dec!(-70.25)));
        assert_eq!(checking, &accounts[1]);
        assert_eq!(loaded_transactions[&AccountNumber::from("ACC002")].len(), 2);
        assert_eq!(
            loaded_transactions[&AccountNumber::from("ACC002")][1],
            transactions[2]
        );

        let restored = BankingService::new(LedgerConfig::default());
        restored
            .restore(loaded_accounts, loaded_transactions)
            .await
            .unwrap();
        assert!(restored.reconcile().await.unwrap().is_empty());
        assert_eq!(
            restored.get_total_bank_balance().await.unwrap(),
            service.get_total_bank_balance().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_duplicate_account_rows_are_rejected() {
        let dir = tempdir().unwrap();
        let store = CsvSnapshotStore::open(dir.path()).unwrap();
        let service = populated_service().await;

        let mut accounts = service.view_all_accounts().await;
        accounts.push(accounts[0].clone());
        store.save_accounts(&accounts).await.unwrap();

        let result = store.load_accounts().await;
        assert!(matches!(result, Err(LedgerError::DuplicateAccountNumber(_))));
    }
}
