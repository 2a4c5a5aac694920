use crate::domain::account::Account;
use crate::domain::id::AccountNumber;
use crate::domain::money::Balance;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Shared, individually lockable reference to one account in the ledger.
///
/// Every balance change goes through [`AccountHandle::lock`], which gives the
/// holder exclusive access to that account while leaving the rest of the
/// ledger available to other workers.
#[derive(Debug, Clone)]
pub struct AccountHandle {
    number: AccountNumber,
    account: Arc<Mutex<Account>>,
}

impl AccountHandle {
    fn new(account: Account) -> Self {
        Self {
            number: account.number.clone(),
            account: Arc::new(Mutex::new(account)),
        }
    }

    pub fn number(&self) -> &AccountNumber {
        &self.number
    }

    /// Returns a copy of the account as of the last committed change.
    pub async fn snapshot(&self) -> Account {
        self.account.lock().await.clone()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Account> {
        self.account.lock().await
    }
}

/// Orders account numbers naturally so `ACC1000` sorts after `ACC999`.
fn natural_key(number: &AccountNumber) -> (usize, &str) {
    (number.as_str().len(), number.as_str())
}

/// The in-memory account store, keyed by account number.
///
/// Uses `Arc<RwLock<HashMap<..>>>` for the map itself and a mutex per account
/// for balances, so lookups proceed concurrently with writes to other accounts.
#[derive(Default, Clone)]
pub struct Ledger {
    accounts: Arc<RwLock<HashMap<AccountNumber, AccountHandle>>>,
    max_accounts: Option<usize>,
}

impl Ledger {
    /// Creates a new, empty, unbounded ledger.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(max_accounts: Option<usize>) -> Self {
        Self {
            accounts: Arc::default(),
            max_accounts,
        }
    }

    /// Registers a new account and returns its handle.
    pub async fn insert(&self, account: Account) -> Result<AccountHandle> {
        let mut accounts = self.accounts.write().await;
        self.check_room(accounts.len(), 1)?;
        if accounts.contains_key(&account.number) {
            return Err(LedgerError::DuplicateAccountNumber(account.number.to_string()));
        }

        let handle = AccountHandle::new(account);
        accounts.insert(handle.number.clone(), handle.clone());
        Ok(handle)
    }

    pub async fn get(&self, number: &AccountNumber) -> Result<AccountHandle> {
        let accounts = self.accounts.read().await;
        accounts
            .get(number)
            .cloned()
            .ok_or_else(|| LedgerError::AccountNotFound(number.to_string()))
    }

    /// Copies of every account, in account-number order.
    ///
    /// Accounts are locked one at a time. Each copy is consistent, but the set
    /// is not a point-in-time view while other tasks are confirming.
    pub async fn all_accounts(&self) -> Vec<Account> {
        let accounts = self.accounts.read().await;
        let mut snapshot = Vec::with_capacity(accounts.len());
        for handle in accounts.values() {
            snapshot.push(handle.snapshot().await);
        }
        snapshot.sort_by(|a, b| natural_key(&a.number).cmp(&natural_key(&b.number)));
        snapshot
    }

    /// Sum of all balances, locking one account at a time like
    /// [`Ledger::all_accounts`]. Fails if the sum leaves the decimal range.
    pub async fn total_balance(&self) -> Result<Balance> {
        let accounts = self.accounts.read().await;
        let mut total = Balance::ZERO;
        for handle in accounts.values() {
            total = total.try_add(handle.lock().await.balance())?;
        }
        Ok(total)
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    /// Rehydrates the ledger from a snapshot. Fails without inserting anything
    /// if an account number is already present or the limit would be exceeded.
    pub async fn load(&self, loaded: HashMap<AccountNumber, Account>) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        self.check_room(accounts.len(), loaded.len())?;
        if let Some(existing) = loaded.keys().find(|number| accounts.contains_key(*number)) {
            return Err(LedgerError::DuplicateAccountNumber(existing.to_string()));
        }

        if let Some((number, account)) = loaded.iter().find(|(number, account)| **number != account.number) {
            return Err(LedgerError::AccountMismatch {
                expected: number.to_string(),
                found: account.number.to_string(),
            });
        }

        for (number, account) in loaded {
            accounts.insert(number, AccountHandle::new(account));
        }
        Ok(())
    }

    /// Fails if `adding` more accounts would exceed the limit.
    pub async fn ensure_room(&self, adding: usize) -> Result<()> {
        self.check_room(self.len().await, adding)
    }

    /// Drops accounts inserted by a load that could not be completed.
    pub(crate) async fn unload(&self, numbers: &[AccountNumber]) {
        let mut accounts = self.accounts.write().await;
        for number in numbers {
            accounts.remove(number);
        }
    }

    fn check_room(&self, current: usize, adding: usize) -> Result<()> {
        match self.max_accounts {
            Some(max) if current + adding > max => Err(LedgerError::CapacityExceeded(format!(
                "cannot add account: maximum of {max} accounts reached"
            ))),
            _ => Ok(()),
        }
    }
}

/// A confirmed-transaction history per account.
#[derive(Default)]
struct JournalEntries {
    by_account: HashMap<AccountNumber, Vec<Transaction>>,
    count: usize,
}

/// The in-memory store of confirmed transactions, indexed by account.
///
/// Entries are only ever appended. Callers are expected to hold the target
/// account's lock while appending so history order matches balance order.
#[derive(Default, Clone)]
pub struct TransactionJournal {
    entries: Arc<RwLock<JournalEntries>>,
    max_transactions: Option<usize>,
}

impl TransactionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(max_transactions: Option<usize>) -> Self {
        Self {
            entries: Arc::default(),
            max_transactions,
        }
    }

    pub async fn append(&self, transaction: Transaction) -> Result<()> {
        let mut entries = self.entries.write().await;
        self.check_room(entries.count, 1)?;
        entries
            .by_account
            .entry(transaction.account_number.clone())
            .or_default()
            .push(transaction);
        entries.count += 1;
        Ok(())
    }

    pub async fn transactions_for(&self, number: &AccountNumber) -> Vec<Transaction> {
        let entries = self.entries.read().await;
        entries.by_account.get(number).cloned().unwrap_or_default()
    }

    /// Every confirmed transaction, grouped by account in account-number order.
    pub async fn all_transactions(&self) -> Vec<Transaction> {
        let entries = self.entries.read().await;
        let mut numbers: Vec<&AccountNumber> = entries.by_account.keys().collect();
        numbers.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        numbers
            .into_iter()
            .flat_map(|number| entries.by_account[number].iter().cloned())
            .collect()
    }

    pub async fn total_for(&self, number: &AccountNumber, kind: TransactionType) -> Result<Balance> {
        let entries = self.entries.read().await;
        Balance::try_sum(
            entries
                .by_account
                .get(number)
                .into_iter()
                .flatten()
                .filter(|transaction| transaction.r#type == kind)
                .map(|transaction| Balance::from(transaction.amount)),
        )
    }

    /// Sum of signed amounts for one account: what its balance must equal.
    pub async fn net_change(&self, number: &AccountNumber) -> Result<Balance> {
        let entries = self.entries.read().await;
        Balance::try_sum(
            entries
                .by_account
                .get(number)
                .into_iter()
                .flatten()
                .map(Transaction::signed_amount),
        )
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.count
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Rehydrates the journal from a snapshot, appending to any existing history.
    pub async fn load(&self, loaded: HashMap<AccountNumber, Vec<Transaction>>) -> Result<()> {
        let mut entries = self.entries.write().await;
        let adding: usize = loaded.values().map(Vec::len).sum();
        self.check_room(entries.count, adding)?;

        for (number, transactions) in &loaded {
            if let Some(stray) = transactions.iter().find(|t| t.account_number != *number) {
                return Err(LedgerError::AccountMismatch {
                    expected: number.to_string(),
                    found: stray.account_number.to_string(),
                });
            }
        }

        for (number, transactions) in loaded {
            entries.count += transactions.len();
            entries.by_account.entry(number).or_default().extend(transactions);
        }
        Ok(())
    }

    /// Fails if `adding` more entries would exceed the limit.
    pub async fn ensure_room(&self, adding: usize) -> Result<()> {
        self.check_room(self.len().await, adding)
    }

    fn check_room(&self, current: usize, adding: usize) -> Result<()> {
        match self.max_transactions {
            Some(max) if current + adding > max => Err(LedgerError::CapacityExceeded(format!(
                "cannot record transaction: maximum of {max} transactions reached"
            ))),
            _ => Ok(()),
        }
    }
}
