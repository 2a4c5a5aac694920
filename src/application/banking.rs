use crate::config::LedgerConfig;
use crate::domain::account::{Account, AccountKind, AccountType, Transactable};
use crate::domain::customer::{Customer, NewCustomer};
use crate::domain::id::{AccountNumber, CustomerId, IdGenerator, TransactionId};
use crate::domain::money::{Amount, Balance};
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::{LedgerError, Result};
use crate::infrastructure::in_memory::{AccountHandle, Ledger, TransactionJournal};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// An account whose balance disagrees with the sum of its journal entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub account_number: AccountNumber,
    pub balance: Balance,
    pub journal_total: Balance,
}

/// Coordinates the ledger, the journal and id generation.
///
/// Transactions follow a two-phase protocol. [`BankingService::propose`]
/// computes a transaction without touching any state, and
/// [`BankingService::confirm`] applies it to the account and records it in
/// the journal, or does neither.
pub struct BankingService {
    config: LedgerConfig,
    ledger: Ledger,
    journal: TransactionJournal,
    account_ids: Mutex<IdGenerator>,
    transaction_ids: Mutex<IdGenerator>,
    customer_ids: Mutex<IdGenerator>,
}

impl BankingService {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            ledger: Ledger::with_capacity_limit(config.max_accounts),
            journal: TransactionJournal::with_capacity_limit(config.max_transactions),
            account_ids: Mutex::new(IdGenerator::accounts()),
            transaction_ids: Mutex::new(IdGenerator::transactions()),
            customer_ids: Mutex::new(IdGenerator::customers()),
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn register_customer(&self, details: NewCustomer) -> Result<Arc<Customer>> {
        let id = CustomerId::new(next_id(&self.customer_ids)?);
        Ok(Arc::new(Customer::new(id, details)))
    }

    /// Creates a zero-balance savings account and registers it with the ledger.
    pub async fn create_savings_account(&self, customer: Arc<Customer>) -> Result<Account> {
        let kind = AccountKind::Savings {
            interest_rate: self.config.savings_interest_rate,
            minimum_balance: Balance::new(self.config.savings_minimum_balance),
        };
        self.create_account(customer, kind).await
    }

    /// Creates a zero-balance checking account. Premium customers pay no monthly fee.
    pub async fn create_checking_account(&self, customer: Arc<Customer>) -> Result<Account> {
        let monthly_fee = if customer.is_premium() {
            Balance::ZERO
        } else {
            Balance::new(self.config.checking_monthly_fee)
        };
        let kind = AccountKind::Checking {
            overdraft_limit: Balance::new(self.config.overdraft_limit),
            monthly_fee,
        };
        self.create_account(customer, kind).await
    }

    async fn create_account(&self, customer: Arc<Customer>, kind: AccountKind) -> Result<Account> {
        let number = AccountNumber::new(next_id(&self.account_ids)?);
        let handle = self.ledger.insert(Account::new(number, customer, kind)).await?;
        let account = handle.snapshot().await;
        info!(
            account = %account.number,
            kind = %account.account_type(),
            customer = %account.customer,
            "account created"
        );
        Ok(account)
    }

    /// Opens an account and funds it with an audited initial deposit.
    ///
    /// The minimum initial deposit is checked before the account is created,
    /// so a rejected opening leaves no trace in the ledger.
    pub async fn open_account(
        &self,
        account_type: AccountType,
        customer: Arc<Customer>,
        initial_deposit: Amount,
    ) -> Result<(Account, Transaction)> {
        let minimum = self
            .config
            .minimum_initial_deposit(account_type, customer.category);
        if initial_deposit.value() < minimum {
            return Err(LedgerError::InvalidAmount(format!(
                "initial deposit of {initial_deposit} is below the minimum of {minimum:.2} for a {} {account_type} account",
                customer.category
            )));
        }

        let account = match account_type {
            AccountType::Savings => self.create_savings_account(customer).await?,
            AccountType::Checking => self.create_checking_account(customer).await?,
        };
        let transaction = self.propose(&account, initial_deposit, TransactionType::Deposit)?;
        let handle = self.account_handle(&account.number).await?;
        self.confirm(&handle, transaction.clone()).await?;
        Ok((handle.snapshot().await, transaction))
    }

    /// Computes a transaction against `account` without applying it.
    ///
    /// `balance_after` is projected from the balance the caller passed in; a
    /// concurrent change can make it stale by the time the transaction is
    /// confirmed. The projection saturates at the decimal range, and
    /// [`BankingService::confirm`] rejects the overflow itself.
    ///
    /// Only fails when no transaction ids are left to issue.
    pub fn propose(
        &self,
        account: &Account,
        amount: Amount,
        r#type: TransactionType,
    ) -> Result<Transaction> {
        let balance_after = match r#type {
            TransactionType::Deposit => account.balance().saturating_add(amount),
            TransactionType::Withdrawal => account.balance().saturating_sub(amount),
        };
        Ok(Transaction {
            id: TransactionId::new(next_id(&self.transaction_ids)?),
            r#type,
            account_number: account.number.clone(),
            amount,
            balance_after,
            timestamp: Utc::now(),
        })
    }

    pub fn propose_deposit(&self, account: &Account, amount: Amount) -> Result<Transaction> {
        self.propose(account, amount, TransactionType::Deposit)
    }

    pub fn propose_withdrawal(&self, account: &Account, amount: Amount) -> Result<Transaction> {
        self.propose(account, amount, TransactionType::Withdrawal)
    }

    /// Applies a proposed transaction and records it in the journal.
    ///
    /// The account lock is held from validation through the journal append,
    /// so confirmations against one account never interleave. If the account
    /// rejects the change, or the journal is full, nothing is modified.
    pub async fn confirm(&self, account: &AccountHandle, transaction: Transaction) -> Result<()> {
        if transaction.account_number != *account.number() {
            return Err(LedgerError::AccountMismatch {
                expected: account.number().to_string(),
                found: transaction.account_number.to_string(),
            });
        }

        let mut current = account.lock().await;
        let mut staged = current.clone();
        let balance = staged.process_transaction(transaction.r#type, transaction.amount)?;

        self.journal.append(transaction.clone()).await?;
        *current = staged;
        debug!(
            transaction = %transaction.id,
            account = %transaction.account_number,
            kind = %transaction.r#type,
            amount = %transaction.amount,
            %balance,
            "transaction confirmed"
        );
        Ok(())
    }

    /// Charges the monthly fee on a checking account and journals it as a
    /// withdrawal. Returns `None` when the fee is waived.
    pub async fn charge_monthly_fee(&self, number: &AccountNumber) -> Result<Option<Transaction>> {
        let handle = self.ledger.get(number).await?;
        let mut current = handle.lock().await;

        let fee = current.monthly_fee().ok_or_else(|| {
            LedgerError::UnsupportedOperation(format!(
                "{number} is not a checking account and carries no monthly fee"
            ))
        })?;
        if fee == Balance::ZERO {
            return Ok(None);
        }

        let amount = Amount::new(fee.value())?;
        let transaction = self.propose(&current, amount, TransactionType::Withdrawal)?;
        let mut staged = current.clone();
        staged.apply_monthly_fee()?;

        self.journal.append(transaction.clone()).await?;
        *current = staged;
        info!(account = %number, fee = %amount, "monthly fee charged");
        Ok(Some(transaction))
    }

    pub async fn account_handle(&self, number: &AccountNumber) -> Result<AccountHandle> {
        self.ledger.get(number).await
    }

    pub async fn get_account_by_number(&self, number: &AccountNumber) -> Result<Account> {
        Ok(self.ledger.get(number).await?.snapshot().await)
    }

    /// Copies of every account in account-number order. Not a point-in-time
    /// view while a batch is running.
    pub async fn view_all_accounts(&self) -> Vec<Account> {
        self.ledger.all_accounts().await
    }

    pub async fn get_transactions_by_account(&self, number: &AccountNumber) -> Vec<Transaction> {
        self.journal.transactions_for(number).await
    }

    pub async fn view_all_transactions(&self) -> Vec<Transaction> {
        self.journal.all_transactions().await
    }

    pub async fn get_total_deposits(&self, number: &AccountNumber) -> Result<Balance> {
        self.journal.total_for(number, TransactionType::Deposit).await
    }

    pub async fn get_total_withdrawals(&self, number: &AccountNumber) -> Result<Balance> {
        self.journal.total_for(number, TransactionType::Withdrawal).await
    }

    pub async fn get_net_change(&self, number: &AccountNumber) -> Result<Balance> {
        self.journal.net_change(number).await
    }

    /// Sum of every account balance.
    ///
    /// Accounts are read one at a time, each under its own lock. While a batch
    /// is being confirmed the result can mix balances from before and after
    /// individual confirmations, so it is only an exact point-in-time total
    /// once the batch has completed. Fails with `InvalidAmount` if the sum
    /// leaves the decimal range.
    pub async fn get_total_bank_balance(&self) -> Result<Balance> {
        self.ledger.total_balance().await
    }

    pub async fn get_account_count(&self) -> usize {
        self.ledger.len().await
    }

    pub async fn get_transaction_count(&self) -> usize {
        self.journal.len().await
    }

    /// Rehydrates the ledger and journal from a snapshot and seeds every id
    /// generator past the highest index it contains.
    ///
    /// The snapshot is checked as a whole before anything is inserted: ids
    /// must be well formed, every journal entry must belong to a snapshot
    /// account and sit under its own account number, every balance must equal
    /// its journal total, and both stores must have room. A rejected snapshot
    /// leaves the service unchanged.
    pub async fn restore(
        &self,
        accounts: HashMap<AccountNumber, Account>,
        transactions: HashMap<AccountNumber, Vec<Transaction>>,
    ) -> Result<()> {
        let max_account = {
            let generator = lock(&self.account_ids);
            max_index(&generator, accounts.keys().map(AccountNumber::as_str))?
        };
        let max_customer = {
            let generator = lock(&self.customer_ids);
            max_index(&generator, accounts.values().map(|a| a.customer.id.as_str()))?
        };
        let max_transaction = {
            let generator = lock(&self.transaction_ids);
            max_index(
                &generator,
                transactions.values().flatten().map(|t| t.id.as_str()),
            )?
        };

        verify_snapshot(&accounts, &transactions)?;

        let account_count = accounts.len();
        let transaction_count: usize = transactions.values().map(Vec::len).sum();
        self.ledger.ensure_room(account_count).await?;
        self.journal.ensure_room(transaction_count).await?;

        let numbers: Vec<AccountNumber> = accounts.keys().cloned().collect();
        self.ledger.load(accounts).await?;
        if let Err(e) = self.journal.load(transactions).await {
            self.ledger.unload(&numbers).await;
            return Err(e);
        }

        lock(&self.account_ids).seed_counter(max_account);
        lock(&self.customer_ids).seed_counter(max_customer);
        lock(&self.transaction_ids).seed_counter(max_transaction);

        info!(
            accounts = account_count,
            transactions = transaction_count,
            "ledger restored from snapshot"
        );
        Ok(())
    }

    /// Lists every account whose balance differs from its journal total.
    /// An empty result means the ledger invariant holds.
    pub async fn reconcile(&self) -> Result<Vec<Discrepancy>> {
        let mut discrepancies = Vec::new();
        for account in self.ledger.all_accounts().await {
            let journal_total = self.journal.net_change(&account.number).await?;
            if journal_total != account.balance() {
                discrepancies.push(Discrepancy {
                    account_number: account.number.clone(),
                    balance: account.balance(),
                    journal_total,
                });
            }
        }
        Ok(discrepancies)
    }
}

fn lock(generator: &Mutex<IdGenerator>) -> std::sync::MutexGuard<'_, IdGenerator> {
    generator.lock().unwrap_or_else(PoisonError::into_inner)
}

fn next_id(generator: &Mutex<IdGenerator>) -> Result<String> {
    lock(generator).generate_id()
}

fn verify_snapshot(
    accounts: &HashMap<AccountNumber, Account>,
    transactions: &HashMap<AccountNumber, Vec<Transaction>>,
) -> Result<()> {
    for (number, history) in transactions {
        if !accounts.contains_key(number) {
            return Err(LedgerError::CorruptSnapshot(format!(
                "journal entries for {number}, which is not in the snapshot"
            )));
        }
        if let Some(stray) = history.iter().find(|t| t.account_number != *number) {
            return Err(LedgerError::AccountMismatch {
                expected: number.to_string(),
                found: stray.account_number.to_string(),
            });
        }
    }

    for (number, account) in accounts {
        let history = transactions.get(number).map(Vec::as_slice).unwrap_or_default();
        let journal_total = Balance::try_sum(history.iter().map(Transaction::signed_amount))
            .map_err(|_| {
                LedgerError::CorruptSnapshot(format!("journal total for {number} is out of range"))
            })?;
        if journal_total != account.balance() {
            return Err(LedgerError::CorruptSnapshot(format!(
                "{number} has a balance of {} but its journal sums to {journal_total}",
                account.balance()
            )));
        }
    }
    Ok(())
}

fn max_index<'a>(generator: &IdGenerator, ids: impl Iterator<Item = &'a str>) -> Result<u32> {
    ids.map(|id| generator.extract_index(id))
        .try_fold(0, |max, index| index.map(|index| max.max(index)))
}
