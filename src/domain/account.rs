use super::customer::Customer;
use super::id::AccountNumber;
use super::money::{Amount, Balance};
use super::transaction::TransactionType;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const ACTIVE_STATUS: &str = "active";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum AccountType {
    Savings,
    Checking,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Savings => f.write_str("Savings"),
            AccountType::Checking => f.write_str("Checking"),
        }
    }
}

/// Variant-specific parameters of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    Savings {
        interest_rate: Decimal,
        minimum_balance: Balance,
    },
    Checking {
        overdraft_limit: Balance,
        monthly_fee: Balance,
    },
}

/// Something whose balance can be moved by a deposit or a withdrawal.
pub trait Transactable {
    /// Applies `amount` in the direction given by `kind` and returns the new balance.
    /// On error the balance is left untouched.
    fn process_transaction(&mut self, kind: TransactionType, amount: Amount) -> Result<Balance>;
}

/// An account in the ledger.
///
/// The balance only moves through [`Account::deposit`], [`Account::withdraw`]
/// and [`Account::apply_monthly_fee`], each of which either commits the new
/// balance or returns an error without side effects. Nothing here touches
/// the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub number: AccountNumber,
    pub customer: Arc<Customer>,
    balance: Balance,
    pub status: String,
    pub kind: AccountKind,
}

impl Account {
    /// Creates an account with a zero balance.
    pub fn new(number: AccountNumber, customer: Arc<Customer>, kind: AccountKind) -> Self {
        Self {
            number,
            customer,
            balance: Balance::ZERO,
            status: ACTIVE_STATUS.to_string(),
            kind,
        }
    }

    /// Rebuilds an account from a snapshot, balance included.
    pub fn restore(
        number: AccountNumber,
        customer: Arc<Customer>,
        balance: Balance,
        status: String,
        kind: AccountKind,
    ) -> Self {
        Self {
            number,
            customer,
            balance,
            status,
            kind,
        }
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn account_type(&self) -> AccountType {
        match self.kind {
            AccountKind::Savings { .. } => AccountType::Savings,
            AccountKind::Checking { .. } => AccountType::Checking,
        }
    }

    pub fn deposit(&mut self, amount: Amount) -> Result<()> {
        self.balance = self.balance.checked_add(amount)?;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Amount) -> Result<()> {
        let new_balance = self.balance.checked_sub(amount)?;

        match &self.kind {
            AccountKind::Savings {
                minimum_balance, ..
            } => {
                if new_balance < Balance::ZERO {
                    return Err(LedgerError::InvalidAmount(format!(
                        "withdrawal of {amount} from {} exceeds available balance {}",
                        self.number, self.balance
                    )));
                }
                if new_balance < *minimum_balance {
                    return Err(LedgerError::InsufficientFunds(format!(
                        "withdrawal of {amount} from {} would take the balance below the minimum of {minimum_balance}",
                        self.number
                    )));
                }
            }
            AccountKind::Checking {
                overdraft_limit, ..
            } => {
                if new_balance < -*overdraft_limit {
                    return Err(LedgerError::OverdraftExceeded(format!(
                        "withdrawal of {amount} from {} exceeds the overdraft limit of {overdraft_limit}",
                        self.number
                    )));
                }
            }
        }

        self.balance = new_balance;
        Ok(())
    }

    /// Charges the checking monthly fee, subject to the same overdraft rule as
    /// a withdrawal. A waived (zero) fee leaves the balance unchanged.
    pub fn apply_monthly_fee(&mut self) -> Result<()> {
        let AccountKind::Checking {
            overdraft_limit,
            monthly_fee,
        } = &self.kind
        else {
            return Err(LedgerError::UnsupportedOperation(format!(
                "{} is not a checking account and carries no monthly fee",
                self.number
            )));
        };

        let new_balance = self.balance.try_sub(*monthly_fee)?;
        if new_balance < -*overdraft_limit {
            return Err(LedgerError::OverdraftExceeded(format!(
                "monthly fee of {monthly_fee} on {} exceeds the overdraft limit of {overdraft_limit}",
                self.number
            )));
        }

        self.balance = new_balance;
        Ok(())
    }

    pub fn monthly_fee(&self) -> Option<Balance> {
        match self.kind {
            AccountKind::Checking { monthly_fee, .. } => Some(monthly_fee),
            AccountKind::Savings { .. } => None,
        }
    }

    /// Interest the current balance would earn over one period. Savings only.
    pub fn projected_interest(&self) -> Option<Balance> {
        match self.kind {
            AccountKind::Savings { interest_rate, .. } => {
                Some(Balance::new(self.balance.value() * interest_rate))
            }
            AccountKind::Checking { .. } => None,
        }
    }
}

impl Transactable for Account {
    fn process_transaction(&mut self, kind: TransactionType, amount: Amount) -> Result<Balance> {
        match kind {
            TransactionType::Deposit => self.deposit(amount)?,
            TransactionType::Withdrawal => self.withdraw(amount)?,
        }
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::{CustomerCategory, NewCustomer};
    use crate::domain::id::CustomerId;
    use rust_decimal_macros::dec;

    fn customer(category: CustomerCategory) -> Arc<Customer> {
        Arc::new(Customer::new(
            CustomerId::from("CUS001"),
            NewCustomer {
                name: "Alice Johnson".to_string(),
                age: 28,
                contact: "+233101010101".to_string(),
                address: "Accra".to_string(),
                category,
            },
        ))
    }

    fn savings(balance: Decimal) -> Account {
        Account::restore(
            AccountNumber::from("ACC001"),
            customer(CustomerCategory::Regular),
            Balance::new(balance),
            ACTIVE_STATUS.to_string(),
            AccountKind::Savings {
                interest_rate: dec!(0.035),
                minimum_balance: Balance::new(dec!(500)),
            },
        )
    }

    fn checking(balance: Decimal) -> Account {
        Account::restore(
            AccountNumber::from("ACC002"),
            customer(CustomerCategory::Regular),
            Balance::new(balance),
            ACTIVE_STATUS.to_string(),
            AccountKind::Checking {
                overdraft_limit: Balance::new(dec!(1000)),
                monthly_fee: Balance::new(dec!(10)),
            },
        )
    }

    fn amount(value: Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test]
    fn test_new_account_starts_at_zero() {
        let account = Account::new(
            AccountNumber::from("ACC001"),
            customer(CustomerCategory::Regular),
            AccountKind::Checking {
                overdraft_limit: Balance::new(dec!(1000)),
                monthly_fee: Balance::new(dec!(10)),
            },
        );
        assert_eq!(account.balance(), Balance::ZERO);
        assert_eq!(account.status, ACTIVE_STATUS);
        assert_eq!(account.account_type(), AccountType::Checking);
    }

    #[test]
    fn test_deposit() {
        let mut account = savings(dec!(0));
        account.deposit(amount(dec!(10.5))).unwrap();
        assert_eq!(account.balance(), Balance::new(dec!(10.5)));
    }

    #[test]
    fn test_savings_withdraw_down_to_minimum() {
        let mut account = savings(dec!(1000));
        account.withdraw(amount(dec!(500))).unwrap();
        assert_eq!(account.balance(), Balance::new(dec!(500)));

        let result = account.withdraw(amount(dec!(1)));
        assert!(matches!(result, Err(LedgerError::InsufficientFunds(_))));
        assert_eq!(account.balance(), Balance::new(dec!(500)));
    }

    #[test]
    fn test_savings_withdraw_beyond_balance() {
        let mut account = savings(dec!(600));
        let result = account.withdraw(amount(dec!(601)));
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
        assert_eq!(account.balance(), Balance::new(dec!(600)));
    }

    #[test]
    fn test_checking_overdraft() {
        let mut account = checking(dec!(0));
        account.withdraw(amount(dec!(800))).unwrap();
        assert_eq!(account.balance(), Balance::new(dec!(-800)));

        let result = account.withdraw(amount(dec!(300)));
        assert!(matches!(result, Err(LedgerError::OverdraftExceeded(_))));
        assert_eq!(account.balance(), Balance::new(dec!(-800)));
    }

    #[test]
    fn test_checking_withdraw_exactly_to_limit() {
        let mut account = checking(dec!(0));
        account.withdraw(amount(dec!(1000))).unwrap();
        assert_eq!(account.balance(), Balance::new(dec!(-1000)));
    }

    #[test]
    fn test_monthly_fee() {
        let mut account = checking(dec!(100));
        account.apply_monthly_fee().unwrap();
        assert_eq!(account.balance(), Balance::new(dec!(90)));

        let mut at_limit = checking(dec!(-995));
        let result = at_limit.apply_monthly_fee();
        assert!(matches!(result, Err(LedgerError::OverdraftExceeded(_))));
        assert_eq!(at_limit.balance(), Balance::new(dec!(-995)));
    }

    #[test]
    fn test_balance_overflow_is_rejected() {
        let mut full = checking(Decimal::MAX);
        let result = full.deposit(amount(dec!(1)));
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
        assert_eq!(full.balance(), Balance::new(Decimal::MAX));

        let mut drained = checking(Decimal::MIN);
        let result = drained.apply_monthly_fee();
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
        assert_eq!(drained.balance(), Balance::new(Decimal::MIN));
    }

    #[test]
    fn test_monthly_fee_on_savings_is_unsupported() {
        let mut account = savings(dec!(1000));
        let result = account.apply_monthly_fee();
        assert!(matches!(result, Err(LedgerError::UnsupportedOperation(_))));
        assert_eq!(account.balance(), Balance::new(dec!(1000)));
    }

    #[test]
    fn test_projected_interest() {
        let account = savings(dec!(1000));
        assert_eq!(account.projected_interest(), Some(Balance::new(dec!(35))));
        assert_eq!(checking(dec!(1000)).projected_interest(), None);
    }

    #[test]
    fn test_process_transaction_dispatch() {
        let mut account = checking(dec!(0));
        let balance = account
            .process_transaction(TransactionType::Deposit, amount(dec!(50)))
            .unwrap();
        assert_eq!(balance, Balance::new(dec!(50)));

        let balance = account
            .process_transaction(TransactionType::Withdrawal, amount(dec!(70)))
            .unwrap();
        assert_eq!(balance, Balance::new(dec!(-20)));
    }
}
