use crate::domain::account::{Account, AccountKind, AccountType};
use crate::domain::customer::{Customer, CustomerCategory};
use crate::domain::id::{AccountNumber, CustomerId};
use crate::domain::money::Balance;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Flat, storage-friendly form of an [`Account`] and its owner.
///
/// Only the columns of the account's own variant are filled in; the others
/// stay empty.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct AccountRecord {
    pub account_number: AccountNumber,
    pub account_type: AccountType,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_age: u8,
    pub customer_contact: String,
    pub customer_address: String,
    pub customer_category: CustomerCategory,
    pub balance: Balance,
    pub status: String,
    pub interest_rate: Option<Decimal>,
    pub minimum_balance: Option<Balance>,
    pub overdraft_limit: Option<Balance>,
    pub monthly_fee: Option<Balance>,
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        let (interest_rate, minimum_balance, overdraft_limit, monthly_fee) = match &account.kind {
            AccountKind::Savings {
                interest_rate,
                minimum_balance,
            } => (Some(*interest_rate), Some(*minimum_balance), None, None),
            AccountKind::Checking {
                overdraft_limit,
                monthly_fee,
            } => (None, None, Some(*overdraft_limit), Some(*monthly_fee)),
        };
        let customer = &account.customer;

        Self {
            account_number: account.number.clone(),
            account_type: account.account_type(),
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            customer_age: customer.age,
            customer_contact: customer.contact.clone(),
            customer_address: customer.address.clone(),
            customer_category: customer.category,
            balance: account.balance(),
            status: account.status.clone(),
            interest_rate,
            minimum_balance,
            overdraft_limit,
            monthly_fee,
        }
    }
}

impl AccountRecord {
    /// Rebuilds the account. Customers already seen in `customers` are shared
    /// rather than duplicated, so accounts of one customer keep pointing at
    /// the same record.
    pub fn into_account(self, customers: &mut HashMap<CustomerId, Arc<Customer>>) -> Result<Account> {
        let kind = match self.account_type {
            AccountType::Savings => AccountKind::Savings {
                interest_rate: required(self.interest_rate, "interest_rate", &self.account_number)?,
                minimum_balance: required(
                    self.minimum_balance,
                    "minimum_balance",
                    &self.account_number,
                )?,
            },
            AccountType::Checking => AccountKind::Checking {
                overdraft_limit: required(
                    self.overdraft_limit,
                    "overdraft_limit",
                    &self.account_number,
                )?,
                monthly_fee: required(self.monthly_fee, "monthly_fee", &self.account_number)?,
            },
        };

        let customer = customers
            .entry(self.customer_id.clone())
            .or_insert_with(|| {
                Arc::new(Customer {
                    id: self.customer_id,
                    name: self.customer_name,
                    age: self.customer_age,
                    contact: self.customer_contact,
                    address: self.customer_address,
                    category: self.customer_category,
                })
            })
            .clone();

        Ok(Account::restore(
            self.account_number,
            customer,
            self.balance,
            self.status,
            kind,
        ))
    }
}

fn required<T>(value: Option<T>, field: &str, number: &AccountNumber) -> Result<T> {
    value.ok_or_else(|| LedgerError::CorruptSnapshot(format!("{number} is missing {field}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::NewCustomer;
    use rust_decimal_macros::dec;

    fn customer(id: &str) -> Arc<Customer> {
        Arc::new(Customer::new(
            CustomerId::from(id),
            NewCustomer {
                name: "Ama Owusu".to_string(),
                age: 31,
                contact: "+233244000000".to_string(),
                address: "Ho".to_string(),
                category: CustomerCategory::Regular,
            },
        ))
    }

    #[test]
    fn test_record_keeps_variant_columns() {
        let account = Account::restore(
            AccountNumber::from("ACC004"),
            customer("CUS002"),
            Balance::new(dec!(-40)),
            "active".to_string(),
            AccountKind::Checking {
                overdraft_limit: Balance::new(dec!(1000)),
                monthly_fee: Balance::new(dec!(10)),
            },
        );
        let record = AccountRecord::from(&account);

        assert_eq!(record.account_type, AccountType::Checking);
        assert_eq!(record.interest_rate, None);
        assert_eq!(record.monthly_fee, Some(Balance::new(dec!(10))));

        let mut customers = HashMap::new();
        assert_eq!(record.into_account(&mut customers).unwrap(), account);
        assert_eq!(customers.len(), 1);
    }

    #[test]
    fn test_shared_customer_is_deduplicated() {
        let owner = customer("CUS001");
        let savings = Account::new(
            AccountNumber::from("ACC001"),
            Arc::clone(&owner),
            AccountKind::Savings {
                interest_rate: dec!(0.035),
                minimum_balance: Balance::new(dec!(500)),
            },
        );
        let checking = Account::new(
            AccountNumber::from("ACC002"),
            owner,
            AccountKind::Checking {
                overdraft_limit: Balance::new(dec!(1000)),
                monthly_fee: Balance::new(dec!(10)),
            },
        );

        let mut customers = HashMap::new();
        let first = AccountRecord::from(&savings).into_account(&mut customers).unwrap();
        let second = AccountRecord::from(&checking).into_account(&mut customers).unwrap();

        assert!(Arc::ptr_eq(&first.customer, &second.customer));
    }

    #[test]
    fn test_missing_variant_column_is_corrupt() {
        let account = Account::new(
            AccountNumber::from("ACC001"),
            customer("CUS001"),
            AccountKind::Savings {
                interest_rate: dec!(0.035),
                minimum_balance: Balance::new(dec!(500)),
            },
        );
        let mut record = AccountRecord::from(&account);
        record.minimum_balance = None;

        let result = record.into_account(&mut HashMap::new());
        assert!(matches!(result, Err(LedgerError::CorruptSnapshot(_))));
    }
}
