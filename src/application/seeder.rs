use super::banking::BankingService;
use crate::domain::account::{Account, AccountType};
use crate::domain::customer::{CustomerCategory, NewCustomer};
use crate::domain::money::Amount;
use crate::error::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct DemoAccount {
    name: &'static str,
    age: u8,
    contact: &'static str,
    address: &'static str,
    category: CustomerCategory,
    account_type: AccountType,
    initial_deposit: Decimal,
}

const DEMO_ACCOUNTS: [DemoAccount; 5] = [
    DemoAccount {
        name: "Alice Johnson",
        age: 28,
        contact: "+233101010101",
        address: "Accra",
        category: CustomerCategory::Regular,
        account_type: AccountType::Savings,
        initial_deposit: dec!(1200),
    },
    DemoAccount {
        name: "Michael Mensah",
        age: 45,
        contact: "+233202020202",
        address: "Kumasi",
        category: CustomerCategory::Premium,
        account_type: AccountType::Checking,
        initial_deposit: dec!(20000),
    },
    DemoAccount {
        name: "Sarah Boateng",
        age: 34,
        contact: "+233303030303",
        address: "Tema",
        category: CustomerCategory::Regular,
        account_type: AccountType::Checking,
        initial_deposit: dec!(850),
    },
    DemoAccount {
        name: "Kwame Frimpong",
        age: 50,
        contact: "+233404040404",
        address: "Cape Coast",
        category: CustomerCategory::Premium,
        account_type: AccountType::Savings,
        initial_deposit: dec!(15000),
    },
    DemoAccount {
        name: "John Doe",
        age: 22,
        contact: "+233505050505",
        address: "Takoradi",
        category: CustomerCategory::Regular,
        account_type: AccountType::Savings,
        initial_deposit: dec!(750),
    },
];

/// Opens the demo accounts, each funded through an audited initial deposit.
pub async fn seed_demo_accounts(service: &BankingService) -> Result<Vec<Account>> {
    let mut accounts = Vec::with_capacity(DEMO_ACCOUNTS.len());
    for demo in &DEMO_ACCOUNTS {
        let customer = service.register_customer(NewCustomer {
            name: demo.name.to_string(),
            age: demo.age,
            contact: demo.contact.to_string(),
            address: demo.address.to_string(),
            category: demo.category,
        })?;
        let deposit = Amount::new(demo.initial_deposit)?;
        let (account, _) = service
            .open_account(demo.account_type, customer, deposit)
            .await?;
        accounts.push(account);
    }
    Ok(accounts)
}
