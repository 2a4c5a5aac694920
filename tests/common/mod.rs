#![allow(dead_code)]

use bank_ledger::application::banking::BankingService;
use bank_ledger::config::LedgerConfig;
use bank_ledger::domain::account::{Account, AccountType};
use bank_ledger::domain::customer::{CustomerCategory, NewCustomer};
use bank_ledger::domain::money::Amount;
use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

pub fn customer_details(name: &str, category: CustomerCategory) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        age: 35,
        contact: "+233240000000".to_string(),
        address: "Accra".to_string(),
        category,
    }
}

pub fn service() -> Arc<BankingService> {
    Arc::new(BankingService::new(LedgerConfig::default()))
}

/// Opens an account for a fresh regular customer.
pub async fn open(
    service: &BankingService,
    account_type: AccountType,
    initial_deposit: Decimal,
) -> Account {
    let customer = service
        .register_customer(customer_details(
            &format!("Customer {}", service.get_account_count().await + 1),
            CustomerCategory::Regular,
        ))
        .unwrap();
    let (account, _) = service
        .open_account(account_type, customer, amount(initial_deposit))
        .await
        .unwrap();
    account
}

/// Writes a batch file with the `type, account, amount` header.
pub fn batch_file(rows: &[(&str, &str, &str)]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "type, account, amount").unwrap();
    for (kind, account, amount) in rows {
        writeln!(file, "{kind}, {account}, {amount}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// Returns the CSV line for `account` from the CLI's stdout.
pub fn output_line<'a>(stdout: &'a str, account: &str) -> Option<&'a str> {
    stdout
        .lines()
        .find(|line| line.starts_with(&format!("{account},")))
}

pub fn read_to_string(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// Writes `rows` deposits of 1.0, spread round-robin over the five demo accounts.
pub fn generate_batch_csv(path: &Path, rows: usize) -> Result<(), std::io::Error> {
    let file = std::fs::File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(["type", "account", "amount"])?;

    for i in 0..rows {
        let account = format!("ACC{:03}", i % 5 + 1);
        wtr.write_record(["deposit", account.as_str(), "1.0"])?;
    }

    wtr.flush()?;
    Ok(())
}
