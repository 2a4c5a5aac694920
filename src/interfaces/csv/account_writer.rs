use crate::domain::account::Account;
use crate::error::Result;
use std::io::Write;

const HEADER: [&str; 6] = ["account", "type", "customer", "category", "balance", "status"];

/// Writes the final state of the ledger as CSV, one account per row.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header followed by `accounts` in the order given, balances
    /// to two decimal places.
    pub fn write_accounts(&mut self, accounts: &[Account]) -> Result<()> {
        self.writer.write_record(HEADER)?;
        for account in accounts {
            self.writer.write_record([
                account.number.to_string(),
                account.account_type().to_string(),
                account.customer.name.clone(),
                account.customer.category.to_string(),
                account.balance().to_string(),
                account.status.clone(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
