use crate::domain::account::AccountType;
use crate::domain::customer::CustomerCategory;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Business rules and runtime settings for a ledger instance.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum negative balance of a checking account.
    pub overdraft_limit: Decimal,
    /// Lowest balance a withdrawal may leave in a savings account.
    pub savings_minimum_balance: Decimal,
    pub savings_interest_rate: Decimal,
    /// Waived for premium customers.
    pub checking_monthly_fee: Decimal,
    pub minimum_initial_deposit_savings: Decimal,
    pub minimum_initial_deposit_checking: Decimal,
    /// Applies to premium customers regardless of account type.
    pub minimum_initial_deposit_premium: Decimal,
    pub worker_pool_size: usize,
    pub shutdown_grace_secs: u64,
    pub max_accounts: Option<usize>,
    pub max_transactions: Option<usize>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            overdraft_limit: dec!(1000),
            savings_minimum_balance: dec!(500),
            savings_interest_rate: dec!(0.035),
            checking_monthly_fee: dec!(10),
            minimum_initial_deposit_savings: dec!(500),
            minimum_initial_deposit_checking: dec!(0),
            minimum_initial_deposit_premium: dec!(10000),
            worker_pool_size: 3,
            shutdown_grace_secs: 5,
            max_accounts: None,
            max_transactions: None,
        }
    }
}

impl LedgerConfig {
    /// Reads a JSON config file and validates it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_pool_size == 0 {
            return Err(LedgerError::Config(
                "worker_pool_size must be at least 1".to_string(),
            ));
        }

        let non_negative = [
            ("overdraft_limit", self.overdraft_limit),
            ("savings_minimum_balance", self.savings_minimum_balance),
            ("savings_interest_rate", self.savings_interest_rate),
            ("checking_monthly_fee", self.checking_monthly_fee),
            ("minimum_initial_deposit_savings", self.minimum_initial_deposit_savings),
            ("minimum_initial_deposit_checking", self.minimum_initial_deposit_checking),
            ("minimum_initial_deposit_premium", self.minimum_initial_deposit_premium),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, value)| value.is_sign_negative()) {
            return Err(LedgerError::Config(format!(
                "{name} must not be negative, got {value}"
            )));
        }
        Ok(())
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn minimum_initial_deposit(
        &self,
        account_type: AccountType,
        category: CustomerCategory,
    ) -> Decimal {
        match (category, account_type) {
            (CustomerCategory::Premium, _) => self.minimum_initial_deposit_premium,
            (CustomerCategory::Regular, AccountType::Savings) => {
                self.minimum_initial_deposit_savings
            }
            (CustomerCategory::Regular, AccountType::Checking) => {
                self.minimum_initial_deposit_checking
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.worker_pool_size, 3);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "worker_pool_size": 8, "overdraft_limit": "250.00" }}"#).unwrap();

        let config = LedgerConfig::from_path(file.path()).unwrap();
        assert_eq!(config.worker_pool_size, 8);
        assert_eq!(config.overdraft_limit, dec!(250));
        assert_eq!(config.savings_minimum_balance, dec!(500));
    }

    #[test]
    fn test_rejects_empty_pool() {
        let config = LedgerConfig {
            worker_pool_size: 0,
            ..LedgerConfig::default()
        };
        assert!(matches!(config.validate(), Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_rejects_negative_limit() {
        let config = LedgerConfig {
            overdraft_limit: dec!(-1),
            ..LedgerConfig::default()
        };
        assert!(matches!(config.validate(), Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_minimum_initial_deposit() {
        let config = LedgerConfig::default();
        assert_eq!(
            config.minimum_initial_deposit(AccountType::Savings, CustomerCategory::Regular),
            dec!(500)
        );
        assert_eq!(
            config.minimum_initial_deposit(AccountType::Checking, CustomerCategory::Regular),
            dec!(0)
        );
        assert_eq!(
            config.minimum_initial_deposit(AccountType::Checking, CustomerCategory::Premium),
            dec!(10000)
        );
    }
}
