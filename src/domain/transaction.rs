use super::id::{AccountNumber, TransactionId};
use super::money::{Amount, Balance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Deposit => f.write_str("Deposit"),
            TransactionType::Withdrawal => f.write_str("Withdrawal"),
        }
    }
}

/// A balance change against one account.
///
/// A transaction is first *proposed*: `balance_after` is the projection made
/// at that moment and nothing has been applied yet. Once *confirmed* it is
/// appended to the journal and never changes again.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub r#type: TransactionType,
    pub account_number: AccountNumber,
    pub amount: Amount,
    pub balance_after: Balance,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// The effect of this transaction on its account: positive for deposits,
    /// negative for withdrawals.
    pub fn signed_amount(&self) -> Balance {
        match self.r#type {
            TransactionType::Deposit => self.amount.into(),
            TransactionType::Withdrawal => -Balance::from(self.amount),
        }
    }
}
