use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// A signed monetary value.
///
/// Checking accounts may legitimately carry a negative balance, so unlike
/// [`Amount`] this type places no constraint on the sign of the wrapped
/// `rust_decimal::Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

/// A strictly positive monetary amount carried by a transaction.
///
/// Construction is the only place where positivity is checked, which is what
/// lets `deposit` and `withdraw` rely on it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAmount(format!(
                "amount must be positive and greater than 0, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Adds `amount`, failing instead of panicking if the decimal would overflow.
    pub fn checked_add(self, amount: Amount) -> Result<Self> {
        self.try_add(amount.into())
    }

    pub fn checked_sub(self, amount: Amount) -> Result<Self> {
        self.try_sub(amount.into())
    }

    pub fn try_add(self, other: Balance) -> Result<Self> {
        self.0.checked_add(other.0).map(Self).ok_or_else(overflow)
    }

    pub fn try_sub(self, other: Balance) -> Result<Self> {
        self.0.checked_sub(other.0).map(Self).ok_or_else(overflow)
    }

    /// Totals `balances`, failing if any partial sum leaves the decimal range.
    pub fn try_sum(balances: impl IntoIterator<Item = Balance>) -> Result<Self> {
        balances.into_iter().try_fold(Self::ZERO, Self::try_add)
    }

    /// `self + amount`, clamped to the decimal range.
    pub fn saturating_add(self, amount: Amount) -> Self {
        Self(self.0.saturating_add(amount.value()))
    }

    /// `self - amount`, clamped to the decimal range.
    pub fn saturating_sub(self, amount: Amount) -> Self {
        Self(self.0.saturating_sub(amount.value()))
    }
}

fn overflow() -> LedgerError {
    LedgerError::InvalidAmount("balance would overflow".to_string())
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Neg for Balance {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}
