use crate::domain::id::AccountNumber;
use crate::domain::money::Amount;
use crate::domain::transaction::TransactionType;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

/// One row of a batch file: move `amount` in or out of `account`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct BatchInstruction {
    #[serde(rename = "type")]
    pub r#type: TransactionType,
    pub account: AccountNumber,
    pub amount: Amount,
}

/// Reads batch instructions from a CSV source with a `type, account, amount` header.
///
/// Whitespace around fields is trimmed and short rows are tolerated by the
/// parser, so they surface as per-row errors instead of ending the stream.
pub struct InstructionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> InstructionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one instruction per row.
    pub fn instructions(self) -> impl Iterator<Item = Result<BatchInstruction>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
