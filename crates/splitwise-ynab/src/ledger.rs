//! The budgeting side: amounts in milliunits, day-granular dates and the sink trait.

use std::fmt;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use rust_decimal::RoundingStrategy;

use crate::{Decimal, Result, Timestamp};

/// Ledger amount in thousandths of the currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Milliunits(pub i64);

impl Milliunits {
    pub const ZERO: Milliunits = Milliunits(0);

    /// Scale by 1000 and round half away from zero.
    pub fn from_decimal(amount: Decimal) -> Result<Self> {
        let scaled = amount
            .checked_mul(Decimal::ONE_THOUSAND)
            .ok_or_else(|| anyhow!("amount {amount} overflows when scaled to milliunits"))?;
        let rounded = scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let value = i64::try_from(rounded)
            .map_err(|_| anyhow!("amount {amount} does not fit into milliunits"))?;
        Ok(Milliunits(value))
    }
}

impl fmt::Display for Milliunits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Decimal::new(self.0, 3).fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerTransactionId(pub String);

impl fmt::Display for LedgerTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction as it already exists in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub id: LedgerTransactionId,
    pub date: NaiveDate,
    pub amount: Milliunits,
    pub memo: Option<String>,
    pub deleted: bool,
}

/// The payload for creating or overwriting a ledger transaction.
///
/// Account, cleared and approved flags are filled in by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTransaction {
    pub amount: Milliunits,
    pub memo: String,
    pub date: NaiveDate,
}

impl SaveTransaction {
    pub fn from_expense(amount: Decimal, description: &str, created_at: Timestamp) -> Result<Self> {
        let amount = Milliunits::from_decimal(amount)
            .with_context(|| format!("Failed to convert amount of '{description}'"))?;
        Ok(SaveTransaction {
            amount,
            memo: description.to_owned(),
            date: created_at.date_naive(),
        })
    }

    /// Same memo and date, but zero amount.
    pub fn zeroed(mut self) -> Self {
        self.amount = Milliunits::ZERO;
        self
    }
}

impl fmt::Display for SaveTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.date, self.amount, self.memo)
    }
}

/// Downstream budgeting ledger, already bound to one budget and account.
pub trait LedgerSink {
    fn create_transaction(&self, transaction: &SaveTransaction) -> Result<()>;

    fn update_transaction(
        &self,
        id: &LedgerTransactionId,
        transaction: &SaveTransaction,
    ) -> Result<()>;

    /// Transactions of the bound account dated on or after `since`.
    fn list_transactions_since(&self, since: NaiveDate) -> Result<Vec<LedgerTransaction>>;
}
