pub mod expense;
pub mod ledger;
pub mod reconcile;
pub mod watermark;

pub use expense::{Expense, ExpenseId, ExpenseSource, GroupFilter};
pub use ledger::{LedgerSink, LedgerTransaction, LedgerTransactionId, Milliunits, SaveTransaction};
pub use watermark::WatermarkPolicy;

pub type Decimal = rust_decimal::Decimal;
pub type Timestamp = chrono::DateTime<chrono::Utc>;

pub use anyhow::Result;
