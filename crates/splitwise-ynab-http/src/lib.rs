//! Blocking clients for the Splitwise and YNAB REST APIs.

mod api;
pub mod splitwise;
pub mod ynab;

pub use splitwise::Splitwise;
pub use ynab::{AuthError, Ynab};
