//! Expenses as reported by the bill-splitting service.

use std::fmt;

use crate::{Decimal, Result, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpenseId(pub u64);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single shared expense. Read-only from our side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    pub id: ExpenseId,
    pub cost: Decimal,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
}

impl Expense {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Latest of the creation, modification and deletion timestamps.
    pub fn last_seen(&self) -> Timestamp {
        [self.updated_at, self.deleted_at]
            .into_iter()
            .flatten()
            .fold(self.created_at, Timestamp::max)
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} \"{}\" created {}",
            self.id,
            self.cost,
            self.description,
            self.created_at.format("%Y-%m-%d %H:%M:%SZ")
        )?;
        if let Some(deleted_at) = self.deleted_at {
            write!(f, " deleted {}", deleted_at.format("%Y-%m-%d %H:%M:%SZ"))?;
        }
        Ok(())
    }
}

/// Which expenses to pull from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupFilter {
    #[default]
    All,
    Group(u64),
}

impl GroupFilter {
    /// The source treats group `0` as "every group".
    pub fn from_group_id(group_id: Option<u64>) -> Self {
        match group_id {
            None | Some(0) => GroupFilter::All,
            Some(id) => GroupFilter::Group(id),
        }
    }
}

/// Upstream system the expenses are pulled from.
pub trait ExpenseSource {
    /// All expenses created, changed or deleted after `since`.
    fn fetch_expenses(&self, group: GroupFilter, since: Timestamp) -> Result<Vec<Expense>>;
}
