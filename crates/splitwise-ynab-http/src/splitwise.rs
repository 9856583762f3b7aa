//! Splitwise, the expense source.
//!
//! Authenticates with a personal API key and pulls expenses through
//! `get_expenses`, using `updated_after` as the incremental cursor.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use splitwise_ynab::{Decimal, Expense, ExpenseId, ExpenseSource, GroupFilter, Timestamp};

use crate::api::ApiClient;

pub const API_BASE: &str = "https://secure.splitwise.com/api/v3.0";

#[derive(Debug, Deserialize)]
struct CurrentUserResponse {
    user: SplitwiseUser,
}

#[derive(Debug, Deserialize)]
struct SplitwiseUser {
    id: u64,
    #[serde(default)]
    first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpensesResponse {
    #[serde(default)]
    expenses: Vec<SplitwiseExpense>,
}

#[derive(Debug, Deserialize)]
struct SplitwiseExpense {
    id: u64,
    cost: String,
    #[serde(default)]
    description: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<SplitwiseExpense> for Expense {
    type Error = anyhow::Error;

    fn try_from(raw: SplitwiseExpense) -> Result<Self> {
        let cost = Decimal::from_str(raw.cost.trim())
            .with_context(|| format!("Invalid cost '{}' on expense {}", raw.cost, raw.id))?;
        Ok(Expense {
            id: ExpenseId(raw.id),
            cost,
            description: raw.description.unwrap_or_default(),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            deleted_at: raw.deleted_at,
        })
    }
}

fn parse_expenses(response: ExpensesResponse) -> Result<Vec<Expense>> {
    response
        .expenses
        .into_iter()
        .map(Expense::try_from)
        .collect()
}

/// An authenticated Splitwise session.
#[derive(Clone)]
pub struct Splitwise {
    api: ApiClient,
}

impl Splitwise {
    /// Verify the key against `get_current_user`.
    pub fn authenticate(api_key: &str) -> Result<Self> {
        let api = ApiClient::new(API_BASE, api_key)?;
        let response: CurrentUserResponse = api
            .get("get_current_user", &[])
            .context("Failed to authenticate with Splitwise")?;
        tracing::info!(
            "Authenticated with Splitwise as user {} ({})",
            response.user.id,
            response.user.first_name.as_deref().unwrap_or("unnamed")
        );
        Ok(Splitwise { api })
    }
}

fn expenses_query(group: GroupFilter, since: Timestamp) -> Vec<(&'static str, String)> {
    let mut query = vec![
        (
            "updated_after",
            since.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        // 0 disables paging
        ("limit", "0".to_owned()),
    ];
    if let GroupFilter::Group(id) = group {
        query.push(("group_id", id.to_string()));
    }
    query
}

impl ExpenseSource for Splitwise {
    fn fetch_expenses(&self, group: GroupFilter, since: Timestamp) -> Result<Vec<Expense>> {
        let response: ExpensesResponse = self
            .api
            .get("get_expenses", &expenses_query(group, since))
            .context("Failed to fetch Splitwise expenses")?;
        let expenses = parse_expenses(response)?;
        for expense in &expenses {
            tracing::debug!("Fetched expense {expense}");
        }
        Ok(expenses)
    }
}
