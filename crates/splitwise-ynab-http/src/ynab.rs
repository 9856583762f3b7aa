//! YNAB, the ledger sink.
//!
//! [`Ynab::authenticate`] resolves the configured budget and account by name.
//! The returned value is bound to both and implements [`LedgerSink`].

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use splitwise_ynab::{
    LedgerSink, LedgerTransaction, LedgerTransactionId, Milliunits, SaveTransaction,
};

use crate::api::ApiClient;

pub const API_BASE: &str = "https://api.ynab.com/v1";

/// Failures that make it pointless to continue the run.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No '{0}' budget found in YNAB")]
    BudgetNotFound(String),
    #[error("No '{0}' account found in YNAB")]
    AccountNotFound(String),
    #[error("YNAB request failed during authentication")]
    Api(#[source] anyhow::Error),
}

#[derive(Debug, Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct BudgetsData {
    budgets: Vec<NamedEntity>,
}

#[derive(Debug, Deserialize)]
struct AccountsData {
    accounts: Vec<NamedEntity>,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    id: String,
    name: String,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    transactions: Vec<TransactionDetail>,
}

#[derive(Debug, Deserialize)]
struct TransactionDetail {
    id: String,
    date: NaiveDate,
    amount: i64,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    deleted: bool,
}

impl From<TransactionDetail> for LedgerTransaction {
    fn from(detail: TransactionDetail) -> Self {
        LedgerTransaction {
            id: LedgerTransactionId(detail.id),
            date: detail.date,
            amount: Milliunits(detail.amount),
            memo: detail.memo,
            deleted: detail.deleted,
        }
    }
}

#[derive(Debug, Serialize)]
struct SaveTransactionWrapper<'a> {
    transaction: SaveTransactionBody<'a>,
}

#[derive(Debug, Serialize)]
struct SaveTransactionBody<'a> {
    account_id: &'a str,
    date: NaiveDate,
    amount: i64,
    memo: &'a str,
    cleared: &'static str,
    approved: bool,
}

/// Response bodies we don't look at.
#[derive(Debug, Deserialize)]
struct Ignored {}

/// Case-insensitive exact name match, skipping deleted entries.
fn find_by_name<'a>(entities: &'a [NamedEntity], name: &str) -> Option<&'a NamedEntity> {
    let name = name.to_lowercase();
    entities
        .iter()
        .filter(|entity| !entity.deleted)
        .find(|entity| entity.name.to_lowercase() == name)
}

/// A YNAB session bound to one budget and one account.
#[derive(Clone)]
pub struct Ynab {
    api: ApiClient,
    budget_id: String,
    account_id: String,
}

impl std::fmt::Debug for Ynab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ynab")
            .field("budget_id", &self.budget_id)
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

impl Ynab {
    pub fn authenticate(
        access_token: &str,
        budget_name: &str,
        account_name: &str,
    ) -> Result<Self, AuthError> {
        let api = ApiClient::new(API_BASE, access_token).map_err(AuthError::Api)?;

        let budgets: Data<BudgetsData> = api.get("budgets", &[]).map_err(AuthError::Api)?;
        let budget = find_by_name(&budgets.data.budgets, budget_name)
            .ok_or_else(|| AuthError::BudgetNotFound(budget_name.to_owned()))?;

        let accounts: Data<AccountsData> = api
            .get(&format!("budgets/{}/accounts", budget.id), &[])
            .map_err(AuthError::Api)?;
        let account = find_by_name(&accounts.data.accounts, account_name)
            .ok_or_else(|| AuthError::AccountNotFound(account_name.to_owned()))?;

        tracing::info!(
            "Resolved YNAB budget '{}' ({}) and account '{}' ({})",
            budget.name,
            budget.id,
            account.name,
            account.id
        );

        Ok(Ynab {
            api,
            budget_id: budget.id.clone(),
            account_id: account.id.clone(),
        })
    }

    fn body<'a>(&'a self, transaction: &'a SaveTransaction) -> SaveTransactionWrapper<'a> {
        SaveTransactionWrapper {
            transaction: SaveTransactionBody {
                account_id: &self.account_id,
                date: transaction.date,
                amount: transaction.amount.0,
                memo: &transaction.memo,
                cleared: "cleared",
                approved: false,
            },
        }
    }
}

impl LedgerSink for Ynab {
    fn create_transaction(&self, transaction: &SaveTransaction) -> Result<()> {
        let _: Ignored = self
            .api
            .post(
                &format!("budgets/{}/transactions", self.budget_id),
                &self.body(transaction),
            )
            .with_context(|| format!("Failed to create YNAB transaction {transaction}"))?;
        Ok(())
    }

    fn update_transaction(
        &self,
        id: &LedgerTransactionId,
        transaction: &SaveTransaction,
    ) -> Result<()> {
        let _: Ignored = self
            .api
            .put(
                &format!("budgets/{}/transactions/{id}", self.budget_id),
                &self.body(transaction),
            )
            .with_context(|| format!("Failed to update YNAB transaction {id}"))?;
        Ok(())
    }

    fn list_transactions_since(&self, since: NaiveDate) -> Result<Vec<LedgerTransaction>> {
        let response: Data<TransactionsData> = self
            .api
            .get(
                &format!(
                    "budgets/{}/accounts/{}/transactions",
                    self.budget_id, self.account_id
                ),
                &[("since_date", since.format("%Y-%m-%d").to_string())],
            )
            .context("Failed to list YNAB transactions")?;
        Ok(response
            .data
            .transactions
            .into_iter()
            .map(LedgerTransaction::from)
            .collect())
    }
}
