//! Reconciling a batch of changed expenses against the ledger.
//!
//! Expenses are sorted into buckets relative to the watermark, turned into a
//! [`ReconcilePlan`] and then applied to a [`LedgerSink`] one action at a time.

mod matching;

pub use matching::{CorrelationKey, LedgerIndex, key_in_memo, tag_description};

use std::fmt;

use chrono::{NaiveDate, Utc};

use crate::{
    Expense, ExpenseId, ExpenseSource, GroupFilter, LedgerSink, LedgerTransactionId, Result,
    SaveTransaction, Timestamp, WatermarkPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Created after the watermark, never seen by the ledger.
    New,
    /// Created before the watermark and changed since.
    Updated,
    /// Created before the watermark and deleted since.
    Deleted,
    /// Created and deleted after the watermark. Nothing to do.
    Dropped,
}

pub fn bucket_for(expense: &Expense, watermark: Timestamp) -> Bucket {
    let created_after = expense.created_at > watermark;
    match (expense.is_deleted(), created_after) {
        (true, true) => Bucket::Dropped,
        (true, false) => Bucket::Deleted,
        (false, true) => Bucket::New,
        (false, false) => Bucket::Updated,
    }
}

/// A fetched batch split into disjoint buckets, descriptions already tagged.
#[derive(Debug, Default)]
pub struct Classification {
    pub new: Vec<Expense>,
    pub updated: Vec<Expense>,
    pub deleted: Vec<Expense>,
    pub dropped: Vec<Expense>,
    /// Earliest creation time in the batch, bounds the ledger search.
    pub oldest_created: Option<Timestamp>,
}

impl Classification {
    pub fn len(&self) -> usize {
        self.new.len() + self.updated.len() + self.deleted.len() + self.dropped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn classify(batch: &[Expense], watermark: Timestamp) -> Classification {
    let mut classification = Classification {
        oldest_created: batch.iter().map(|expense| expense.created_at).min(),
        ..Default::default()
    };

    for expense in batch {
        let tagged = Expense {
            description: tag_description(&expense.description, expense.id),
            ..expense.clone()
        };
        let bucket = bucket_for(&tagged, watermark);
        tracing::debug!("{bucket:?}: {tagged}");

        match bucket {
            Bucket::New => classification.new.push(tagged),
            Bucket::Updated => classification.updated.push(tagged),
            Bucket::Deleted => classification.deleted.push(tagged),
            Bucket::Dropped => classification.dropped.push(tagged),
        }
    }

    tracing::info!(
        "Classified {} expenses: {} new, {} updated, {} deleted, {} dropped",
        classification.len(),
        classification.new.len(),
        classification.updated.len(),
        classification.deleted.len(),
        classification.dropped.len()
    );

    classification
}

/// Where to pull from and how to advance afterwards.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub group: GroupFilter,
    pub watermark: Timestamp,
    pub policy: WatermarkPolicy,
}

impl ReconcileConfig {
    pub fn new(group: GroupFilter, watermark: Timestamp, policy: WatermarkPolicy) -> Self {
        ReconcileConfig {
            group,
            watermark,
            policy,
        }
    }

    /// Fetch everything that changed since the watermark.
    pub fn read(&self, source: &impl ExpenseSource) -> Result<ReconcileState> {
        self.read_at(source, Utc::now())
    }

    pub fn read_at(
        &self,
        source: &impl ExpenseSource,
        run_started: Timestamp,
    ) -> Result<ReconcileState> {
        tracing::info!("Fetching expenses since {}", self.watermark);
        let batch = source.fetch_expenses(self.group, self.watermark)?;
        tracing::info!("Fetched {} expenses", batch.len());

        Ok(ReconcileState {
            config: self.clone(),
            run_started,
            batch,
        })
    }
}

/// One fetched batch plus what is needed to reconcile it.
#[derive(Debug)]
pub struct ReconcileState {
    config: ReconcileConfig,
    run_started: Timestamp,
    batch: Vec<Expense>,
}

impl ReconcileState {
    pub fn classify(&self) -> Classification {
        classify(&self.batch, self.config.watermark)
    }

    pub fn plan(&self) -> ReconcilePlan {
        ReconcilePlan::new(self.classify())
    }

    /// The watermark to persist once the plan has been applied.
    pub fn next_watermark(&self) -> Timestamp {
        self.config
            .policy
            .next(self.config.watermark, self.run_started, &self.batch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create {
        expense: ExpenseId,
        transaction: SaveTransaction,
    },
    /// Overwrite the tagged ledger transaction, or create one if there is none.
    UpdateOrCreate {
        expense: ExpenseId,
        transaction: SaveTransaction,
    },
    /// Set the tagged ledger transaction's amount to zero.
    Zero {
        expense: ExpenseId,
        transaction: SaveTransaction,
    },
}

impl PlannedAction {
    pub fn expense(&self) -> ExpenseId {
        match self {
            PlannedAction::Create { expense, .. }
            | PlannedAction::UpdateOrCreate { expense, .. }
            | PlannedAction::Zero { expense, .. } => *expense,
        }
    }

    pub fn transaction(&self) -> &SaveTransaction {
        match self {
            PlannedAction::Create { transaction, .. }
            | PlannedAction::UpdateOrCreate { transaction, .. }
            | PlannedAction::Zero { transaction, .. } => transaction,
        }
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            PlannedAction::Create { .. } => "create",
            PlannedAction::UpdateOrCreate { .. } => "update",
            PlannedAction::Zero { .. } => "zero",
        };
        write!(f, "{verb} #{}: {}", self.expense(), self.transaction())
    }
}

/// Everything a run intends to do to the ledger, in order: new, updated, deleted.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub actions: Vec<PlannedAction>,
    pub dropped: Vec<ExpenseId>,
    /// Expenses whose amount could not be expressed in the ledger.
    pub rejected: Vec<ExpenseId>,
    search_since: Option<NaiveDate>,
}

impl ReconcilePlan {
    pub fn new(classification: Classification) -> Self {
        let mut plan = ReconcilePlan {
            dropped: classification.dropped.iter().map(|e| e.id).collect(),
            search_since: classification.oldest_created.map(|at| at.date_naive()),
            ..Default::default()
        };

        plan.push_bucket(classification.new, |expense, transaction| {
            PlannedAction::Create {
                expense,
                transaction,
            }
        });
        plan.push_bucket(classification.updated, |expense, transaction| {
            PlannedAction::UpdateOrCreate {
                expense,
                transaction,
            }
        });
        plan.push_bucket(classification.deleted, |expense, transaction| {
            PlannedAction::Zero {
                expense,
                transaction: transaction.zeroed(),
            }
        });

        plan
    }

    fn push_bucket(
        &mut self,
        expenses: Vec<Expense>,
        action: impl Fn(ExpenseId, SaveTransaction) -> PlannedAction,
    ) {
        for expense in expenses {
            let transaction = SaveTransaction::from_expense(
                expense.cost,
                &expense.description,
                expense.created_at,
            );
            match transaction {
                Ok(transaction) => self.actions.push(action(expense.id, transaction)),
                Err(e) => {
                    tracing::error!("Skipping expense {}: {e:#}", expense.id);
                    self.rejected.push(expense.id);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Apply every action. Failures are logged and counted, never propagated.
    pub fn apply(&self, sink: &impl LedgerSink) -> ApplyReport {
        let mut report = ApplyReport {
            dropped: self.dropped.len(),
            rejected: self.rejected.len(),
            ..Default::default()
        };
        // listed lazily, at most once per run
        let mut index: Option<Option<LedgerIndex>> = None;

        for action in &self.actions {
            let expense = action.expense();
            match action {
                PlannedAction::Create { .. } => {
                    create(sink, action, &mut report, Outcome::Created);
                }
                PlannedAction::UpdateOrCreate { transaction, .. } => {
                    let Some(index) = self.searchable(&mut index, sink, &mut report, expense)
                    else {
                        continue;
                    };
                    match index.find(expense) {
                        Some(existing) => {
                            tracing::info!(
                                "Matched expense {expense} to ledger transaction {}",
                                existing.id
                            );
                            update(
                                sink,
                                &existing.id,
                                transaction,
                                expense,
                                &mut report,
                                Outcome::Updated,
                            );
                        }
                        None => {
                            tracing::info!(
                                "No ledger transaction for updated expense {expense}, creating one"
                            );
                            create(sink, action, &mut report, Outcome::FallbackCreated);
                        }
                    }
                }
                PlannedAction::Zero { transaction, .. } => {
                    let Some(index) = self.searchable(&mut index, sink, &mut report, expense)
                    else {
                        continue;
                    };
                    match index.find(expense) {
                        Some(existing) => {
                            tracing::info!(
                                "Matched deleted expense {expense} to ledger transaction {}",
                                existing.id
                            );
                            update(
                                sink,
                                &existing.id,
                                transaction,
                                expense,
                                &mut report,
                                Outcome::Zeroed,
                            );
                        }
                        None => {
                            tracing::info!(
                                "No ledger transaction for deleted expense {expense}, nothing to zero"
                            );
                            report.unmatched_deletions += 1;
                        }
                    }
                }
            }
        }

        tracing::info!("{report}");
        report
    }

    /// The ledger index, listing it on first use. `None` if listing failed.
    fn searchable<'a>(
        &self,
        index: &'a mut Option<Option<LedgerIndex>>,
        sink: &impl LedgerSink,
        report: &mut ApplyReport,
        expense: ExpenseId,
    ) -> Option<&'a LedgerIndex> {
        let index = index.get_or_insert_with(|| self.load_index(sink)).as_ref();
        if index.is_none() {
            tracing::warn!("Skipping expense {expense}: ledger search unavailable");
            report.skipped += 1;
        }
        index
    }

    fn load_index(&self, sink: &impl LedgerSink) -> Option<LedgerIndex> {
        let Some(since) = self.search_since else {
            return Some(LedgerIndex::default());
        };
        tracing::info!("Listing ledger transactions since {since}");
        match sink.list_transactions_since(since) {
            Ok(transactions) => {
                tracing::debug!("Searching {} ledger transactions", transactions.len());
                Some(LedgerIndex::new(transactions))
            }
            Err(e) => {
                tracing::error!("Failed to list ledger transactions: {e:#}");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Created,
    FallbackCreated,
    Updated,
    Zeroed,
}

impl ApplyReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::FallbackCreated => self.fallback_created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Zeroed => self.zeroed += 1,
        }
    }
}

fn create(
    sink: &impl LedgerSink,
    action: &PlannedAction,
    report: &mut ApplyReport,
    outcome: Outcome,
) {
    let expense = action.expense();
    let transaction = action.transaction();
    tracing::info!("Creating ledger transaction for expense {expense}: {transaction}");
    match sink.create_transaction(transaction) {
        Ok(()) => report.record(outcome),
        Err(e) => {
            tracing::error!("Failed to create transaction for expense {expense}: {e:#}");
            report.failed += 1;
        }
    }
}

fn update(
    sink: &impl LedgerSink,
    id: &LedgerTransactionId,
    transaction: &SaveTransaction,
    expense: ExpenseId,
    report: &mut ApplyReport,
    outcome: Outcome,
) {
    tracing::info!("Updating ledger transaction {id} for expense {expense}: {transaction}");
    match sink.update_transaction(id, transaction) {
        Ok(()) => report.record(outcome),
        Err(e) => {
            tracing::error!("Failed to update transaction {id} for expense {expense}: {e:#}");
            report.failed += 1;
        }
    }
}

/// Counters for one [`ReconcilePlan::apply`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub zeroed: usize,
    /// Updated expenses without a ledger match, created instead.
    pub fallback_created: usize,
    /// Deleted expenses without a ledger match.
    pub unmatched_deletions: usize,
    pub dropped: usize,
    pub rejected: usize,
    pub failed: usize,
    /// Actions not attempted because the ledger could not be searched.
    pub skipped: usize,
}

impl ApplyReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.skipped > 0 || self.rejected > 0
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} zeroed, {} created from updates, {} deletions unmatched, {} dropped, {} rejected, {} failed, {} skipped",
            self.created,
            self.updated,
            self.zeroed,
            self.fallback_created,
            self.unmatched_deletions,
            self.dropped,
            self.rejected,
            self.failed,
            self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decimal, LedgerTransaction, Milliunits};
    use anyhow::bail;
    use chrono::TimeZone;
    use std::cell::RefCell;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn watermark() -> Timestamp {
        ts(2023, 1, 1)
    }

    fn expense(id: u64, cost: &str, created: Timestamp, deleted: Option<Timestamp>) -> Expense {
        Expense {
            id: ExpenseId(id),
            cost: cost.parse().unwrap(),
            description: format!("Expense {id}"),
            created_at: created,
            updated_at: None,
            deleted_at: deleted,
        }
    }

    /// The four-way scenario: new, updated, deleted and dropped.
    fn scenario() -> Vec<Expense> {
        vec![
            expense(1, "10.00", ts(2023, 2, 1), None),
            expense(2, "20.50", ts(2022, 12, 1), None),
            expense(3, "5.25", ts(2022, 11, 1), Some(ts(2023, 3, 1))),
            expense(4, "7.00", ts(2023, 2, 1), Some(ts(2023, 2, 15))),
        ]
    }

    fn ids(expenses: &[Expense]) -> Vec<u64> {
        expenses.iter().map(|e| e.id.0).collect()
    }

    fn ledger(id: &str, memo: &str) -> LedgerTransaction {
        LedgerTransaction {
            id: LedgerTransactionId(id.to_owned()),
            date: NaiveDate::from_ymd_opt(2022, 12, 1).unwrap(),
            amount: Milliunits(1),
            memo: Some(memo.to_owned()),
            deleted: false,
        }
    }

    #[derive(Default)]
    struct FakeSink {
        existing: Vec<LedgerTransaction>,
        fail_memos: Vec<String>,
        fail_listing: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeSink {
        fn calls(&self) -> String {
            self.calls.borrow().join("\n")
        }
    }

    impl LedgerSink for FakeSink {
        fn create_transaction(&self, transaction: &SaveTransaction) -> Result<()> {
            self.calls.borrow_mut().push(format!("create {transaction}"));
            if self.fail_memos.contains(&transaction.memo) {
                bail!("429 Too Many Requests");
            }
            Ok(())
        }

        fn update_transaction(
            &self,
            id: &LedgerTransactionId,
            transaction: &SaveTransaction,
        ) -> Result<()> {
            self.calls.borrow_mut().push(format!("update {id} {transaction}"));
            if self.fail_memos.contains(&transaction.memo) {
                bail!("401 Unauthorized");
            }
            Ok(())
        }

        fn list_transactions_since(&self, since: NaiveDate) -> Result<Vec<LedgerTransaction>> {
            self.calls.borrow_mut().push(format!("list since {since}"));
            if self.fail_listing {
                bail!("connection reset");
            }
            Ok(self.existing.clone())
        }
    }

    struct FakeSource(Vec<Expense>);

    impl ExpenseSource for FakeSource {
        fn fetch_expenses(&self, _group: GroupFilter, since: Timestamp) -> Result<Vec<Expense>> {
            Ok(self
                .0
                .iter()
                .filter(|e| e.last_seen() > since)
                .cloned()
                .collect())
        }
    }

    // Classification

    #[test]
    fn classify_scenario() {
        let classification = classify(&scenario(), watermark());

        assert_eq!(ids(&classification.new), [1]);
        assert_eq!(ids(&classification.updated), [2]);
        assert_eq!(ids(&classification.deleted), [3]);
        assert_eq!(ids(&classification.dropped), [4]);
        assert_eq!(classification.new[0].description, "Expense 1, sw_uuid:1");
        assert_eq!(classification.oldest_created, Some(ts(2022, 11, 1)));
    }

    #[test]
    fn classify_partitions_every_batch() {
        let instants = [ts(2022, 6, 1), watermark(), ts(2023, 6, 1)];
        let mut batch = Vec::new();
        let mut id = 0;
        for created in instants {
            for deleted in [None, Some(ts(2023, 7, 1))] {
                id += 1;
                batch.push(expense(id, "1", created, deleted));
            }
        }

        let classification = classify(&batch, watermark());
        let mut seen: Vec<u64> = [
            &classification.new,
            &classification.updated,
            &classification.deleted,
            &classification.dropped,
        ]
        .into_iter()
        .flat_map(|bucket| ids(bucket))
        .collect();
        seen.sort();
        assert_eq!(seen, ids(&batch));

        // created exactly at the watermark is not "after" it
        assert_eq!(ids(&classification.new), [5]);
        assert_eq!(ids(&classification.updated), [1, 3]);
        assert_eq!(ids(&classification.deleted), [2, 4]);
        assert_eq!(ids(&classification.dropped), [6]);
    }

    #[test]
    fn bucket_ignores_deletion_time() {
        let early_delete = expense(1, "1", ts(2022, 1, 1), Some(ts(2022, 2, 1)));
        assert_eq!(bucket_for(&early_delete, watermark()), Bucket::Deleted);
    }

    #[test]
    fn classify_empty_batch() {
        let classification = classify(&[], watermark());
        assert!(classification.is_empty());
        assert_eq!(classification.oldest_created, None);
        assert!(ReconcilePlan::new(classification).is_empty());
    }

    #[test]
    fn every_action_carries_one_key() {
        let plan = ReconcilePlan::new(classify(&scenario(), watermark()));
        for action in &plan.actions {
            let memo = &action.transaction().memo;
            let key = format!("sw_uuid:{}", action.expense());
            assert_eq!(memo.matches("sw_uuid:").count(), 1, "{memo}");
            assert!(memo.ends_with(&key), "{memo}");
        }
    }

    // Planning

    #[test]
    fn plan_scenario() {
        let plan = ReconcilePlan::new(classify(&scenario(), watermark()));
        let rendered: Vec<String> = plan.actions.iter().map(ToString::to_string).collect();

        insta::assert_snapshot!(rendered.join("\n"), @r#"
        create #1: 2023-02-01 10.000 "Expense 1, sw_uuid:1"
        update #2: 2022-12-01 20.500 "Expense 2, sw_uuid:2"
        zero #3: 2022-11-01 0.000 "Expense 3, sw_uuid:3"
        "#);
        assert_eq!(plan.dropped, [ExpenseId(4)]);
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn plan_rejects_unrepresentable_amounts() {
        let mut huge = expense(9, "1", ts(2023, 5, 1), None);
        huge.cost = Decimal::MAX;
        let plan = ReconcilePlan::new(classify(&[huge], watermark()));

        assert!(plan.is_empty());
        assert_eq!(plan.rejected, [ExpenseId(9)]);
        assert_eq!(plan.apply(&FakeSink::default()).rejected, 1);
    }

    // Applying

    #[test]
    fn apply_scenario_with_matches() {
        let sink = FakeSink {
            existing: vec![
                ledger("tx-2", "Expense 2, sw_uuid:2"),
                ledger("tx-3", "Expense 3, sw_uuid:3"),
                ledger("tx-other", "Coffee"),
            ],
            ..Default::default()
        };
        let plan = ReconcilePlan::new(classify(&scenario(), watermark()));
        let report = plan.apply(&sink);

        insta::assert_snapshot!(sink.calls(), @r#"
        create 2023-02-01 10.000 "Expense 1, sw_uuid:1"
        list since 2022-11-01
        update tx-2 2022-12-01 20.500 "Expense 2, sw_uuid:2"
        update tx-3 2022-11-01 0.000 "Expense 3, sw_uuid:3"
        "#);
        assert_eq!(
            report,
            ApplyReport {
                created: 1,
                updated: 1,
                zeroed: 1,
                dropped: 1,
                ..Default::default()
            }
        );
        assert!(!report.has_failures());
    }

    #[test]
    fn apply_without_matches() {
        let sink = FakeSink::default();
        let plan = ReconcilePlan::new(classify(&scenario(), watermark()));
        let report = plan.apply(&sink);

        insta::assert_snapshot!(sink.calls(), @r#"
        create 2023-02-01 10.000 "Expense 1, sw_uuid:1"
        list since 2022-11-01
        create 2022-12-01 20.500 "Expense 2, sw_uuid:2"
        "#);
        assert_eq!(report.created, 1);
        assert_eq!(report.fallback_created, 1);
        assert_eq!(report.unmatched_deletions, 1);
        assert_eq!(report.updated + report.zeroed, 0);
    }

    #[test]
    fn apply_only_new_never_lists() {
        let sink = FakeSink::default();
        let batch = [expense(1, "1", ts(2023, 2, 1), None)];
        ReconcilePlan::new(classify(&batch, watermark())).apply(&sink);

        insta::assert_snapshot!(sink.calls(), @r#"create 2023-02-01 1.000 "Expense 1, sw_uuid:1""#);
    }

    #[test]
    fn failed_create_does_not_block_the_rest() {
        let batch = [
            expense(1, "1", ts(2023, 2, 1), None),
            expense(2, "2", ts(2023, 2, 2), None),
            expense(3, "3", ts(2023, 2, 3), None),
        ];
        let sink = FakeSink {
            fail_memos: vec!["Expense 1, sw_uuid:1".to_owned()],
            ..Default::default()
        };
        let report = ReconcilePlan::new(classify(&batch, watermark())).apply(&sink);

        assert_eq!(sink.calls.borrow().len(), 3);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert!(report.has_failures());
    }

    #[test]
    fn failed_update_is_counted() {
        let sink = FakeSink {
            existing: vec![ledger("tx-2", "sw_uuid:2")],
            fail_memos: vec!["Expense 2, sw_uuid:2".to_owned()],
            ..Default::default()
        };
        let batch = [expense(2, "2", ts(2022, 12, 1), None)];
        let report = ReconcilePlan::new(classify(&batch, watermark())).apply(&sink);

        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 0);
    }

    #[test]
    fn failed_listing_skips_search_actions_only() {
        let sink = FakeSink {
            fail_listing: true,
            ..Default::default()
        };
        let plan = ReconcilePlan::new(classify(&scenario(), watermark()));
        let report = plan.apply(&sink);

        insta::assert_snapshot!(sink.calls(), @r#"
        create 2023-02-01 10.000 "Expense 1, sw_uuid:1"
        list since 2022-11-01
        "#);
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn report_display() {
        let report = ApplyReport {
            created: 3,
            updated: 1,
            failed: 2,
            ..Default::default()
        };
        insta::assert_snapshot!(report.to_string(), @"3 created, 1 updated, 0 zeroed, 0 created from updates, 0 deletions unmatched, 0 dropped, 0 rejected, 2 failed, 0 skipped");
    }

    // Reading and watermarks

    #[test]
    fn read_fetches_since_watermark() {
        let source = FakeSource(vec![
            expense(1, "1", ts(2022, 6, 1), None),
            expense(2, "2", ts(2023, 2, 1), None),
        ]);
        let config = ReconcileConfig::new(GroupFilter::All, watermark(), WatermarkPolicy::RunStart);
        let state = config.read_at(&source, ts(2023, 4, 1)).unwrap();

        assert_eq!(ids(&state.classify().new), [2]);
        assert_eq!(state.next_watermark(), ts(2023, 4, 1));
    }

    #[test]
    fn read_with_latest_seen_policy() {
        let mut changed = expense(1, "1", ts(2022, 6, 1), None);
        changed.updated_at = Some(ts(2023, 3, 10));
        let source = FakeSource(vec![changed, expense(2, "2", ts(2023, 2, 1), None)]);
        let config =
            ReconcileConfig::new(GroupFilter::All, watermark(), WatermarkPolicy::LatestSeen);
        let state = config.read_at(&source, ts(2023, 4, 1)).unwrap();

        assert_eq!(state.next_watermark(), ts(2023, 3, 10));
        assert_eq!(ids(&state.classify().updated), [1]);
    }
}
