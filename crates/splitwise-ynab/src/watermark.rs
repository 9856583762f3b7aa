use serde::{Deserialize, Serialize};

use crate::{Expense, Timestamp};

/// How the watermark moves forward after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPolicy {
    /// The wall clock time at which the run started.
    #[default]
    RunStart,
    /// The latest created/updated/deleted timestamp in the fetched batch.
    LatestSeen,
}

impl WatermarkPolicy {
    pub fn next(self, current: Timestamp, run_started: Timestamp, batch: &[Expense]) -> Timestamp {
        match self {
            WatermarkPolicy::RunStart => run_started,
            WatermarkPolicy::LatestSeen => batch
                .iter()
                .map(Expense::last_seen)
                .fold(current, Timestamp::max),
        }
    }
}
