//! Aggregated scan results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::eval::{RuleOutcome, RuleStatus};

/// The overall status of a scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Every rule passed
    Passed,
    /// At least one rule failed or errored
    Failed,
    /// The run was cancelled; outcomes are partial
    Cancelled,
}

/// Per-status counts over a report's outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub cancelled: usize,
}

/// The structured report produced by a scan run.
///
/// Overall `passed` is the conjunction of all rule outcomes: errored and
/// cancelled rules are not passes. A `Cancelled` status means the outcome
/// list is partial: completed rules keep their real outcomes, pending ones
/// are marked cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Name of the scan that produced this report
    pub scan: String,
    /// Overall run status
    pub status: ScanStatus,
    /// Conjunction of all rule outcomes
    pub passed: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Rows in the filtered source the sample was drawn from
    pub source_rows: u64,
    /// Rows in the evaluated sample
    pub sampled_rows: u64,
    /// One outcome per rule, in document order
    pub outcomes: Vec<RuleOutcome>,
    /// Export destination carried through from `postScanActions`, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_table: Option<String>,
}

impl ScanReport {
    /// Counts outcomes by terminal status.
    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary {
            total: self.outcomes.len(),
            passed: 0,
            failed: 0,
            errored: 0,
            cancelled: 0,
        };
        for outcome in &self.outcomes {
            match outcome.status {
                RuleStatus::Passed => summary.passed += 1,
                RuleStatus::Failed => summary.failed += 1,
                RuleStatus::Errored => summary.errored += 1,
                RuleStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }

    /// The outcomes that did not pass, in document order.
    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
