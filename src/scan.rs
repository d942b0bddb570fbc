//! Scan orchestration: sample once, fan rules out in parallel, fan results
//! back into a report.

use chrono::Utc;
use datafusion::prelude::SessionContext;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::eval::{evaluate_rule, RuleOutcome};
use crate::report::{ScanReport, ScanStatus};
use crate::sample::Sampler;
use crate::spec::RuleSet;

/// Options controlling a single scan run.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Overall deadline for rule evaluation; on expiry the run is cancelled
    pub timeout: Option<Duration>,
    /// Caller-supplied cancellation; completed outcomes are retained
    pub cancel: CancellationToken,
    /// Seed for reproducible sampling
    pub sample_seed: Option<u64>,
}

impl ScanOptions {
    /// Sets an overall evaluation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a caller-owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Seeds the sampler for reproducible runs.
    pub fn with_sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }
}

/// A named data-quality scan: a validated ruleset bound to a table.
///
/// # Examples
///
/// ```rust,no_run
/// use datafusion::prelude::SessionContext;
/// use dq_scan::scan::{QualityScan, ScanOptions};
/// use dq_scan::spec::RuleSet;
///
/// # async fn example() -> dq_scan::error::Result<()> {
/// let ruleset = RuleSet::from_path("rides_quality.yaml")?;
/// let scan = QualityScan::new("rides_quality", ruleset).with_table_name("rides");
///
/// let ctx = SessionContext::new();
/// // ... register the rides table ...
/// let report = scan.run(&ctx, ScanOptions::default()).await?;
/// if !report.passed {
///     for failure in report.failures() {
///         eprintln!("rule {} failed", failure.index);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QualityScan {
    name: String,
    ruleset: Arc<RuleSet>,
    table_name: String,
}

impl QualityScan {
    /// Creates a scan over the default table name `data`.
    pub fn new(name: impl Into<String>, ruleset: RuleSet) -> Self {
        Self {
            name: name.into(),
            ruleset: Arc::new(ruleset),
            table_name: "data".to_string(),
        }
    }

    /// Sets the name of the table the ruleset applies to.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Returns the scan name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ruleset this scan evaluates.
    pub fn ruleset(&self) -> &RuleSet {
        &self.ruleset
    }

    /// Runs the scan: draws the sample, evaluates every rule against it,
    /// and aggregates the outcomes.
    ///
    /// Only sampling failures abort the run (`SourceUnavailable`); per-rule
    /// evaluation failures surface as `Errored` outcomes inside the report.
    /// Rules are independent, so they evaluate concurrently, one spawned
    /// task per rule, each writing its own result slot by rule index.
    #[instrument(skip(self, ctx, options), fields(
        scan.name = %self.name,
        scan.table = %self.table_name,
        scan.rules = self.ruleset.rules.len()
    ))]
    pub async fn run(&self, ctx: &SessionContext, options: ScanOptions) -> Result<ScanReport> {
        let started_at = Utc::now();
        info!(
            scan.name = %self.name,
            scan.table = %self.table_name,
            scan.rules = self.ruleset.rules.len(),
            "Starting quality scan"
        );

        let mut sampler = Sampler::new(
            self.ruleset.row_filter.clone(),
            self.ruleset.sampling_percent,
        );
        if let Some(seed) = options.sample_seed {
            sampler = sampler.with_seed(seed);
        }
        let sample = Arc::new(sampler.sample(ctx, &self.table_name).await?);

        // All tasks listen on a child token so a timeout cannot cancel the
        // caller's own token.
        let run_token = options.cancel.child_token();
        let deadline = options.timeout.map(|timeout| {
            let deadline_token = run_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                deadline_token.cancel();
            })
        });

        let handles: Vec<_> = self
            .ruleset
            .rules
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, rule)| {
                let sample = Arc::clone(&sample);
                let token = run_token.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => None,
                        outcome = evaluate_rule(&sample, index, &rule) => Some(outcome),
                    }
                })
            })
            .collect();

        // Fan-in: join order matches rule order, so each result lands in its
        // own pre-sized slot without coordination.
        let mut outcomes: Vec<RuleOutcome> = Vec::with_capacity(handles.len());
        for (index, handle) in futures::future::join_all(handles)
            .await
            .into_iter()
            .enumerate()
        {
            let rule = &self.ruleset.rules[index];
            let outcome = match handle {
                Ok(Some(outcome)) => outcome,
                Ok(None) => {
                    debug!(rule.index = index, "Rule cancelled before completion");
                    RuleOutcome::cancelled(index, rule)
                }
                Err(join_err) => RuleOutcome::errored(index, rule, join_err.to_string()),
            };
            outcomes.push(outcome);
        }

        // the timer must not outlive the run it guards
        if let Some(handle) = deadline {
            handle.abort();
        }

        let cancelled = run_token.is_cancelled();
        let passed = !cancelled && outcomes.iter().all(|o| o.passed);
        let status = if cancelled {
            ScanStatus::Cancelled
        } else if passed {
            ScanStatus::Passed
        } else {
            ScanStatus::Failed
        };

        let results_table = self
            .ruleset
            .post_scan_actions
            .as_ref()
            .and_then(|actions| actions.bigquery_export.as_ref())
            .map(|export| export.results_table.clone());

        let report = ScanReport {
            scan: self.name.clone(),
            status,
            passed,
            started_at,
            finished_at: Utc::now(),
            source_rows: sample.source_row_count(),
            sampled_rows: sample.row_count(),
            outcomes,
            results_table,
        };

        let summary = report.summary();
        if report.passed {
            info!(
                scan.name = %self.name,
                rules.passed = summary.passed,
                rules.total = summary.total,
                sample.rows = report.sampled_rows,
                "Quality scan passed"
            );
        } else {
            warn!(
                scan.name = %self.name,
                scan.status = ?report.status,
                rules.passed = summary.passed,
                rules.failed = summary.failed,
                rules.errored = summary.errored,
                rules.cancelled = summary.cancelled,
                "Quality scan did not pass"
            );
        }

        Ok(report)
    }
}
