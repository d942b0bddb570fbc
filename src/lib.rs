//! # dq-scan: Declarative Data-Quality Scans for Rust
//!
//! dq-scan evaluates declarative data-quality rule documents against tabular
//! data. A document declares a row filter, a sampling percentage, and an
//! ordered list of rules spanning completeness, validity, uniqueness, and
//! custom SQL assertions; the engine draws a filtered probabilistic row
//! sample, evaluates every rule against it concurrently, and produces a
//! structured pass/fail report. Query execution is backed by
//! [DataFusion](https://datafusion.apache.org/) over Arrow record batches.
//!
//! ## Quick Start
//!
//! ```rust
//! use datafusion::prelude::*;
//! use dq_scan::prelude::*;
//!
//! # async fn example() -> dq_scan::error::Result<()> {
//! let ruleset = RuleSet::from_yaml(r#"
//! rowFilter: station_id IS NOT NULL
//! samplingPercent: '100'
//! rules:
//!   - nonNullExpectation: {}
//!     dimension: COMPLETENESS
//!     column: bike
//!   - rangeExpectation:
//!       minValue: '0'
//!       maxValue: '86400'
//!     dimension: VALIDITY
//!     column: duration
//!     threshold: 0.99
//! "#)?;
//!
//! let ctx = SessionContext::new();
//! // ... register the rides table ...
//!
//! let scan = QualityScan::new("rides_quality", ruleset).with_table_name("rides");
//! let report = scan.run(&ctx, ScanOptions::default()).await?;
//!
//! match report.status {
//!     ScanStatus::Passed => println!("all {} rules passed", report.outcomes.len()),
//!     ScanStatus::Failed => {
//!         for failure in report.failures() {
//!             println!("rule {} ({}) failed", failure.index, failure.dimension);
//!         }
//!     }
//!     ScanStatus::Cancelled => println!("partial results only"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! A scan flows through three stages:
//!
//! - **[`spec`]**: parses and validates the YAML rule document into an
//!   immutable [`spec::RuleSet`]. Every shape error is caught here, before
//!   any data is touched.
//! - **[`sample`]**: applies the row filter, draws a Bernoulli row sample,
//!   and materializes it in memory. This is the only I/O-bound step.
//! - **[`eval`]** / **[`scan`]**: evaluates each rule against the sample,
//!   one task per rule over the shared read-only sample, and aggregates the
//!   outcomes into a [`report::ScanReport`].
//!
//! Rules are independent: a failing or even unevaluable rule never stops the
//! others. Only a malformed document or an unreadable source table aborts a
//! run. Runs accept a cancellation token and an optional deadline; on
//! cancellation the report carries the outcomes completed so far.

pub mod error;
pub mod eval;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod sample;
pub mod scan;
pub mod security;
pub mod sources;
pub mod spec;
