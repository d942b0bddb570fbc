//! Prelude for commonly used types in dq-scan.

pub use crate::error::{DqError, Result};
pub use crate::eval::{RuleOutcome, RuleStatus};
pub use crate::logging::LogConfig;
pub use crate::report::{ScanReport, ScanStatus, ScanSummary};
pub use crate::sample::{RowSample, Sampler};
pub use crate::scan::{QualityScan, ScanOptions};
pub use crate::sources::{CsvSource, DataSource};
pub use crate::spec::{Dimension, Expectation, Rule, RuleSet};
