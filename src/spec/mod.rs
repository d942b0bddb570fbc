//! The declarative rule document: row filter, sampling percent, and an
//! ordered list of data-quality rules.
//!
//! A [`RuleSet`] is the typed, validated form of the YAML wire document
//! produced by spreadsheet-to-YAML tooling. The wire contract is strict:
//! field names (`rowFilter`, `samplingPercent`, `ignoreNull`, ...) and the
//! eight expectation kind names round-trip exactly. Parsing and validation
//! live in the [`loader`] submodule; a `RuleSet` that made it through the
//! loader is immutable and safe to evaluate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;

pub mod loader;

/// The data-quality dimension a rule measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Completeness,
    Validity,
    Uniqueness,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Completeness => "COMPLETENESS",
            Dimension::Validity => "VALIDITY",
            Dimension::Uniqueness => "UNIQUENESS",
        };
        write!(f, "{name}")
    }
}

/// Numeric bounds for a range expectation.
///
/// `strict_min`/`strict_max` select exclusive (`>` / `<`) versus inclusive
/// (`>=` / `<=`) comparison for the corresponding bound.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBounds {
    pub min_value: f64,
    pub max_value: f64,
    pub strict_min: bool,
    pub strict_max: bool,
}

/// The condition a rule checks against data, one variant per wire kind.
///
/// Evaluation dispatches over this enum with an exhaustive match; adding a
/// kind here forces the evaluator to handle it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// The column must not be null.
    NonNull,
    /// The column must fall within numeric bounds.
    Range(RangeBounds),
    /// Column values must be distinct within the sample.
    Uniqueness,
    /// A per-row boolean SQL predicate.
    RowCondition { sql_expression: String },
    /// The column must match a regular expression.
    Regex { pattern: String },
    /// The column value must belong to an enumerated set.
    Set { values: Vec<String> },
    /// A single boolean evaluated over an aggregate of the whole sample.
    TableCondition { sql_expression: String },
    /// An arbitrary query; passes iff it returns zero rows.
    SqlAssertion { sql_statement: String },
}

/// Whether an expectation kind needs a `column` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnUsage {
    Required,
    Optional,
    Forbidden,
}

impl Expectation {
    /// The kind name as it appears on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Expectation::NonNull => "nonNullExpectation",
            Expectation::Range(_) => "rangeExpectation",
            Expectation::Uniqueness => "uniquenessExpectation",
            Expectation::RowCondition { .. } => "rowConditionExpectation",
            Expectation::Regex { .. } => "regexExpectation",
            Expectation::Set { .. } => "setExpectation",
            Expectation::TableCondition { .. } => "tableConditionExpectation",
            Expectation::SqlAssertion { .. } => "sqlAssertion",
        }
    }

    /// The dimension a rule of this kind measures when the document does not
    /// say otherwise.
    pub fn default_dimension(&self) -> Dimension {
        match self {
            Expectation::NonNull => Dimension::Completeness,
            Expectation::Uniqueness => Dimension::Uniqueness,
            _ => Dimension::Validity,
        }
    }

    /// True for expectations with a single pass/fail outcome and no per-row
    /// pass ratio.
    pub fn is_table_level(&self) -> bool {
        matches!(
            self,
            Expectation::TableCondition { .. } | Expectation::SqlAssertion { .. }
        )
    }

    /// How this kind uses the rule's `column` field.
    pub fn column_usage(&self) -> ColumnUsage {
        match self {
            Expectation::NonNull
            | Expectation::Range(_)
            | Expectation::Uniqueness
            | Expectation::Regex { .. }
            | Expectation::Set { .. } => ColumnUsage::Required,
            Expectation::RowCondition { .. } => ColumnUsage::Optional,
            Expectation::TableCondition { .. } | Expectation::SqlAssertion { .. } => {
                ColumnUsage::Forbidden
            }
        }
    }
}

/// A single validated data-quality rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// The quality dimension this rule measures
    pub dimension: Dimension,
    /// The column the rule applies to; absent for table-level rules
    pub column: Option<String>,
    /// Minimum fraction of evaluated rows that must pass, in [0, 1]
    pub threshold: f64,
    /// When true, null values leave the denominator instead of failing
    pub ignore_null: bool,
    /// The condition checked against the sample
    pub expectation: Expectation,
}

/// Post-scan actions carried through from the document.
///
/// These are passthrough configuration for the external reporting backend;
/// the engine surfaces them in the report but does not act on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostScanActions {
    #[serde(rename = "bigqueryExport", skip_serializing_if = "Option::is_none")]
    pub bigquery_export: Option<BigQueryExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigQueryExport {
    #[serde(rename = "resultsTable")]
    pub results_table: String,
}

/// A validated, immutable rule document.
///
/// # Examples
///
/// ```rust
/// use dq_scan::spec::RuleSet;
///
/// let yaml = r#"
/// samplingPercent: '100'
/// rules:
///   - nonNullExpectation: {}
///     column: bike
///     dimension: COMPLETENESS
/// "#;
/// let ruleset = RuleSet::from_yaml(yaml).unwrap();
/// assert_eq!(ruleset.rules.len(), 1);
/// assert_eq!(ruleset.sampling_percent, 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    /// Predicate restricting which source rows are eligible for sampling
    pub row_filter: Option<String>,
    /// Per-row inclusion probability, as a percentage in [0, 100]
    pub sampling_percent: f64,
    /// The rules, in document order
    pub rules: Vec<Rule>,
    /// Passthrough post-scan actions, if declared
    pub post_scan_actions: Option<PostScanActions>,
}

impl RuleSet {
    /// Parses and validates a rule document from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        loader::parse_yaml(text)
    }

    /// Parses and validates a rule document from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        loader::parse_yaml(&text)
    }

    /// Serializes the document back to YAML with the exact wire field names.
    pub fn to_yaml(&self) -> Result<String> {
        loader::to_yaml(self)
    }
}
