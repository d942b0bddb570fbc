//! Expectation evaluation against a materialized row sample.
//!
//! Each rule compiles to a single aggregate SQL query over the sample table
//! and dispatches on its expectation kind via exhaustive match. Row-level
//! kinds produce a pass ratio compared against the rule threshold;
//! table-level kinds (`tableConditionExpectation`, `sqlAssertion`) produce a
//! single boolean. Evaluation failures (a predicate that does not plan, a
//! regex the engine rejects) are recovered locally: the rule's outcome
//! becomes `Errored` and other rules are unaffected.

use arrow::array::{Array, BooleanArray, Int64Array};
use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::error::{DqError, Result};
use crate::sample::RowSample;
use crate::security::SqlSafety;
use crate::spec::{Dimension, Expectation, RangeBounds, Rule};

/// Patterns already vetted against the regex engine; matching itself happens
/// in SQL via the `~` operator.
static VALIDATED_PATTERNS: Lazy<RwLock<HashSet<String>>> =
    Lazy::new(|| RwLock::new(HashSet::new()));

/// The terminal state of a rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// The rule's pass condition held
    Passed,
    /// The rule evaluated cleanly but its pass condition did not hold
    Failed,
    /// The rule's expression failed to evaluate; other rules still ran
    Errored,
    /// The run was cancelled before this rule completed
    Cancelled,
}

/// The outcome of evaluating a single rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    /// Zero-based position of the rule in the document
    pub index: usize,
    /// The quality dimension the rule measures
    pub dimension: Dimension,
    /// The column the rule applies to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Fraction of evaluated rows that passed; absent for table-level rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_ratio: Option<f64>,
    /// Rows in the denominator; absent for table-level rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_evaluated: Option<u64>,
    /// Whether the rule passed
    pub passed: bool,
    /// The terminal state of this rule
    pub status: RuleStatus,
    /// Failure detail for errored rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl RuleOutcome {
    fn from_ratio(index: usize, rule: &Rule, ratio: f64, rows_evaluated: u64) -> Self {
        let passed = ratio >= rule.threshold;
        Self {
            index,
            dimension: rule.dimension,
            column: rule.column.clone(),
            pass_ratio: Some(ratio),
            rows_evaluated: Some(rows_evaluated),
            passed,
            status: if passed {
                RuleStatus::Passed
            } else {
                RuleStatus::Failed
            },
            error_detail: None,
        }
    }

    fn table_level(index: usize, rule: &Rule, passed: bool) -> Self {
        Self {
            index,
            dimension: rule.dimension,
            column: None,
            pass_ratio: None,
            rows_evaluated: None,
            passed,
            status: if passed {
                RuleStatus::Passed
            } else {
                RuleStatus::Failed
            },
            error_detail: None,
        }
    }

    /// An outcome for a rule whose expression failed to evaluate.
    pub fn errored(index: usize, rule: &Rule, detail: impl Into<String>) -> Self {
        Self {
            index,
            dimension: rule.dimension,
            column: rule.column.clone(),
            pass_ratio: None,
            rows_evaluated: None,
            passed: false,
            status: RuleStatus::Errored,
            error_detail: Some(detail.into()),
        }
    }

    /// An outcome for a rule the run was cancelled before completing.
    pub fn cancelled(index: usize, rule: &Rule) -> Self {
        Self {
            index,
            dimension: rule.dimension,
            column: rule.column.clone(),
            pass_ratio: None,
            rows_evaluated: None,
            passed: false,
            status: RuleStatus::Cancelled,
            error_detail: None,
        }
    }
}

/// Evaluates one rule against the sample.
///
/// Never returns an error: evaluation failures become an `Errored` outcome
/// so that a broken expression in one rule cannot abort the rest of the run.
#[instrument(skip(sample, rule), fields(
    rule.index = index,
    rule.kind = rule.expectation.wire_name(),
    rule.dimension = %rule.dimension
))]
pub async fn evaluate_rule(sample: &RowSample, index: usize, rule: &Rule) -> RuleOutcome {
    match try_evaluate(sample, index, rule).await {
        Ok(outcome) => {
            debug!(
                rule.index = index,
                rule.kind = rule.expectation.wire_name(),
                outcome.passed = outcome.passed,
                outcome.ratio = ?outcome.pass_ratio,
                "Rule evaluated"
            );
            outcome
        }
        Err(err) => {
            warn!(
                rule.index = index,
                rule.kind = rule.expectation.wire_name(),
                error = %err,
                "Rule expression failed to evaluate"
            );
            RuleOutcome::errored(index, rule, err.to_string())
        }
    }
}

async fn try_evaluate(sample: &RowSample, index: usize, rule: &Rule) -> Result<RuleOutcome> {
    match &rule.expectation {
        Expectation::TableCondition { sql_expression } => {
            evaluate_table_condition(sample, index, rule, sql_expression).await
        }
        Expectation::SqlAssertion { sql_statement } => {
            evaluate_sql_assertion(sample, index, rule, sql_statement).await
        }
        _ => evaluate_row_level(sample, index, rule).await,
    }
}

/// Row-level kinds: one aggregate query yielding total, non-null, and
/// passing row counts.
async fn evaluate_row_level(sample: &RowSample, index: usize, rule: &Rule) -> Result<RuleOutcome> {
    let table = SqlSafety::escape_identifier(sample.table_name())?;
    let sql = match &rule.expectation {
        Expectation::Uniqueness => uniqueness_query(&table, rule)?,
        _ => counts_query(&table, index, rule)?,
    };

    let batches = run_query(sample, index, &sql).await?;
    let batch = single_row(&batches, index)?;
    let total = count_value(batch, 0, index)?;
    let non_null = count_value(batch, 1, index)?;
    let pass = count_value(batch, 2, index)?;

    // nulls count as failures unless the rule opts out of them entirely
    let denominator = if rule.ignore_null { non_null } else { total };
    let ratio = if denominator == 0 {
        1.0
    } else {
        pass as f64 / denominator as f64
    };

    Ok(RuleOutcome::from_ratio(
        index,
        rule,
        ratio,
        denominator as u64,
    ))
}

/// Builds the shared `total / non_null / pass` aggregate for every row-level
/// kind except uniqueness.
fn counts_query(table: &str, index: usize, rule: &Rule) -> Result<String> {
    let column = rule
        .column
        .as_deref()
        .map(SqlSafety::escape_identifier)
        .transpose()?;

    let non_null_expr = match &column {
        Some(col) => format!("COUNT({col})"),
        None => "COUNT(*)".to_string(),
    };

    let pass_expr = match &rule.expectation {
        Expectation::NonNull => {
            let col = required_column(&column, index)?;
            format!("COUNT({col})")
        }
        Expectation::Range(bounds) => {
            let col = required_column(&column, index)?;
            let predicate = range_predicate(col, bounds);
            format!("COUNT(CASE WHEN {predicate} THEN 1 END)")
        }
        Expectation::Regex { pattern } => {
            let col = required_column(&column, index)?;
            validate_pattern(index, pattern)?;
            let literal = SqlSafety::escape_string_literal(pattern);
            format!("COUNT(CASE WHEN {col} ~ {literal} THEN 1 END)")
        }
        Expectation::Set { values } => {
            let col = required_column(&column, index)?;
            let literals = values
                .iter()
                .map(|v| SqlSafety::escape_string_literal(v))
                .collect::<Vec<_>>()
                .join(", ");
            format!("COUNT(CASE WHEN {col} IN ({literals}) THEN 1 END)")
        }
        Expectation::RowCondition { sql_expression } => {
            // when ignoreNull scopes the denominator to a column, rows with a
            // null column value must leave the numerator too
            match (&column, rule.ignore_null) {
                (Some(col), true) => format!(
                    "COUNT(CASE WHEN {col} IS NOT NULL AND ({sql_expression}) THEN 1 END)"
                ),
                _ => format!("COUNT(CASE WHEN ({sql_expression}) THEN 1 END)"),
            }
        }
        Expectation::Uniqueness
        | Expectation::TableCondition { .. }
        | Expectation::SqlAssertion { .. } => {
            return Err(DqError::Internal(format!(
                "rule {index}: {} is not a counts-query kind",
                rule.expectation.wire_name()
            )));
        }
    };

    Ok(format!(
        "SELECT COUNT(*) AS total, {non_null_expr} AS non_null, {pass_expr} AS pass FROM {table}"
    ))
}

/// A row passes uniqueness iff its value occurs exactly once in the sample.
///
/// One duplicated pair among N rows therefore yields a pass ratio of
/// (N-2)/N: both occurrences fail, every other row passes.
fn uniqueness_query(table: &str, rule: &Rule) -> Result<String> {
    let col = rule
        .column
        .as_deref()
        .map(SqlSafety::escape_identifier)
        .transpose()?
        .ok_or_else(|| DqError::Internal("uniqueness rule without column".to_string()))?;

    Ok(format!(
        "WITH value_counts AS (
            SELECT {col} AS value, COUNT(*) AS cnt
            FROM {table}
            GROUP BY {col}
        )
        SELECT
            COALESCE(SUM(cnt), 0) AS total,
            COALESCE(SUM(CASE WHEN value IS NOT NULL THEN cnt ELSE 0 END), 0) AS non_null,
            COALESCE(SUM(CASE WHEN value IS NOT NULL AND cnt = 1 THEN 1 ELSE 0 END), 0) AS pass
        FROM value_counts"
    ))
}

fn range_predicate(col: &str, bounds: &RangeBounds) -> String {
    let min_op = if bounds.strict_min { ">" } else { ">=" };
    let max_op = if bounds.strict_max { "<" } else { "<=" };
    format!(
        "{col} {min_op} {min} AND {col} {max_op} {max}",
        min = bounds.min_value,
        max = bounds.max_value
    )
}

async fn evaluate_table_condition(
    sample: &RowSample,
    index: usize,
    rule: &Rule,
    expression: &str,
) -> Result<RuleOutcome> {
    let table = SqlSafety::escape_identifier(sample.table_name())?;
    let sql = format!("SELECT ({expression}) AS passed FROM {table}");
    let batches = run_query(sample, index, &sql).await?;

    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    if rows != 1 {
        return Err(DqError::expression(
            index,
            format!("table condition must aggregate to a single boolean, produced {rows} rows"),
        ));
    }
    let batch = batches.iter().find(|b| b.num_rows() > 0).ok_or_else(|| {
        DqError::expression(index, "table condition produced no rows".to_string())
    })?;
    let values = batch
        .column(0)
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| {
            DqError::expression(index, "table condition did not evaluate to a boolean")
        })?;

    // SQL NULL from the aggregate counts as a failed condition
    let passed = values.is_valid(0) && values.value(0);
    Ok(RuleOutcome::table_level(index, rule, passed))
}

/// Failing-rows convention: the assertion passes iff its query returns zero
/// rows.
async fn evaluate_sql_assertion(
    sample: &RowSample,
    index: usize,
    rule: &Rule,
    statement: &str,
) -> Result<RuleOutcome> {
    let batches = run_query(sample, index, statement).await?;
    let failing_rows: usize = batches.iter().map(|b| b.num_rows()).sum();

    debug!(
        rule.index = index,
        assertion.failing_rows = failing_rows,
        "SQL assertion evaluated"
    );
    Ok(RuleOutcome::table_level(index, rule, failing_rows == 0))
}

async fn run_query(sample: &RowSample, index: usize, sql: &str) -> Result<Vec<RecordBatch>> {
    let df = sample
        .ctx()
        .sql(sql)
        .await
        .map_err(|e| DqError::expression(index, e.to_string()))?;
    df.collect()
        .await
        .map_err(|e| DqError::expression(index, e.to_string()))
}

fn single_row<'a>(batches: &'a [RecordBatch], index: usize) -> Result<&'a RecordBatch> {
    batches
        .iter()
        .find(|b| b.num_rows() > 0)
        .ok_or_else(|| DqError::expression(index, "aggregate query produced no rows".to_string()))
}

fn count_value(batch: &RecordBatch, column: usize, index: usize) -> Result<i64> {
    let array = batch
        .column(column)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| {
            DqError::expression(index, format!("aggregate column {column} is not a count"))
        })?;
    Ok(array.value(0))
}

fn required_column<'a>(column: &'a Option<String>, index: usize) -> Result<&'a str> {
    column
        .as_deref()
        .ok_or_else(|| DqError::Internal(format!("rule {index}: missing required column")))
}

fn validate_pattern(index: usize, pattern: &str) -> Result<()> {
    {
        let cache = VALIDATED_PATTERNS
            .read()
            .map_err(|_| DqError::Internal("pattern cache poisoned".to_string()))?;
        if cache.contains(pattern) {
            return Ok(());
        }
    }
    Regex::new(pattern).map_err(|e| {
        DqError::expression(index, format!("invalid regex pattern '{pattern}': {e}"))
    })?;
    let mut cache = VALIDATED_PATTERNS
        .write()
        .map_err(|_| DqError::Internal("pattern cache poisoned".to_string()))?;
    cache.insert(pattern.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sampler;
    use crate::spec::Expectation;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use datafusion::datasource::MemTable;
    use datafusion::prelude::SessionContext;
    use std::sync::Arc;

    async fn ride_sample(
        bikes: Vec<Option<&str>>,
        durations: Vec<Option<i64>>,
    ) -> RowSample {
        let schema = Arc::new(Schema::new(vec![
            Field::new("bike", DataType::Utf8, true),
            Field::new("duration", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(bikes)) as _,
                Arc::new(Int64Array::from(durations)) as _,
            ],
        )
        .unwrap();
        let ctx = SessionContext::new();
        let provider = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
        ctx.register_table("rides", Arc::new(provider)).unwrap();

        Sampler::new(None, 100.0).sample(&ctx, "rides").await.unwrap()
    }

    fn rule(expectation: Expectation, column: Option<&str>) -> Rule {
        Rule {
            dimension: expectation.default_dimension(),
            column: column.map(String::from),
            threshold: 1.0,
            ignore_null: false,
            expectation,
        }
    }

    #[tokio::test]
    async fn test_non_null_passes_when_complete() {
        let sample = ride_sample(
            vec![Some("a"), Some("b"), Some("c")],
            vec![Some(1), Some(2), Some(3)],
        )
        .await;
        let outcome =
            evaluate_rule(&sample, 0, &rule(Expectation::NonNull, Some("bike"))).await;
        assert_eq!(outcome.status, RuleStatus::Passed);
        assert_eq!(outcome.pass_ratio, Some(1.0));
        assert_eq!(outcome.rows_evaluated, Some(3));
    }

    #[tokio::test]
    async fn test_single_null_fails_full_threshold() {
        let sample = ride_sample(
            vec![Some("a"), None, Some("c"), Some("d"), Some("e")],
            vec![Some(1); 5],
        )
        .await;
        let outcome =
            evaluate_rule(&sample, 0, &rule(Expectation::NonNull, Some("bike"))).await;
        assert_eq!(outcome.status, RuleStatus::Failed);
        assert_eq!(outcome.pass_ratio, Some(0.8));
    }

    #[tokio::test]
    async fn test_range_boundary_inclusive_min() {
        let sample = ride_sample(vec![Some("a")], vec![Some(0)]).await;
        let bounds = RangeBounds {
            min_value: 0.0,
            max_value: 100.0,
            strict_min: false,
            strict_max: false,
        };
        let outcome = evaluate_rule(
            &sample,
            0,
            &rule(Expectation::Range(bounds), Some("duration")),
        )
        .await;
        assert_eq!(outcome.status, RuleStatus::Passed);
    }

    #[tokio::test]
    async fn test_range_boundary_strict_min_fails() {
        let sample = ride_sample(vec![Some("a")], vec![Some(0)]).await;
        let bounds = RangeBounds {
            min_value: 0.0,
            max_value: 100.0,
            strict_min: true,
            strict_max: false,
        };
        let outcome = evaluate_rule(
            &sample,
            0,
            &rule(Expectation::Range(bounds), Some("duration")),
        )
        .await;
        assert_eq!(outcome.status, RuleStatus::Failed);
        assert_eq!(outcome.pass_ratio, Some(0.0));
    }

    #[tokio::test]
    async fn test_range_null_fails_unless_ignored() {
        let sample = ride_sample(
            vec![Some("a"); 4],
            vec![Some(10), Some(20), None, Some(30)],
        )
        .await;
        let bounds = RangeBounds {
            min_value: 0.0,
            max_value: 100.0,
            strict_min: false,
            strict_max: false,
        };

        let strict_nulls = rule(Expectation::Range(bounds.clone()), Some("duration"));
        let outcome = evaluate_rule(&sample, 0, &strict_nulls).await;
        assert_eq!(outcome.pass_ratio, Some(0.75));
        assert_eq!(outcome.status, RuleStatus::Failed);

        let mut lenient = rule(Expectation::Range(bounds), Some("duration"));
        lenient.ignore_null = true;
        let outcome = evaluate_rule(&sample, 0, &lenient).await;
        assert_eq!(outcome.pass_ratio, Some(1.0));
        assert_eq!(outcome.rows_evaluated, Some(3));
        assert_eq!(outcome.status, RuleStatus::Passed);
    }

    #[tokio::test]
    async fn test_uniqueness_one_duplicate_pair_among_five() {
        let sample = ride_sample(
            vec![Some("a"), Some("b"), Some("b"), Some("c"), Some("d")],
            vec![Some(1); 5],
        )
        .await;
        let outcome =
            evaluate_rule(&sample, 0, &rule(Expectation::Uniqueness, Some("bike"))).await;
        // both rows of the duplicated pair fail: (5 - 2) / 5
        assert_eq!(outcome.pass_ratio, Some(0.6));
        assert_eq!(outcome.status, RuleStatus::Failed);
    }

    #[tokio::test]
    async fn test_uniqueness_all_distinct_passes() {
        let sample = ride_sample(
            vec![Some("a"), Some("b"), Some("c")],
            vec![Some(1); 3],
        )
        .await;
        let outcome =
            evaluate_rule(&sample, 0, &rule(Expectation::Uniqueness, Some("bike"))).await;
        assert_eq!(outcome.pass_ratio, Some(1.0));
        assert_eq!(outcome.status, RuleStatus::Passed);
    }

    #[tokio::test]
    async fn test_set_membership() {
        let sample = ride_sample(
            vec![Some("1"), Some("2"), Some("9"), None],
            vec![Some(1); 4],
        )
        .await;
        let set = Expectation::Set {
            values: vec!["1".into(), "2".into(), "3".into()],
        };

        // null and '9' both fail: 2/4
        let outcome = evaluate_rule(&sample, 0, &rule(set.clone(), Some("bike"))).await;
        assert_eq!(outcome.pass_ratio, Some(0.5));

        // ignoreNull drops the null from the denominator: 2/3
        let mut lenient = rule(set, Some("bike"));
        lenient.ignore_null = true;
        let outcome = evaluate_rule(&sample, 0, &lenient).await;
        assert_eq!(outcome.pass_ratio, Some(2.0 / 3.0));
        assert_eq!(outcome.rows_evaluated, Some(3));
    }

    #[tokio::test]
    async fn test_regex_matches_per_non_null_value() {
        let sample = ride_sample(
            vec![Some("AB12"), Some("XY34"), Some("bad"), None],
            vec![Some(1); 4],
        )
        .await;
        let regex = Expectation::Regex {
            pattern: "^[A-Z]{2}[0-9]+$".into(),
        };

        let mut lenient = rule(regex, Some("bike"));
        lenient.ignore_null = true;
        lenient.threshold = 0.5;
        let outcome = evaluate_rule(&sample, 0, &lenient).await;
        assert_eq!(outcome.pass_ratio, Some(2.0 / 3.0));
        assert_eq!(outcome.status, RuleStatus::Passed);

        // re-evaluating the same pattern goes through the validated set
        let again = evaluate_rule(&sample, 0, &lenient).await;
        assert_eq!(again.pass_ratio, Some(2.0 / 3.0));
    }

    #[tokio::test]
    async fn test_row_condition_predicate() {
        let sample = ride_sample(
            vec![Some("a"); 4],
            vec![Some(10), Some(-5), Some(20), Some(30)],
        )
        .await;
        let condition = Expectation::RowCondition {
            sql_expression: "duration >= 0".into(),
        };
        let outcome = evaluate_rule(&sample, 0, &rule(condition, None)).await;
        assert_eq!(outcome.pass_ratio, Some(0.75));
        assert_eq!(outcome.status, RuleStatus::Failed);
    }

    #[tokio::test]
    async fn test_row_condition_ignore_null_scopes_numerator_and_denominator() {
        let sample = ride_sample(
            vec![Some("a"), None, None, Some("b")],
            vec![Some(10), Some(20), Some(30), Some(-7)],
        )
        .await;
        let condition = Expectation::RowCondition {
            sql_expression: "duration >= 0".into(),
        };

        // only the two non-null bike rows are evaluated; one of them fails
        let mut scoped = rule(condition.clone(), Some("bike"));
        scoped.ignore_null = true;
        let outcome = evaluate_rule(&sample, 0, &scoped).await;
        assert_eq!(outcome.rows_evaluated, Some(2));
        assert_eq!(outcome.pass_ratio, Some(0.5));
        assert_eq!(outcome.status, RuleStatus::Failed);

        // the ratio is a fraction of evaluated rows even when the predicate
        // holds on rows the denominator excludes
        let sample = ride_sample(
            vec![Some("a"), None, None, None],
            vec![Some(10), Some(20), Some(30), Some(40)],
        )
        .await;
        let mut scoped = rule(condition, Some("bike"));
        scoped.ignore_null = true;
        let outcome = evaluate_rule(&sample, 0, &scoped).await;
        assert_eq!(outcome.rows_evaluated, Some(1));
        assert_eq!(outcome.pass_ratio, Some(1.0));
        assert_eq!(outcome.status, RuleStatus::Passed);
    }

    #[tokio::test]
    async fn test_table_condition_boolean() {
        let sample = ride_sample(vec![Some("a"); 3], vec![Some(1), Some(2), Some(3)]).await;

        let holds = Expectation::TableCondition {
            sql_expression: "COUNT(*) = 3".into(),
        };
        let outcome = evaluate_rule(&sample, 0, &rule(holds, None)).await;
        assert_eq!(outcome.status, RuleStatus::Passed);
        assert!(outcome.pass_ratio.is_none());

        let fails = Expectation::TableCondition {
            sql_expression: "MAX(duration) < 3".into(),
        };
        let outcome = evaluate_rule(&sample, 0, &rule(fails, None)).await;
        assert_eq!(outcome.status, RuleStatus::Failed);
    }

    #[tokio::test]
    async fn test_sql_assertion_failing_rows_convention() {
        let sample = ride_sample(
            vec![Some("a"); 3],
            vec![Some(10), Some(20), Some(30)],
        )
        .await;

        let clean = Expectation::SqlAssertion {
            sql_statement: "SELECT duration FROM rides WHERE duration < 0".into(),
        };
        let outcome = evaluate_rule(&sample, 0, &rule(clean, None)).await;
        assert_eq!(outcome.status, RuleStatus::Passed);

        let dirty = Expectation::SqlAssertion {
            sql_statement: "SELECT duration FROM rides WHERE duration >= 20".into(),
        };
        let outcome = evaluate_rule(&sample, 0, &rule(dirty, None)).await;
        assert_eq!(outcome.status, RuleStatus::Failed);
    }

    #[tokio::test]
    async fn test_broken_expression_is_errored_not_fatal() {
        let sample = ride_sample(vec![Some("a")], vec![Some(1)]).await;
        let broken = Expectation::RowCondition {
            sql_expression: "no_such_column > 0".into(),
        };
        let outcome = evaluate_rule(&sample, 4, &rule(broken, None)).await;
        assert_eq!(outcome.status, RuleStatus::Errored);
        assert!(!outcome.passed);
        assert!(outcome.error_detail.is_some());
        assert_eq!(outcome.index, 4);
    }

    #[tokio::test]
    async fn test_empty_sample_passes_vacuously() {
        let sample = ride_sample(vec![], vec![]).await;
        let outcome =
            evaluate_rule(&sample, 0, &rule(Expectation::NonNull, Some("bike"))).await;
        assert_eq!(outcome.status, RuleStatus::Passed);
        assert_eq!(outcome.pass_ratio, Some(1.0));
        assert_eq!(outcome.rows_evaluated, Some(0));
    }

    #[tokio::test]
    async fn test_outcome_serialization_uses_wire_names() {
        let sample = ride_sample(vec![Some("a")], vec![Some(1)]).await;
        let outcome =
            evaluate_rule(&sample, 0, &rule(Expectation::NonNull, Some("bike"))).await;
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"passRatio\""));
        assert!(json.contains("\"rowsEvaluated\""));
        assert!(json.contains("\"dimension\":\"COMPLETENESS\""));
        assert!(json.contains("\"status\":\"passed\""));
    }
}
