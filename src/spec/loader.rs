//! Parsing and validation of rule documents.
//!
//! The wire layer mirrors the YAML document shape exactly: each rule object
//! carries its expectation kind as a key (`nonNullExpectation: {}`,
//! `rangeExpectation: {minValue: ...}`) alongside sibling `dimension`,
//! `column`, `threshold`, and `ignoreNull` fields. Everything is validated
//! here, before any evaluation begins; a `RuleSet` returned from this module
//! needs no further shape checks.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    ColumnUsage, Dimension, Expectation, PostScanActions, RangeBounds, Rule, RuleSet,
};
use crate::error::{DqError, Result};
use crate::security::SqlSafety;

/// A wire value that may arrive as either a quoted string or a bare number.
///
/// Spreadsheet-driven generators emit `samplingPercent: '10'` and
/// `minValue: '0'` as strings; hand-written documents tend to use bare
/// numbers. Both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Number(f64),
    Text(String),
}

impl WireNumber {
    fn parse(&self, field: &str) -> Result<f64> {
        match self {
            WireNumber::Number(n) => Ok(*n),
            WireNumber::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                DqError::config(format!("'{field}' must be a number, got '{s}'"))
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawRuleSet {
    #[serde(rename = "rowFilter", skip_serializing_if = "Option::is_none")]
    row_filter: Option<String>,
    #[serde(rename = "samplingPercent", skip_serializing_if = "Option::is_none")]
    sampling_percent: Option<WireNumber>,
    rules: Vec<RawRule>,
    #[serde(rename = "postScanActions", skip_serializing_if = "Option::is_none")]
    post_scan_actions: Option<PostScanActions>,
}

/// An empty expectation payload (`nonNullExpectation: {}`).
#[derive(Debug, Default, Serialize, Deserialize)]
struct EmptyPayload {}

#[derive(Debug, Serialize, Deserialize)]
struct RawRange {
    #[serde(rename = "minValue", skip_serializing_if = "Option::is_none")]
    min_value: Option<WireNumber>,
    #[serde(rename = "maxValue", skip_serializing_if = "Option::is_none")]
    max_value: Option<WireNumber>,
    #[serde(rename = "strictMinEnabled", skip_serializing_if = "Option::is_none")]
    strict_min_enabled: Option<bool>,
    #[serde(rename = "strictMaxEnabled", skip_serializing_if = "Option::is_none")]
    strict_max_enabled: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSqlExpression {
    #[serde(rename = "sqlExpression")]
    sql_expression: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawRegex {
    regex: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSet {
    values: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSqlAssertion {
    #[serde(rename = "sqlStatement")]
    sql_statement: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawRule {
    #[serde(rename = "nonNullExpectation", skip_serializing_if = "Option::is_none")]
    non_null: Option<EmptyPayload>,
    #[serde(rename = "rangeExpectation", skip_serializing_if = "Option::is_none")]
    range: Option<RawRange>,
    #[serde(
        rename = "uniquenessExpectation",
        skip_serializing_if = "Option::is_none"
    )]
    uniqueness: Option<EmptyPayload>,
    #[serde(
        rename = "rowConditionExpectation",
        skip_serializing_if = "Option::is_none"
    )]
    row_condition: Option<RawSqlExpression>,
    #[serde(rename = "regexExpectation", skip_serializing_if = "Option::is_none")]
    regex: Option<RawRegex>,
    #[serde(rename = "setExpectation", skip_serializing_if = "Option::is_none")]
    set: Option<RawSet>,
    #[serde(
        rename = "tableConditionExpectation",
        skip_serializing_if = "Option::is_none"
    )]
    table_condition: Option<RawSqlExpression>,
    #[serde(rename = "sqlAssertion", skip_serializing_if = "Option::is_none")]
    sql_assertion: Option<RawSqlAssertion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f64>,
    #[serde(rename = "ignoreNull", skip_serializing_if = "Option::is_none")]
    ignore_null: Option<bool>,
}

/// Parses and validates a YAML rule document.
pub fn parse_yaml(text: &str) -> Result<RuleSet> {
    let raw: RawRuleSet = serde_yaml::from_str(text)?;
    validate(raw)
}

/// Serializes a validated ruleset back to its YAML wire form.
pub fn to_yaml(ruleset: &RuleSet) -> Result<String> {
    let raw = to_raw(ruleset);
    serde_yaml::to_string(&raw).map_err(|e| DqError::Serialization(e.to_string()))
}

fn validate(raw: RawRuleSet) -> Result<RuleSet> {
    let sampling_percent = match &raw.sampling_percent {
        Some(value) => {
            let percent = value.parse("samplingPercent")?;
            if !(0.0..=100.0).contains(&percent) {
                return Err(DqError::config(format!(
                    "'samplingPercent' must be within 0-100, got {percent}"
                )));
            }
            percent
        }
        None => 100.0,
    };

    if let Some(filter) = &raw.row_filter {
        SqlSafety::check_unresolved_template(filter)?;
        SqlSafety::validate_sql_expression(filter)?;
    }

    if raw.rules.is_empty() {
        return Err(DqError::config("document must declare at least one rule"));
    }

    let rules = raw
        .rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| validate_rule(index, rule))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        rules.count = rules.len(),
        sampling.percent = sampling_percent,
        filter.present = raw.row_filter.is_some(),
        "Rule document validated"
    );

    Ok(RuleSet {
        row_filter: raw.row_filter,
        sampling_percent,
        rules,
        post_scan_actions: raw.post_scan_actions,
    })
}

fn validate_rule(index: usize, raw: RawRule) -> Result<Rule> {
    let expectation = extract_expectation(index, &raw)?;

    let threshold = raw.threshold.unwrap_or(1.0);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(DqError::config(format!(
            "rule {index}: 'threshold' must be within 0-1, got {threshold}"
        )));
    }

    let ignore_null = raw.ignore_null.unwrap_or(false);
    if ignore_null && matches!(expectation, Expectation::NonNull) {
        return Err(DqError::config(format!(
            "rule {index}: 'ignoreNull' must not be true on nonNullExpectation"
        )));
    }

    match (expectation.column_usage(), &raw.column) {
        (ColumnUsage::Required, None) => {
            return Err(DqError::config(format!(
                "rule {index}: '{}' requires a 'column'",
                expectation.wire_name()
            )));
        }
        (ColumnUsage::Forbidden, Some(_)) => {
            return Err(DqError::config(format!(
                "rule {index}: '{}' is table-level and must not set 'column'",
                expectation.wire_name()
            )));
        }
        _ => {}
    }
    if let Some(column) = &raw.column {
        SqlSafety::validate_identifier(column)
            .map_err(|e| DqError::config(format!("rule {index}: {e}")))?;
    }

    let dimension = raw
        .dimension
        .unwrap_or_else(|| expectation.default_dimension());

    Ok(Rule {
        dimension,
        column: raw.column,
        threshold,
        ignore_null,
        expectation,
    })
}

fn extract_expectation(index: usize, raw: &RawRule) -> Result<Expectation> {
    let mut found: Vec<Expectation> = Vec::new();

    if raw.non_null.is_some() {
        found.push(Expectation::NonNull);
    }
    if let Some(range) = &raw.range {
        found.push(Expectation::Range(validate_range(index, range)?));
    }
    if raw.uniqueness.is_some() {
        found.push(Expectation::Uniqueness);
    }
    if let Some(payload) = &raw.row_condition {
        validate_sql_field(index, "sqlExpression", &payload.sql_expression)?;
        found.push(Expectation::RowCondition {
            sql_expression: payload.sql_expression.clone(),
        });
    }
    if let Some(payload) = &raw.regex {
        SqlSafety::check_unresolved_template(&payload.regex)
            .map_err(|e| DqError::config(format!("rule {index}: {e}")))?;
        Regex::new(&payload.regex).map_err(|e| {
            DqError::config(format!("rule {index}: invalid regex pattern: {e}"))
        })?;
        found.push(Expectation::Regex {
            pattern: payload.regex.clone(),
        });
    }
    if let Some(payload) = &raw.set {
        if payload.values.is_empty() {
            return Err(DqError::config(format!(
                "rule {index}: 'setExpectation' requires at least one value"
            )));
        }
        found.push(Expectation::Set {
            values: payload.values.clone(),
        });
    }
    if let Some(payload) = &raw.table_condition {
        validate_sql_field(index, "sqlExpression", &payload.sql_expression)?;
        found.push(Expectation::TableCondition {
            sql_expression: payload.sql_expression.clone(),
        });
    }
    if let Some(payload) = &raw.sql_assertion {
        validate_sql_field(index, "sqlStatement", &payload.sql_statement)?;
        found.push(Expectation::SqlAssertion {
            sql_statement: payload.sql_statement.clone(),
        });
    }

    match found.len() {
        1 => Ok(found.into_iter().next().unwrap()),
        0 => Err(DqError::config(format!(
            "rule {index}: no expectation kind declared"
        ))),
        n => Err(DqError::config(format!(
            "rule {index}: exactly one expectation kind allowed, found {n}"
        ))),
    }
}

fn validate_range(index: usize, raw: &RawRange) -> Result<RangeBounds> {
    let (min, max) = match (&raw.min_value, &raw.max_value) {
        (Some(min), Some(max)) => (min.parse("minValue")?, max.parse("maxValue")?),
        _ => {
            return Err(DqError::config(format!(
                "rule {index}: 'rangeExpectation' requires both 'minValue' and 'maxValue'"
            )));
        }
    };
    if min > max {
        return Err(DqError::config(format!(
            "rule {index}: 'minValue' {min} exceeds 'maxValue' {max}"
        )));
    }
    Ok(RangeBounds {
        min_value: min,
        max_value: max,
        strict_min: raw.strict_min_enabled.unwrap_or(false),
        strict_max: raw.strict_max_enabled.unwrap_or(false),
    })
}

fn validate_sql_field(index: usize, field: &str, value: &str) -> Result<()> {
    SqlSafety::check_unresolved_template(value)
        .and_then(|_| SqlSafety::validate_sql_expression(value))
        .map_err(|e| DqError::config(format!("rule {index}: '{field}': {e}")))
}

fn to_raw(ruleset: &RuleSet) -> RawRuleSet {
    RawRuleSet {
        row_filter: ruleset.row_filter.clone(),
        sampling_percent: Some(WireNumber::Text(format!("{}", ruleset.sampling_percent))),
        rules: ruleset.rules.iter().map(rule_to_raw).collect(),
        post_scan_actions: ruleset.post_scan_actions.clone(),
    }
}

fn rule_to_raw(rule: &Rule) -> RawRule {
    let mut raw = RawRule {
        non_null: None,
        range: None,
        uniqueness: None,
        row_condition: None,
        regex: None,
        set: None,
        table_condition: None,
        sql_assertion: None,
        dimension: Some(rule.dimension),
        column: rule.column.clone(),
        // defaults stay implicit on the wire, matching generator output
        threshold: (rule.threshold != 1.0).then_some(rule.threshold),
        ignore_null: rule.ignore_null.then_some(true),
    };

    match &rule.expectation {
        Expectation::NonNull => raw.non_null = Some(EmptyPayload {}),
        Expectation::Range(bounds) => {
            raw.range = Some(RawRange {
                min_value: Some(WireNumber::Text(format!("{}", bounds.min_value))),
                max_value: Some(WireNumber::Text(format!("{}", bounds.max_value))),
                strict_min_enabled: bounds.strict_min.then_some(true),
                strict_max_enabled: bounds.strict_max.then_some(true),
            });
        }
        Expectation::Uniqueness => raw.uniqueness = Some(EmptyPayload {}),
        Expectation::RowCondition { sql_expression } => {
            raw.row_condition = Some(RawSqlExpression {
                sql_expression: sql_expression.clone(),
            });
        }
        Expectation::Regex { pattern } => {
            raw.regex = Some(RawRegex {
                regex: pattern.clone(),
            });
        }
        Expectation::Set { values } => {
            raw.set = Some(RawSet {
                values: values.clone(),
            });
        }
        Expectation::TableCondition { sql_expression } => {
            raw.table_condition = Some(RawSqlExpression {
                sql_expression: sql_expression.clone(),
            });
        }
        Expectation::SqlAssertion { sql_statement } => {
            raw.sql_assertion = Some(RawSqlAssertion {
                sql_statement: sql_statement.clone(),
            });
        }
    }

    raw
}
