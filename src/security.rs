//! SQL hygiene for user-supplied rule documents.
//!
//! Rule documents carry column names, SQL expressions, and regex patterns
//! written by hand (or generated from spreadsheets). Everything here runs at
//! load time or query-build time so that only read-only, well-formed SQL
//! reaches the DataFusion session.

use crate::error::{DqError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Validation and escaping for identifiers and expressions embedded in
/// generated SQL.
pub struct SqlSafety;

impl SqlSafety {
    /// Validates a column or table identifier without escaping it.
    ///
    /// Accepts optionally dot-qualified names (`dataset.table`). Anything
    /// else (quoting, statement separators, SQL keywords smuggled into the
    /// name) is rejected as a configuration error.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(DqError::config("identifier cannot be empty"));
        }
        if identifier.len() > 128 {
            return Err(DqError::config(format!(
                "identifier '{identifier}' too long (max 128 characters)"
            )));
        }
        if identifier.contains('\0') {
            return Err(DqError::config("identifier cannot contain null bytes"));
        }

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(DqError::config(format!(
                "invalid identifier '{identifier}': identifiers must start with a letter or \
                 underscore and contain only letters, numbers, underscores, and dots"
            )));
        }
        Ok(())
    }

    /// Validates and escapes an identifier for direct use in generated SQL.
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Escapes a string value as a single-quoted SQL literal.
    pub fn escape_string_literal(value: &str) -> String {
        let escaped = value.replace('\'', "''");
        format!("'{escaped}'")
    }

    /// Validates a user-supplied SQL expression or statement as read-only.
    ///
    /// Expressions appear in row filters, row/table conditions, and SQL
    /// assertions. Keywords that could modify data or schema are rejected.
    pub fn validate_sql_expression(expression: &str) -> Result<()> {
        if expression.trim().is_empty() {
            return Err(DqError::config("SQL expression cannot be empty"));
        }
        if expression.len() > 5000 {
            return Err(DqError::config(
                "SQL expression too long (max 5000 characters)",
            ));
        }
        if expression.contains('\0') {
            return Err(DqError::config("SQL expression cannot contain null bytes"));
        }

        static DANGEROUS_KEYWORD: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(
                r"(?i)\b(DROP|DELETE|INSERT|UPDATE|CREATE|ALTER|TRUNCATE|GRANT|REVOKE|EXECUTE|EXEC|CALL|MERGE|REPLACE|ATTACH|DETACH|COPY|SET)\b",
            )
            .expect("Hard-coded regex pattern should be valid")
        });

        if let Some(m) = DANGEROUS_KEYWORD.find(expression) {
            return Err(DqError::config(format!(
                "SQL expression contains forbidden keyword '{}'",
                m.as_str()
            )));
        }
        if expression.contains("--") || expression.contains("/*") {
            return Err(DqError::config(
                "SQL expression cannot contain comment markers",
            ));
        }
        Ok(())
    }

    /// Rejects unresolved template placeholders left over from document
    /// generation.
    ///
    /// Spreadsheet-to-YAML pipelines occasionally leak placeholders such as
    /// `${table}` or the malformed `$(data()}` into expressions. Evaluating
    /// these would silently check the wrong thing, so they are treated as
    /// configuration errors rather than passed through.
    pub fn check_unresolved_template(value: &str) -> Result<()> {
        static TEMPLATE_MARKER: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"\$[({]").expect("Hard-coded regex pattern should be valid")
        });

        if TEMPLATE_MARKER.is_match(value) {
            return Err(DqError::config(format!(
                "unresolved template placeholder in '{value}'"
            )));
        }
        Ok(())
    }
}
