use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::results::CANONICAL_DATETIME_FORMAT;

/// Values that can be stored in a database row or used as query parameters.
///
/// Cursor rows hold these after field decoding, and rendered statements carry them as
/// positional parameters:
/// ```rust
/// use mssql_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("Orders".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RowValues::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value as a float; integer cells widen.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RowValues::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Timestamp from a typed value or from the canonical text cursors produce for
    /// `datetime` columns.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            RowValues::Timestamp(value) => Some(*value),
            RowValues::Text(text) => {
                NaiveDateTime::parse_from_str(text.trim(), CANONICAL_DATETIME_FORMAT).ok()
            }
            _ => None,
        }
    }
}

/// How a failed statement is reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureSeverity {
    /// Raise `QueryExecutionError` with the pending diagnostics.
    #[default]
    Fatal,
    /// Swallow the failure; `execute` returns `Ok(None)`.
    NonFatal,
}

impl FailureSeverity {
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, FailureSeverity::Fatal)
    }
}
