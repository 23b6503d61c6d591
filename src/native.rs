//! The seam between connectors and the client library that actually talks to the server.
//!
//! A driver only has to open connections and run statements; capability handling,
//! diagnostics bookkeeping, and cursor construction all live in the connector.

use std::fmt;

use crate::config::ConnectOptions;
use crate::results::FieldDescriptor;
use crate::types::RowValues;

/// One diagnostic record reported by the client library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub sqlstate: String,
    pub code: i64,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(sqlstate: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            sqlstate: sqlstate.into(),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.sqlstate, self.code, self.message)
    }
}

/// Result of a native call: the value, or the diagnostics the library left pending.
pub type NativeOutcome<T> = Result<T, Vec<Diagnostic>>;

/// A fully fetched result handle.
///
/// `fields` is `None` for statements that produce no result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeResultSet {
    pub fields: Option<Vec<FieldDescriptor>>,
    pub rows: Vec<Vec<RowValues>>,
    pub rows_affected: u64,
}

impl NativeResultSet {
    #[must_use]
    pub fn with_rows(fields: Vec<FieldDescriptor>, rows: Vec<Vec<RowValues>>) -> Self {
        let rows_affected = rows.len() as u64;
        Self {
            fields: Some(fields),
            rows,
            rows_affected,
        }
    }

    #[must_use]
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            fields: None,
            rows: Vec::new(),
            rows_affected,
        }
    }

    #[must_use]
    pub fn has_result_set(&self) -> bool {
        self.fields.is_some()
    }
}

/// Opens native connections.
pub trait NativeDriver {
    type Connection: NativeConnection;

    /// Connect with a backend-specific option set.
    ///
    /// # Errors
    ///
    /// Returns the library's diagnostics when no handle could be obtained.
    fn connect(&self, options: &ConnectOptions) -> NativeOutcome<Self::Connection>;
}

/// An open native connection.
///
/// Every fallible call reports its diagnostics on failure; the connector owns them from
/// then on.
pub trait NativeConnection {
    /// Run one statement, binding `params` to its `?` placeholders in order.
    ///
    /// # Errors
    ///
    /// Returns the library's diagnostics when the statement fails.
    fn query(&mut self, sql: &str, params: &[RowValues]) -> NativeOutcome<NativeResultSet>;

    /// Switch the connection's current database.
    ///
    /// # Errors
    ///
    /// Returns the library's diagnostics when the database cannot be selected.
    fn select_db(&mut self, name: &str) -> NativeOutcome<()>;

    /// # Errors
    ///
    /// Returns the library's diagnostics when the transaction cannot be started.
    fn begin(&mut self) -> NativeOutcome<()>;

    /// # Errors
    ///
    /// Returns the library's diagnostics when the commit fails.
    fn commit(&mut self) -> NativeOutcome<()>;

    /// # Errors
    ///
    /// Returns the library's diagnostics when the rollback fails.
    fn rollback(&mut self) -> NativeOutcome<()>;

    /// Rows affected by the most recent statement, tracked at connection level.
    fn rows_affected(&self) -> u64;

    /// Release the native handle. Must be safe to call more than once.
    fn close(&mut self);
}
