//! Connectors own one native connection and normalize connect, execute, transaction, and
//! diagnostic behaviour across backend variants.

mod preview;
mod quoting;

use std::time::Instant;

pub use preview::{NoPreview, PreviewWrites, WritePreview, is_write_statement};
pub use quoting::{escape_string, quote_identifier, quote_string};

use crate::backend::{Backend, Capabilities};
use crate::config::{ConnectOptions, ConnectionParameters};
use crate::error::MssqlMiddlewareError;
use crate::native::{Diagnostic, NativeConnection, NativeDriver, NativeOutcome};
use crate::results::ResultCursor;
use crate::translation::RenderedStatement;
use crate::types::{FailureSeverity, RowValues};

/// Exclusive owner of one physical connection.
///
/// Not meant to be shared between threads without external locking. Dropping the
/// connector closes the native connection.
///
/// ```rust,no_run
/// # #[cfg(feature = "tiberius")]
/// # fn demo() -> Result<(), mssql_middleware::MssqlMiddlewareError> {
/// use mssql_middleware::prelude::*;
///
/// let params = ConnectionParameters::builder("localhost,1433")
///     .credentials("sa", "secret")
///     .database("Orders")
///     .finish();
/// let mut conn = Connector::tiberius(Backend::SqlServer);
/// conn.connect(&params, true)?;
///
/// let query = SqlSelect::new().select("\"ID\"").from("\"Orders\"").limit(10, 20);
/// let statement = render(&query)?;
/// if let Some(cursor) = conn.execute_rendered(&statement, FailureSeverity::Fatal)? {
///     for row in cursor {
///         println!("{:?}", row.get("ID"));
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Connector<D: NativeDriver> {
    driver: D,
    backend: Backend,
    connection: Option<D::Connection>,
    selected_database: Option<String>,
    /// Only maintained for backends reporting affected rows per statement.
    last_affected_rows: u64,
    diagnostics: Vec<Diagnostic>,
    preview: Box<dyn WritePreview>,
}

impl<D: NativeDriver> Connector<D> {
    #[must_use]
    pub fn new(backend: Backend, driver: D) -> Self {
        Self {
            driver,
            backend,
            connection: None,
            selected_database: None,
            last_affected_rows: 0,
            diagnostics: Vec::new(),
            preview: Box::new(NoPreview),
        }
    }

    /// Replace the write-preview collaborator consulted before each statement.
    #[must_use]
    pub fn with_write_preview(mut self, preview: impl WritePreview + 'static) -> Self {
        self.preview = Box::new(preview);
        self
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Open the connection, closing any previous one first.
    ///
    /// With `select_database_at_connect`, backends able to bind a database at connect time
    /// do so and record it as selected; other backends ignore the flag.
    ///
    /// # Errors
    ///
    /// Returns `MssqlMiddlewareError::ConnectionError` carrying the driver's diagnostics
    /// when no connection could be established.
    pub fn connect(
        &mut self,
        params: &ConnectionParameters,
        select_database_at_connect: bool,
    ) -> Result<(), MssqlMiddlewareError> {
        self.close();
        let options = ConnectOptions::for_backend(self.backend, params, select_database_at_connect);
        tracing::debug!(
            backend = self.backend.name(),
            server = %options.server,
            database = ?options.database,
            integrated = options.integrated_security,
            "connecting"
        );

        self.diagnostics.clear();
        match self.driver.connect(&options) {
            Ok(connection) => {
                self.connection = Some(connection);
                self.selected_database = options.database;
                Ok(())
            }
            Err(diagnostics) => {
                self.diagnostics = diagnostics;
                Err(MssqlMiddlewareError::ConnectionError(
                    self.database_error("Couldn't connect to SQL Server database"),
                ))
            }
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// True only with a live connection and a selected database.
    #[must_use]
    pub fn is_connection_active(&self) -> bool {
        self.connection.is_some() && self.selected_database.is_some()
    }

    /// Run one statement.
    ///
    /// Returns `Ok(None)` when the write-preview collaborator intercepts the statement, or
    /// when it fails under [`FailureSeverity::NonFatal`].
    ///
    /// # Errors
    ///
    /// Returns `MssqlMiddlewareError::QueryExecutionError` when the statement fails under
    /// [`FailureSeverity::Fatal`], and `ConnectionError` when not connected.
    pub fn execute(
        &mut self,
        sql: &str,
        severity: FailureSeverity,
    ) -> Result<Option<ResultCursor>, MssqlMiddlewareError> {
        self.run(sql, &[], severity)
    }

    /// Run translator output with its positional parameters.
    ///
    /// # Errors
    ///
    /// Same as [`Connector::execute`].
    pub fn execute_rendered(
        &mut self,
        statement: &RenderedStatement,
        severity: FailureSeverity,
    ) -> Result<Option<ResultCursor>, MssqlMiddlewareError> {
        self.run(statement.sql(), statement.parameters(), severity)
    }

    fn run(
        &mut self,
        sql: &str,
        params: &[RowValues],
        severity: FailureSeverity,
    ) -> Result<Option<ResultCursor>, MssqlMiddlewareError> {
        if self.preview.preview_only(sql) {
            return Ok(None);
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(not_connected());
        };

        self.diagnostics.clear();
        let started = Instant::now();
        let outcome = connection.query(sql, params);
        tracing::debug!(
            backend = self.backend.name(),
            elapsed = ?started.elapsed(),
            params = params.len(),
            sql = %sql,
            "executed statement"
        );

        match outcome {
            Ok(result) => {
                if self.capabilities().caches_statement_affected_rows {
                    self.last_affected_rows = result.rows_affected;
                }
                Ok(Some(ResultCursor::new(self.backend, result)))
            }
            Err(diagnostics) => {
                self.diagnostics = diagnostics;
                if severity.is_fatal() {
                    Err(MssqlMiddlewareError::QueryExecutionError(
                        self.database_error(&format!("Couldn't run query: {sql}")),
                    ))
                } else {
                    tracing::warn!(
                        sql = %sql,
                        error = %self.last_error_text(),
                        "non-fatal query failure"
                    );
                    Ok(None)
                }
            }
        }
    }

    /// Rows affected by the last statement.
    #[must_use]
    pub fn affected_rows(&self) -> u64 {
        if self.capabilities().caches_statement_affected_rows {
            self.last_affected_rows
        } else {
            self.connection
                .as_ref()
                .map_or(0, |connection| connection.rows_affected())
        }
    }

    /// # Errors
    ///
    /// `UnsupportedOperation` on backends without explicit transactions,
    /// `TransactionError` when the driver reports failure.
    pub fn begin_transaction(&mut self) -> Result<(), MssqlMiddlewareError> {
        self.transaction_call("begin", |conn| conn.begin())
    }

    /// # Errors
    ///
    /// `UnsupportedOperation` on backends without explicit transactions,
    /// `TransactionError` when the driver reports failure.
    pub fn commit_transaction(&mut self) -> Result<(), MssqlMiddlewareError> {
        self.transaction_call("commit", |conn| conn.commit())
    }

    /// # Errors
    ///
    /// `UnsupportedOperation` on backends without explicit transactions,
    /// `TransactionError` when the driver reports failure.
    pub fn rollback_transaction(&mut self) -> Result<(), MssqlMiddlewareError> {
        self.transaction_call("rollback", |conn| conn.rollback())
    }

    /// Run `body` inside a transaction: commit when it returns `Ok`, roll back otherwise.
    ///
    /// # Errors
    ///
    /// Propagates the body's error, or any begin/commit failure. A failed commit is
    /// followed by a rollback attempt.
    pub fn with_transaction<T, F>(&mut self, body: F) -> Result<T, MssqlMiddlewareError>
    where
        F: FnOnce(&mut Self) -> Result<T, MssqlMiddlewareError>,
    {
        self.begin_transaction()?;
        let outcome = body(self).and_then(|value| {
            self.commit_transaction()?;
            Ok(value)
        });
        if outcome.is_err() {
            if let Err(rollback_err) = self.rollback_transaction() {
                tracing::warn!(error = %rollback_err, "rollback after failed transaction failed");
            }
        }
        outcome
    }

    fn transaction_call(
        &mut self,
        action: &str,
        call: impl FnOnce(&mut D::Connection) -> NativeOutcome<()>,
    ) -> Result<(), MssqlMiddlewareError> {
        if !self.capabilities().supports_explicit_transactions {
            return Err(MssqlMiddlewareError::UnsupportedOperation(format!(
                "transactions ({action}) are not available on the {} backend",
                self.backend.name()
            )));
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(not_connected());
        };

        self.diagnostics.clear();
        match call(connection) {
            Ok(()) => {
                tracing::debug!(backend = self.backend.name(), action, "transaction");
                Ok(())
            }
            Err(diagnostics) => {
                self.diagnostics = diagnostics;
                Err(MssqlMiddlewareError::TransactionError(
                    self.database_error(&format!("Couldn't {action} the transaction.")),
                ))
            }
        }
    }

    /// Make `name` the current database.
    ///
    /// Backends with a native primitive report success through the returned flag. The
    /// others issue `USE` and record the name once the statement has not failed.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` on the cloud-hosted backend, `QueryExecutionError` when the
    /// `USE` statement fails, `ConnectionError` when not connected.
    pub fn select_database(&mut self, name: &str) -> Result<bool, MssqlMiddlewareError> {
        let caps = self.capabilities();
        if !caps.supports_database_selection {
            return Err(MssqlMiddlewareError::UnsupportedOperation(format!(
                "database selection is not available on the {} backend",
                self.backend.name()
            )));
        }

        if caps.supports_native_select_database {
            let Some(connection) = self.connection.as_mut() else {
                return Err(not_connected());
            };
            self.diagnostics.clear();
            return match connection.select_db(name) {
                Ok(()) => {
                    self.selected_database = Some(name.to_string());
                    Ok(true)
                }
                Err(diagnostics) => {
                    self.diagnostics = diagnostics;
                    tracing::warn!(database = name, error = %self.last_error_text(), "select database failed");
                    Ok(false)
                }
            };
        }

        self.execute(&format!("USE {}", quote_identifier(name)), FailureSeverity::Fatal)?;
        self.selected_database = Some(name.to_string());
        Ok(true)
    }

    #[must_use]
    pub fn selected_database(&self) -> Option<&str> {
        self.selected_database.as_deref()
    }

    /// Forget the selected database without touching the connection.
    pub fn unload_database(&mut self) {
        self.selected_database = None;
    }

    /// Pending diagnostics as `"state, code, message"` records joined with `"; "`.
    #[must_use]
    pub fn last_error_text(&self) -> String {
        self.diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn escape_string(&self, value: &str) -> String {
        escape_string(value)
    }

    #[must_use]
    pub fn quote_string(&self, value: &str) -> String {
        quote_string(value, self.capabilities().supports_unicode_literal_prefix)
    }

    /// Server product version, e.g. `"15.0.2000.5"`.
    ///
    /// # Errors
    ///
    /// Returns `QueryExecutionError` if the version query fails or yields nothing.
    pub fn version(&mut self) -> Result<String, MssqlMiddlewareError> {
        let value = self
            .execute(
                "SELECT CONVERT(char(15), SERVERPROPERTY('ProductVersion'))",
                FailureSeverity::Fatal,
            )?
            .and_then(|mut cursor| cursor.value());
        match value.as_ref().and_then(RowValues::as_text) {
            Some(version) => Ok(version.trim().to_string()),
            None => Err(MssqlMiddlewareError::QueryExecutionError(format!(
                "server did not report a product version (got {value:?})"
            ))),
        }
    }

    /// Last identity value generated for `table`, `None` if the table has none yet.
    ///
    /// # Errors
    ///
    /// Returns `QueryExecutionError` if the lookup fails.
    pub fn generated_id(&mut self, table: &str) -> Result<Option<i64>, MssqlMiddlewareError> {
        let sql = format!("SELECT IDENT_CURRENT('{}')", escape_string(table));
        let value = self
            .execute(&sql, FailureSeverity::Fatal)?
            .and_then(|mut cursor| cursor.value());
        #[allow(clippy::cast_possible_truncation)]
        Ok(value.and_then(|value| {
            value
                .as_int()
                .or_else(|| value.as_float().map(|id| id as i64))
                .or_else(|| value.as_text().and_then(|id| id.trim().parse().ok()))
        }))
    }

    /// Close the native connection and forget the selected database.
    pub fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            tracing::debug!(backend = self.backend.name(), "connection closed");
        }
        self.selected_database = None;
    }

    fn database_error(&self, message: &str) -> String {
        let last = self.last_error_text();
        if last.is_empty() {
            message.to_string()
        } else {
            format!("{message}\nLast error: {last}")
        }
    }
}

impl<D: NativeDriver> Drop for Connector<D> {
    fn drop(&mut self) {
        self.close();
    }
}

fn not_connected() -> MssqlMiddlewareError {
    MssqlMiddlewareError::ConnectionError("no active connection".to_string())
}
