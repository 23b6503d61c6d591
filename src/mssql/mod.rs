//! SQL Server driver built on tiberius.
//!
//! Tiberius is async; each connection owns a current-thread runtime and blocks on it so
//! the connector can stay synchronous.

mod client;
mod query;
mod transaction;

use tokio::runtime::{Builder, Runtime};

use crate::backend::Backend;
use crate::config::ConnectOptions;
use crate::connector::Connector;
use crate::native::{Diagnostic, NativeConnection, NativeDriver, NativeOutcome, NativeResultSet};
use crate::types::RowValues;

pub use client::MssqlClient;

use transaction::TxControl;

/// Connector over the tiberius driver.
pub type MssqlConnector = Connector<TiberiusDriver>;

impl Connector<TiberiusDriver> {
    /// Connector for `backend` using the tiberius driver.
    #[must_use]
    pub fn tiberius(backend: Backend) -> Self {
        Connector::new(backend, TiberiusDriver)
    }
}

/// Opens tiberius connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiberiusDriver;

impl NativeDriver for TiberiusDriver {
    type Connection = TiberiusConnection;

    fn connect(&self, options: &ConnectOptions) -> NativeOutcome<TiberiusConnection> {
        let runtime = Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(|e| vec![Diagnostic::new("HY000", 0, format!("runtime setup failed: {e}"))])?;

        let client = runtime
            .block_on(client::connect_client(options))
            .map_err(|e| diagnostics_from(&e))?;

        Ok(TiberiusConnection {
            runtime,
            client: Some(client),
            rows_affected: 0,
        })
    }
}

/// An open tiberius client with its runtime.
pub struct TiberiusConnection {
    runtime: Runtime,
    client: Option<MssqlClient>,
    rows_affected: u64,
}

impl TiberiusConnection {
    fn parts(&mut self) -> NativeOutcome<(&Runtime, &mut MssqlClient)> {
        match self.client.as_mut() {
            Some(client) => Ok((&self.runtime, client)),
            None => Err(vec![Diagnostic::new("08003", 0, "connection is closed")]),
        }
    }

    fn control(&mut self, control: TxControl) -> NativeOutcome<()> {
        let (runtime, client) = self.parts()?;
        runtime
            .block_on(transaction::run_control(client, control))
            .map_err(|e| diagnostics_from(&e))
    }
}

impl NativeConnection for TiberiusConnection {
    fn query(&mut self, sql: &str, params: &[RowValues]) -> NativeOutcome<NativeResultSet> {
        let (runtime, client) = self.parts()?;
        let result = runtime
            .block_on(query::run_statement(client, sql, params))
            .map_err(|e| diagnostics_from(&e))?;
        self.rows_affected = result.rows_affected;
        Ok(result)
    }

    fn select_db(&mut self, name: &str) -> NativeOutcome<()> {
        let statement = format!("USE [{}]", name.replace(']', "]]"));
        self.query(&statement, &[]).map(|_| ())
    }

    fn begin(&mut self) -> NativeOutcome<()> {
        self.control(TxControl::Begin)
    }

    fn commit(&mut self) -> NativeOutcome<()> {
        self.control(TxControl::Commit)
    }

    fn rollback(&mut self) -> NativeOutcome<()> {
        self.control(TxControl::Rollback)
    }

    fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    fn close(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(err) = self.runtime.block_on(client.close()) {
                tracing::debug!(error = %err, "error while closing SQL Server client");
            }
        }
    }
}

impl Drop for TiberiusConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map a tiberius error onto diagnostic records. Server errors keep their state and
/// number; anything else is reported as a general error.
pub(crate) fn diagnostics_from(err: &tiberius::error::Error) -> Vec<Diagnostic> {
    match err {
        tiberius::error::Error::Server(token) => vec![Diagnostic::new(
            token.state().to_string(),
            i64::from(token.code()),
            token.message(),
        )],
        other => vec![Diagnostic::new("HY000", 0, other.to_string())],
    }
}
