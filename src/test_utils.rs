//! Scripted driver for exercising connectors without a server.
//!
//! Clones of a [`ScriptedDriver`] share one script, so a test can keep a handle after
//! moving the driver into a connector and inspect what was sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ConnectOptions;
use crate::native::{Diagnostic, NativeConnection, NativeDriver, NativeOutcome, NativeResultSet};
use crate::types::RowValues;

#[derive(Debug, Default)]
struct ScriptState {
    responses: HashMap<String, NativeOutcome<NativeResultSet>>,
    connect_failure: Option<Vec<Diagnostic>>,
    transaction_failures: HashMap<&'static str, Vec<Diagnostic>>,
    select_db_failure: Option<Vec<Diagnostic>>,
    connects: Vec<ConnectOptions>,
    executed: Vec<(String, Vec<RowValues>)>,
    transactions: Vec<&'static str>,
    selected: Vec<String>,
    closed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer `sql` with `result`. Unscripted statements succeed with no result set.
    pub fn respond(&self, sql: impl Into<String>, result: NativeResultSet) -> &Self {
        self.state().responses.insert(sql.into(), Ok(result));
        self
    }

    /// Fail `sql` with one diagnostic record.
    pub fn fail(&self, sql: impl Into<String>, diagnostic: Diagnostic) -> &Self {
        self.state()
            .responses
            .insert(sql.into(), Err(vec![diagnostic]));
        self
    }

    pub fn fail_connect(&self, diagnostics: Vec<Diagnostic>) -> &Self {
        self.state().connect_failure = Some(diagnostics);
        self
    }

    /// Fail every `"begin"`, `"commit"` or `"rollback"` call with `diagnostics`.
    pub fn fail_transaction(&self, action: &'static str, diagnostics: Vec<Diagnostic>) -> &Self {
        self.state().transaction_failures.insert(action, diagnostics);
        self
    }

    pub fn fail_select_db(&self, diagnostics: Vec<Diagnostic>) -> &Self {
        self.state().select_db_failure = Some(diagnostics);
        self
    }

    /// Option sets passed to every connect attempt, in order.
    #[must_use]
    pub fn connect_options(&self) -> Vec<ConnectOptions> {
        self.state().connects.clone()
    }

    #[must_use]
    pub fn executed_sql(&self) -> Vec<String> {
        self.state()
            .executed
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    #[must_use]
    pub fn executed(&self) -> Vec<(String, Vec<RowValues>)> {
        self.state().executed.clone()
    }

    /// `"begin"`, `"commit"` and `"rollback"` calls that reached the connection.
    #[must_use]
    pub fn transaction_log(&self) -> Vec<&'static str> {
        self.state().transactions.clone()
    }

    /// Databases passed to the native select primitive.
    #[must_use]
    pub fn selected_databases(&self) -> Vec<String> {
        self.state().selected.clone()
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.state().closed
    }
}

impl NativeDriver for ScriptedDriver {
    type Connection = ScriptedConnection;

    fn connect(&self, options: &ConnectOptions) -> NativeOutcome<ScriptedConnection> {
        let mut state = self.state();
        state.connects.push(options.clone());
        if let Some(diagnostics) = state.connect_failure.clone() {
            return Err(diagnostics);
        }
        Ok(ScriptedConnection {
            state: Arc::clone(&self.state),
            rows_affected: 0,
            open: true,
        })
    }
}

#[derive(Debug)]
pub struct ScriptedConnection {
    state: Arc<Mutex<ScriptState>>,
    rows_affected: u64,
    open: bool,
}

impl ScriptedConnection {
    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transaction(&mut self, action: &'static str) -> NativeOutcome<()> {
        let mut state = self.state();
        state.transactions.push(action);
        match state.transaction_failures.get(action).cloned() {
            Some(diagnostics) => Err(diagnostics),
            None => Ok(()),
        }
    }
}

impl NativeConnection for ScriptedConnection {
    fn query(&mut self, sql: &str, params: &[RowValues]) -> NativeOutcome<NativeResultSet> {
        let outcome = {
            let mut state = self.state();
            state.executed.push((sql.to_string(), params.to_vec()));
            state
                .responses
                .get(sql)
                .cloned()
                .unwrap_or_else(|| Ok(NativeResultSet::affected(0)))
        };
        if let Ok(result) = &outcome {
            self.rows_affected = result.rows_affected;
        }
        outcome
    }

    fn select_db(&mut self, name: &str) -> NativeOutcome<()> {
        let mut state = self.state();
        state.selected.push(name.to_string());
        match state.select_db_failure.clone() {
            Some(diagnostics) => Err(diagnostics),
            None => Ok(()),
        }
    }

    fn begin(&mut self) -> NativeOutcome<()> {
        self.transaction("begin")
    }

    fn commit(&mut self) -> NativeOutcome<()> {
        self.transaction("commit")
    }

    fn rollback(&mut self) -> NativeOutcome<()> {
        self.transaction("rollback")
    }

    fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.state().closed += 1;
        }
    }
}
