#![cfg(feature = "test-utils")]

use mssql_middleware::prelude::*;
use mssql_middleware::test_utils::ScriptedDriver;

fn params() -> ConnectionParameters {
    ConnectionParameters::builder("db.internal,1433")
        .credentials("app", "s3cret")
        .database("Orders")
        .finish()
}

fn connected(backend: Backend, driver: &ScriptedDriver) -> Connector<ScriptedDriver> {
    let mut conn = Connector::new(backend, driver.clone());
    conn.connect(&params(), true).expect("scripted connect succeeds");
    conn
}

#[test]
fn connect_binds_database_where_supported() {
    let driver = ScriptedDriver::new();
    let conn = connected(Backend::SqlServer, &driver);
    assert!(conn.is_connection_active());
    assert_eq!(conn.selected_database(), Some("Orders"));

    let options = &driver.connect_options()[0];
    assert_eq!(options.database.as_deref(), Some("Orders"));
    assert_eq!(options.character_set.as_deref(), Some("UTF-8"));
    assert!(options.multiple_active_result_sets);

    let legacy_driver = ScriptedDriver::new();
    let legacy = connected(Backend::Mssql, &legacy_driver);
    assert!(legacy.is_connected());
    assert!(!legacy.is_connection_active());
    let options = &legacy_driver.connect_options()[0];
    assert_eq!(options.database, None);
    assert_eq!(options.character_set, None);
    assert!(!options.multiple_active_result_sets);
}

#[test]
fn windows_authentication_omits_credentials() {
    let driver = ScriptedDriver::new();
    let mut conn = Connector::new(Backend::SqlServer, driver.clone());
    let params = ConnectionParameters::builder("corp-sql\\REPORTING")
        .credentials("ignored", "ignored")
        .windows_authentication(true)
        .finish();
    conn.connect(&params, false).expect("scripted connect succeeds");

    let options = &driver.connect_options()[0];
    assert_eq!(options.uid, None);
    assert_eq!(options.pwd, None);
    assert!(options.integrated_security);
    assert_eq!(options.instance_name(), Some("REPORTING"));
    let ado = options.to_connection_string();
    assert!(!ado.contains("UID="));
    assert!(!ado.contains("PWD="));
    assert!(ado.contains("Integrated Security=true"));
}

#[test]
fn connect_failure_reports_diagnostics() {
    let driver = ScriptedDriver::new();
    driver.fail_connect(vec![Diagnostic::new("08001", 53, "server not found")]);
    let mut conn = Connector::new(Backend::SqlServer, driver.clone());

    let err = conn.connect(&params(), true).unwrap_err();
    assert!(matches!(err, MssqlMiddlewareError::ConnectionError(_)));
    let message = err.to_string();
    assert!(message.contains("Couldn't connect to SQL Server database"));
    assert!(message.contains("08001, 53, server not found"));
    assert!(!conn.is_connected());
}

#[test]
fn fatal_and_non_fatal_failures() {
    let driver = ScriptedDriver::new();
    driver.fail(
        "SELECT nope",
        Diagnostic::new("42S22", 207, "Invalid column name 'nope'."),
    );
    let mut conn = connected(Backend::SqlServer, &driver);

    let quiet = conn
        .execute("SELECT nope", FailureSeverity::NonFatal)
        .expect("non-fatal failure is not an error");
    assert!(quiet.is_none());
    assert_eq!(
        conn.last_error_text(),
        "42S22, 207, Invalid column name 'nope'."
    );

    let err = conn
        .execute("SELECT nope", FailureSeverity::Fatal)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Couldn't run query: SELECT nope"));
    assert!(message.contains("Last error: 42S22, 207"));
}

#[test]
fn multiple_diagnostics_are_joined() {
    let driver = ScriptedDriver::new();
    driver.fail_transaction(
        "commit",
        vec![
            Diagnostic::new("25000", 3902, "no corresponding BEGIN"),
            Diagnostic::new("01000", 0, "statement terminated"),
        ],
    );
    let mut conn = connected(Backend::SqlServer, &driver);

    let err = conn.commit_transaction().unwrap_err();
    assert!(matches!(err, MssqlMiddlewareError::TransactionError(_)));
    assert_eq!(
        conn.last_error_text(),
        "25000, 3902, no corresponding BEGIN; 01000, 0, statement terminated"
    );
}

#[test]
fn rendered_statements_pass_parameters() {
    let driver = ScriptedDriver::new();
    let mut conn = connected(Backend::SqlServer, &driver);

    let query = SqlSelect::new()
        .select("\"ID\"")
        .from("\"Orders\"")
        .filter("\"Customer\" = ?", vec![RowValues::Text("acme".into())]);
    let statement = render(&query).expect("renders");
    conn.execute_rendered(&statement, FailureSeverity::Fatal)
        .expect("scripted execute succeeds");

    let executed = driver.executed();
    assert_eq!(executed[0].0, statement.sql());
    assert_eq!(executed[0].1, vec![RowValues::Text("acme".into())]);
}

#[test]
fn transactions_follow_capabilities() {
    let driver = ScriptedDriver::new();
    let mut legacy = connected(Backend::Mssql, &driver);
    let err = legacy.begin_transaction().unwrap_err();
    assert!(matches!(err, MssqlMiddlewareError::UnsupportedOperation(_)));
    assert!(driver.transaction_log().is_empty());

    let driver = ScriptedDriver::new();
    let mut conn = connected(Backend::Azure, &driver);
    conn.begin_transaction().expect("begin");
    conn.commit_transaction().expect("commit");
    conn.begin_transaction().expect("begin");
    conn.rollback_transaction().expect("rollback");
    assert_eq!(
        driver.transaction_log(),
        vec!["begin", "commit", "begin", "rollback"]
    );
}

#[test]
fn with_transaction_rolls_back_on_error() {
    let driver = ScriptedDriver::new();
    let mut conn = connected(Backend::SqlServer, &driver);

    let committed = conn.with_transaction(|conn| {
        conn.execute("UPDATE \"Orders\" SET \"Shipped\" = 1", FailureSeverity::Fatal)?;
        Ok(42)
    });
    assert_eq!(committed.expect("body succeeds"), 42);

    let failed: Result<(), _> = conn.with_transaction(|_| {
        Err(MssqlMiddlewareError::QueryExecutionError("abort".into()))
    });
    assert!(failed.is_err());
    assert_eq!(
        driver.transaction_log(),
        vec!["begin", "commit", "begin", "rollback"]
    );
}

#[test]
fn with_transaction_rolls_back_when_commit_fails() {
    let driver = ScriptedDriver::new();
    driver.fail_transaction("commit", vec![Diagnostic::new("40001", 1205, "deadlock victim")]);
    let mut conn = connected(Backend::SqlServer, &driver);

    let err = conn
        .with_transaction(|conn| {
            conn.execute("UPDATE \"Orders\" SET \"Shipped\" = 1", FailureSeverity::Fatal)?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, MssqlMiddlewareError::TransactionError(_)));
    assert!(err.to_string().contains("1205"));
    assert_eq!(driver.transaction_log(), vec!["begin", "commit", "rollback"]);
}

#[test]
fn with_transaction_surfaces_commit_error_when_rollback_also_fails() {
    let driver = ScriptedDriver::new();
    driver
        .fail_transaction("commit", vec![Diagnostic::new("08S01", 0, "link lost")])
        .fail_transaction("rollback", vec![Diagnostic::new("08S01", 0, "link lost")]);
    let mut conn = connected(Backend::Azure, &driver);

    let err = conn.with_transaction(|_| Ok(())).unwrap_err();
    assert!(err.to_string().contains("Couldn't commit the transaction."));
    assert_eq!(driver.transaction_log(), vec!["begin", "commit", "rollback"]);
}

#[test]
fn select_database_issues_use_statement() {
    let driver = ScriptedDriver::new();
    let mut conn = Connector::new(Backend::SqlServer, driver.clone());
    conn.connect(&params(), false).expect("scripted connect succeeds");
    assert!(!conn.is_connection_active());

    assert!(conn.select_database("Orders").expect("USE succeeds"));
    assert_eq!(driver.executed_sql(), vec!["USE \"Orders\"".to_string()]);
    assert_eq!(conn.selected_database(), Some("Orders"));
    assert!(conn.is_connection_active());

    conn.unload_database();
    assert!(!conn.is_connection_active());
}

#[test]
fn select_database_uses_native_primitive() {
    let driver = ScriptedDriver::new();
    let mut conn = connected(Backend::Mssql, &driver);
    assert!(conn.select_database("Archive").expect("select succeeds"));
    assert_eq!(driver.selected_databases(), vec!["Archive".to_string()]);
    assert!(driver.executed_sql().is_empty());

    driver.fail_select_db(vec![Diagnostic::new("08004", 911, "database does not exist")]);
    assert!(!conn.select_database("Missing").expect("failure is reported as false"));
    assert_eq!(conn.selected_database(), Some("Archive"));
    assert!(conn.last_error_text().contains("911"));
}

#[test]
fn azure_rejects_database_selection() {
    let driver = ScriptedDriver::new();
    let mut conn = connected(Backend::Azure, &driver);
    let err = conn.select_database("Other").unwrap_err();
    assert!(matches!(err, MssqlMiddlewareError::UnsupportedOperation(_)));
    assert_eq!(conn.selected_database(), Some("Orders"));
}

#[test]
fn write_preview_skips_execution() {
    let driver = ScriptedDriver::new();
    let mut conn = Connector::new(Backend::SqlServer, driver.clone()).with_write_preview(PreviewWrites);
    conn.connect(&params(), true).expect("scripted connect succeeds");

    let skipped = conn
        .execute("DELETE FROM \"Orders\"", FailureSeverity::Fatal)
        .expect("preview is not an error");
    assert!(skipped.is_none());
    conn.execute("SELECT 1", FailureSeverity::Fatal)
        .expect("reads still run");
    assert_eq!(driver.executed_sql(), vec!["SELECT 1".to_string()]);

    let driver = ScriptedDriver::new();
    let mut conn = Connector::new(Backend::SqlServer, driver.clone())
        .with_write_preview(|sql: &str| sql.contains("Audit"));
    conn.connect(&params(), true).expect("scripted connect succeeds");
    conn.execute("INSERT INTO \"Audit\" VALUES (1)", FailureSeverity::Fatal)
        .expect("preview is not an error");
    assert!(driver.executed_sql().is_empty());
}

#[test]
fn affected_rows_cached_per_statement() {
    let driver = ScriptedDriver::new();
    driver.respond("UPDATE \"Orders\" SET \"Shipped\" = 1", NativeResultSet::affected(3));
    let mut conn = connected(Backend::SqlServer, &driver);

    conn.execute("UPDATE \"Orders\" SET \"Shipped\" = 1", FailureSeverity::Fatal)
        .expect("update runs");
    assert_eq!(conn.affected_rows(), 3);

    conn.execute("SELECT nothing", FailureSeverity::Fatal)
        .expect("select runs");
    assert_eq!(conn.affected_rows(), 0);
}

#[test]
fn affected_rows_read_from_connection_on_legacy_backend() {
    let driver = ScriptedDriver::new();
    driver.respond("DELETE FROM \"Queue\"", NativeResultSet::affected(7));
    let mut conn = connected(Backend::Mssql, &driver);
    conn.execute("DELETE FROM \"Queue\"", FailureSeverity::Fatal)
        .expect("delete runs");
    assert_eq!(conn.affected_rows(), 7);
}

#[test]
fn quoting_follows_backend() {
    let driver = ScriptedDriver::new();
    let conn = Connector::new(Backend::Azure, driver);
    assert_eq!(conn.quote_string("O'Brien"), "N'O''Brien'");
    assert_eq!(conn.escape_string("it's"), "it''s");
}

#[test]
fn version_and_generated_id() {
    let driver = ScriptedDriver::new();
    driver.respond(
        "SELECT CONVERT(char(15), SERVERPROPERTY('ProductVersion'))",
        NativeResultSet::with_rows(
            vec![FieldDescriptor::new("", "char")],
            vec![vec![RowValues::Text("15.0.2000.5    ".into())]],
        ),
    );
    driver.respond(
        "SELECT IDENT_CURRENT('Orders')",
        NativeResultSet::with_rows(
            vec![FieldDescriptor::new("", "numeric")],
            vec![vec![RowValues::Int(1207)]],
        ),
    );
    let mut conn = connected(Backend::SqlServer, &driver);
    assert_eq!(conn.version().expect("version"), "15.0.2000.5");
    assert_eq!(conn.generated_id("Orders").expect("identity"), Some(1207));
    assert_eq!(conn.generated_id("Empty").expect("identity"), None);
}

#[test]
fn close_releases_connection_once() {
    let driver = ScriptedDriver::new();
    {
        let mut conn = connected(Backend::SqlServer, &driver);
        conn.close();
        assert!(!conn.is_connected());
        assert_eq!(conn.selected_database(), None);
        let err = conn.execute("SELECT 1", FailureSeverity::Fatal).unwrap_err();
        assert!(matches!(err, MssqlMiddlewareError::ConnectionError(_)));
    }
    assert_eq!(driver.close_count(), 1);

    {
        let _conn = connected(Backend::SqlServer, &driver);
    }
    assert_eq!(driver.close_count(), 2);
}
