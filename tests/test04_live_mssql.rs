#![cfg(feature = "tiberius")]

//! Runs against a real server when `TESTING_MSSQL_SERVER` is set, e.g.
//! `TESTING_MSSQL_SERVER=localhost,1433 TESTING_MSSQL_PASSWORD=... cargo test`.

use std::env;

use mssql_middleware::prelude::*;

fn live_params() -> Option<ConnectionParameters> {
    let server = env::var("TESTING_MSSQL_SERVER").ok()?;
    let user = env::var("TESTING_MSSQL_USER").unwrap_or_else(|_| "sa".to_string());
    let password = env::var("TESTING_MSSQL_PASSWORD").unwrap_or_default();
    let database = env::var("TESTING_MSSQL_DATABASE").unwrap_or_else(|_| "tempdb".to_string());
    Some(
        ConnectionParameters::builder(server)
            .credentials(user, password)
            .database(database)
            .finish(),
    )
}

#[test]
fn live_paging_round_trip() -> Result<(), MssqlMiddlewareError> {
    let Some(params) = live_params() else {
        eprintln!("TESTING_MSSQL_SERVER not set, skipping");
        return Ok(());
    };

    let mut conn = MssqlConnector::tiberius(Backend::SqlServer);
    conn.connect(&params, true)?;
    assert!(conn.is_connection_active());
    assert!(!conn.version()?.is_empty());

    conn.execute(
        "IF OBJECT_ID('mw_paging') IS NOT NULL DROP TABLE mw_paging",
        FailureSeverity::Fatal,
    )?;
    conn.execute(
        "CREATE TABLE mw_paging (ID INT IDENTITY(1,1) PRIMARY KEY, Name NVARCHAR(50), Created DATETIME)",
        FailureSeverity::Fatal,
    )?;

    conn.with_transaction(|conn| {
        for n in 1..=12 {
            let statement = RenderedStatement::new(
                "INSERT INTO mw_paging (Name, Created) VALUES (?, '2012-01-05T11:00:00')"
                    .to_string(),
                vec![RowValues::Text(format!("row{n:02}"))],
            );
            conn.execute_rendered(&statement, FailureSeverity::Fatal)?;
            assert_eq!(conn.affected_rows(), 1);
        }
        Ok(())
    })?;
    assert_eq!(conn.generated_id("mw_paging")?, Some(12));

    let query = SqlSelect::new()
        .select("ID")
        .select("Name")
        .select("Created")
        .from("mw_paging")
        .order_by("Name", SortDirection::Asc)
        .limit(5, 5);
    let statement = render(&query)?;
    let cursor = conn
        .execute_rendered(&statement, FailureSeverity::Fatal)?
        .ok_or_else(|| MssqlMiddlewareError::QueryExecutionError("expected a result set".into()))?;
    let rows: Vec<DbRow> = cursor.collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].get("Name"), Some(&RowValues::Text("row06".into())));
    assert_eq!(
        rows[0].get("Created"),
        Some(&RowValues::Text("2012-01-05 11:00:00".into()))
    );
    assert!(rows[0].get("_RowNumber").is_none());

    let missing = conn.execute("SELECT no_such_column FROM mw_paging", FailureSeverity::NonFatal)?;
    assert!(missing.is_none());
    assert!(conn.last_error_text().contains("207"));

    conn.execute("DROP TABLE mw_paging", FailureSeverity::Fatal)?;
    conn.close();
    Ok(())
}
