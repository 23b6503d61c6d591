use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The client library variant a connector talks through.
///
/// All variants share one `Connector` implementation; the differences are expressed
/// entirely through [`Capabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Legacy `mssql` client library: no transactions, no charset negotiation,
    /// a native select-database primitive.
    Mssql,
    /// `sqlsrv` client library: transactions, explicit charset, multiple active
    /// result sets, database bound at connect time.
    SqlServer,
    /// `sqlsrv` against the cloud-hosted engine. Database selection after connect
    /// is not available and multiple active result sets are always off.
    Azure,
}

/// Fixed optional features of a backend variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    pub supports_explicit_transactions: bool,
    pub supports_multiple_active_result_sets: bool,
    /// The database name can be bound as a connection option.
    pub requires_database_at_connect_time: bool,
    pub supports_unicode_literal_prefix: bool,
    /// `select_database` calls a driver primitive instead of issuing `USE`.
    pub supports_native_select_database: bool,
    pub supports_database_selection: bool,
    /// Affected rows come from the statement handle, so the connector must cache them.
    pub caches_statement_affected_rows: bool,
}

impl Backend {
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Backend::Mssql => Capabilities {
                supports_explicit_transactions: false,
                supports_multiple_active_result_sets: false,
                requires_database_at_connect_time: false,
                supports_unicode_literal_prefix: true,
                supports_native_select_database: true,
                supports_database_selection: true,
                caches_statement_affected_rows: false,
            },
            Backend::SqlServer => Capabilities {
                supports_explicit_transactions: true,
                supports_multiple_active_result_sets: true,
                requires_database_at_connect_time: true,
                supports_unicode_literal_prefix: true,
                supports_native_select_database: false,
                supports_database_selection: true,
                caches_statement_affected_rows: true,
            },
            Backend::Azure => Capabilities {
                supports_explicit_transactions: true,
                supports_multiple_active_result_sets: false,
                requires_database_at_connect_time: true,
                supports_unicode_literal_prefix: true,
                supports_native_select_database: false,
                supports_database_selection: false,
                caches_statement_affected_rows: true,
            },
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Backend::Mssql => "mssql",
            Backend::SqlServer => "sqlsrv",
            Backend::Azure => "sqlsrv (azure)",
        }
    }
}
