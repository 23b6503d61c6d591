//! SQL Server family adaptation layer.
//!
//! Renders dialect-neutral SELECT descriptions into T-SQL (including `ROW_NUMBER()`
//! windowed paging), runs statements through a [`Connector`] that tracks backend
//! capabilities and diagnostics, and reads results back through a [`ResultCursor`].
//!
//! ```rust
//! use mssql_middleware::prelude::*;
//!
//! let query = SqlSelect::new()
//!     .select("id")
//!     .select("name")
//!     .from("users")
//!     .order_by("name", SortDirection::Asc)
//!     .limit(10, 20);
//! let rendered = render(&query).unwrap();
//! assert!(rendered.sql().contains("ROW_NUMBER() OVER (ORDER BY name ASC)"));
//! ```

pub mod backend;
pub mod config;
pub mod connector;
pub mod error;
pub mod native;
pub mod prelude;
pub mod results;
pub mod select;
pub mod translation;
pub mod types;

#[cfg(feature = "tiberius")]
pub mod mssql;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use backend::{Backend, Capabilities};
pub use config::{ConnectOptions, ConnectionParameters};
pub use connector::Connector;
pub use error::MssqlMiddlewareError;
pub use results::{DbRow, ResultCursor};
pub use select::{LimitSpec, SelectQuery, SqlSelect};
pub use translation::{RenderedStatement, render};
pub use types::{FailureSeverity, RowValues};

#[cfg(feature = "tiberius")]
pub use mssql::{MssqlConnector, TiberiusDriver};
