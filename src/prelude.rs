//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::backend::{Backend, Capabilities};
pub use crate::config::{ConnectOptions, ConnectionParameters};
pub use crate::connector::{Connector, NoPreview, PreviewWrites, WritePreview};
pub use crate::error::MssqlMiddlewareError;
pub use crate::native::{Diagnostic, NativeConnection, NativeDriver, NativeResultSet};
pub use crate::results::{DbRow, FieldDescriptor, FieldType, ResultCursor};
pub use crate::select::{LimitSpec, Predicate, SelectQuery, SortDirection, SqlSelect};
pub use crate::translation::{RenderedStatement, render, translate_placeholders};
pub use crate::types::{FailureSeverity, RowValues};

#[cfg(feature = "tiberius")]
pub use crate::mssql::{MssqlClient, MssqlConnector, TiberiusConnection, TiberiusDriver};
