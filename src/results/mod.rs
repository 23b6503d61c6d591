//! Result cursors and the per-cell field decoder.

mod cursor;
mod field;
mod row;

pub use cursor::ResultCursor;
pub use field::{
    CANONICAL_DATETIME_FORMAT, FieldDescriptor, FieldType, decode, normalize_legacy_datetime,
};
pub use row::DbRow;
