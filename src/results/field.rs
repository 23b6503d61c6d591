use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::types::RowValues;

/// Canonical text form of temporal values.
pub const CANONICAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// "Jan  5 2012 11:00:00:000AM": the millisecond group sits right before the meridiem.
static SUBSECOND_BEFORE_MERIDIEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i):[0-9]{3}\s*([ap]m)$").expect("static regex compiles")
});

const LEGACY_FORMATS: [&str; 2] = ["%b %e %Y %I:%M:%S %p", "%b %e %Y %H:%M:%S"];

/// Engine type family of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Temporal,
    Numeric,
    Text,
    Boolean,
    Binary,
    Other,
}

impl FieldType {
    /// Classify an engine type name such as `datetime` or `nvarchar`.
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "datetime" | "smalldatetime" | "datetime2" | "datetimeoffset" | "date" | "time" => {
                FieldType::Temporal
            }
            "tinyint" | "smallint" | "int" | "bigint" | "decimal" | "numeric" | "money"
            | "smallmoney" | "float" | "real" => FieldType::Numeric,
            "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "xml"
            | "uniqueidentifier" => FieldType::Text,
            "bit" => FieldType::Boolean,
            "binary" | "varbinary" | "image" => FieldType::Binary,
            _ => FieldType::Other,
        }
    }
}

/// Column metadata captured when a cursor is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    /// Type name as reported by the client library.
    pub type_name: String,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            field_type: FieldType::from_type_name(&type_name),
            type_name,
        }
    }
}

/// Normalize one raw cell given its column's declared type.
///
/// `datetime`-family values become `YYYY-MM-DD HH:MM:SS` text, from legacy text or typed
/// timestamps. `date`, `time` and `datetimeoffset` text keeps its ISO shape. Everything
/// else passes through.
#[must_use]
pub fn decode(field: &FieldDescriptor, raw: RowValues) -> RowValues {
    if field.field_type != FieldType::Temporal {
        return raw;
    }
    match raw {
        RowValues::Text(text) if !text.is_empty() => match normalize_legacy_datetime(&text) {
            Some(canonical) => RowValues::Text(canonical),
            None => RowValues::Text(text),
        },
        RowValues::Timestamp(dt) => RowValues::Text(dt.format(CANONICAL_DATETIME_FORMAT).to_string()),
        other => other,
    }
}

/// Rewrite `"Jan  5 2012 11:00:00:123PM"` as `"2012-01-05 23:00:00"`.
///
/// The millisecond group is dropped, not rounded. Text in any other shape yields `None`.
#[must_use]
pub fn normalize_legacy_datetime(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let stripped = SUBSECOND_BEFORE_MERIDIEM.replace(trimmed, " $1");
    let parsed = LEGACY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&stripped, fmt).ok());
    if parsed.is_none() {
        tracing::debug!(value = %text, "temporal value not in legacy format, left as is");
    }
    parsed.map(|dt| dt.format(CANONICAL_DATETIME_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime_field() -> FieldDescriptor {
        FieldDescriptor::new("Created", "datetime")
    }

    #[test]
    fn morning_value_without_subseconds() {
        assert_eq!(
            normalize_legacy_datetime("Jan  5 2012 11:00:00:000AM").as_deref(),
            Some("2012-01-05 11:00:00")
        );
    }

    #[test]
    fn afternoon_value_truncates_subseconds() {
        assert_eq!(
            normalize_legacy_datetime("Jan  5 2012 11:00:00:123PM").as_deref(),
            Some("2012-01-05 23:00:00")
        );
    }

    #[test]
    fn midnight_and_two_digit_days() {
        assert_eq!(
            normalize_legacy_datetime("Dec 31 1999 12:00:00:000AM").as_deref(),
            Some("1999-12-31 00:00:00")
        );
        assert_eq!(
            normalize_legacy_datetime("Feb 29 2020 12:30:15:999pm").as_deref(),
            Some("2020-02-29 12:30:15")
        );
    }

    #[test]
    fn decode_only_touches_temporal_fields() {
        let text = RowValues::Text("Jan  5 2012 11:00:00:000AM".into());
        let name = FieldDescriptor::new("Title", "nvarchar");
        assert_eq!(decode(&name, text.clone()), text);
        assert_eq!(
            decode(&datetime_field(), text),
            RowValues::Text("2012-01-05 11:00:00".into())
        );
    }

    #[test]
    fn decode_leaves_empty_null_and_unknown_values() {
        let field = datetime_field();
        assert_eq!(decode(&field, RowValues::Null), RowValues::Null);
        assert_eq!(
            decode(&field, RowValues::Text(String::new())),
            RowValues::Text(String::new())
        );
        assert_eq!(
            decode(&field, RowValues::Text("2012-01-05".into())),
            RowValues::Text("2012-01-05".into())
        );
    }

    #[test]
    fn decode_keeps_date_time_and_offset_shapes() {
        let cases = [
            ("date", "2024-03-01"),
            ("time", "13:45:00.5"),
            ("datetimeoffset", "2024-03-01T13:45:00+02:00"),
        ];
        for (type_name, text) in cases {
            let field = FieldDescriptor::new("At", type_name);
            assert_eq!(field.field_type, FieldType::Temporal);
            assert_eq!(
                decode(&field, RowValues::Text(text.into())),
                RowValues::Text(text.into())
            );
        }
    }

    #[test]
    fn decode_formats_typed_timestamps() {
        let dt = NaiveDateTime::parse_from_str("2012-01-05 23:00:00.250", "%Y-%m-%d %H:%M:%S%.f")
            .unwrap();
        assert_eq!(
            decode(&datetime_field(), RowValues::Timestamp(dt)),
            RowValues::Text("2012-01-05 23:00:00".into())
        );
    }

    #[test]
    fn classifies_type_names() {
        assert_eq!(FieldType::from_type_name("DateTime"), FieldType::Temporal);
        assert_eq!(FieldType::from_type_name("int"), FieldType::Numeric);
        assert_eq!(FieldType::from_type_name("nvarchar"), FieldType::Text);
        assert_eq!(FieldType::from_type_name("geography"), FieldType::Other);
    }
}
