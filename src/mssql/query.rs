use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use tiberius::{Column, ColumnData, ColumnType, Query, Row};

use super::client::MssqlClient;
use crate::native::NativeResultSet;
use crate::results::FieldDescriptor;
use crate::translation::{statement_start, translate_placeholders};
use crate::types::RowValues;

static ROW_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(select|with|exec|execute|declare|values)\b").expect("static regex compiles")
});

// `OUTPUT inserted.ID`, `OUTPUT deleted.*`, `OUTPUT $action` on MERGE
static OUTPUT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\boutput\s+(inserted\s*\.|deleted\s*\.|\$action\b)")
        .expect("static regex compiles")
});

/// Whether `sql` produces a result set. Everything else runs as an execute so the
/// affected row count is reported.
pub(super) fn returns_rows(sql: &str) -> bool {
    ROW_KEYWORD.is_match(&sql[statement_start(sql)..]) || OUTPUT_CLAUSE.is_match(sql)
}

/// Run one statement and fetch its first result completely.
pub(super) async fn run_statement(
    client: &mut MssqlClient,
    sql: &str,
    params: &[RowValues],
) -> tiberius::Result<NativeResultSet> {
    let text = if params.is_empty() {
        Cow::Borrowed(sql)
    } else {
        translate_placeholders(sql)
    };
    let query = bind_query_params(text, params);

    if !returns_rows(sql) {
        let exec_result = query.execute(client).await?;
        let rows_affected: u64 = exec_result.rows_affected().iter().sum();
        return Ok(NativeResultSet::affected(rows_affected));
    }

    let mut stream = query.query(client).await?;
    let fields: Option<Vec<FieldDescriptor>> = stream
        .columns()
        .await?
        .map(|columns| columns.iter().map(describe_column).collect());

    let Some(fields) = fields else {
        // still has to be drained before the client can be reused
        stream.into_results().await?;
        return Ok(NativeResultSet::affected(0));
    };

    let rows = stream
        .into_first_result()
        .await?
        .iter()
        .map(convert_row)
        .collect();
    Ok(NativeResultSet::with_rows(fields, rows))
}

/// Bind parameters directly to the query for SQL Server
pub(super) fn bind_query_params<'a>(
    sql: impl Into<Cow<'a, str>>,
    params: &[RowValues],
) -> Query<'a> {
    let mut query_builder = Query::new(sql);

    for param in params {
        match param {
            RowValues::Int(i) => query_builder.bind(*i),
            RowValues::Float(f) => query_builder.bind(*f),
            RowValues::Text(s) => query_builder.bind(s.clone()),
            RowValues::Bool(b) => query_builder.bind(*b),
            RowValues::Timestamp(dt) => query_builder.bind(*dt),
            RowValues::Null => query_builder.bind(Option::<String>::None),
            RowValues::JSON(jsval) => query_builder.bind(jsval.to_string()),
            RowValues::Blob(bytes) => query_builder.bind(bytes.clone()),
        }
    }

    query_builder
}

fn describe_column(column: &Column) -> FieldDescriptor {
    FieldDescriptor::new(column.name(), type_name(column.column_type()))
}

fn type_name(column_type: ColumnType) -> &'static str {
    #[allow(unreachable_patterns)]
    match column_type {
        ColumnType::Null => "null",
        ColumnType::Bit | ColumnType::Bitn => "bit",
        ColumnType::Int1 => "tinyint",
        ColumnType::Int2 => "smallint",
        ColumnType::Int4 | ColumnType::Intn => "int",
        ColumnType::Int8 => "bigint",
        ColumnType::Float4 => "real",
        ColumnType::Float8 | ColumnType::Floatn => "float",
        ColumnType::Money | ColumnType::Money4 => "money",
        ColumnType::Decimaln => "decimal",
        ColumnType::Numericn => "numeric",
        ColumnType::Guid => "uniqueidentifier",
        ColumnType::Datetime | ColumnType::Datetimen => "datetime",
        ColumnType::Datetime4 => "smalldatetime",
        ColumnType::Datetime2 => "datetime2",
        ColumnType::DatetimeOffsetn => "datetimeoffset",
        ColumnType::Daten => "date",
        ColumnType::Timen => "time",
        ColumnType::BigVarBin => "varbinary",
        ColumnType::BigBinary => "binary",
        ColumnType::Image => "image",
        ColumnType::BigVarChar => "varchar",
        ColumnType::BigChar => "char",
        ColumnType::NVarchar => "nvarchar",
        ColumnType::NChar => "nchar",
        ColumnType::Text => "text",
        ColumnType::NText => "ntext",
        ColumnType::Xml => "xml",
        ColumnType::Udt => "udt",
        ColumnType::SSVariant => "sql_variant",
        _ => "unknown",
    }
}

fn convert_row(row: &Row) -> Vec<RowValues> {
    row.cells()
        .enumerate()
        .map(|(idx, (_column, data))| convert_cell(row, idx, data))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn convert_cell(row: &Row, idx: usize, data: &ColumnData<'_>) -> RowValues {
    match data {
        ColumnData::Bit(Some(b)) => RowValues::Bool(*b),
        ColumnData::U8(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I16(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I32(Some(v)) => RowValues::Int(i64::from(*v)),
        ColumnData::I64(Some(v)) => RowValues::Int(*v),
        ColumnData::F32(Some(v)) => RowValues::Float(f64::from(*v)),
        ColumnData::F64(Some(v)) => RowValues::Float(*v),
        ColumnData::Numeric(Some(n)) => {
            if n.scale() == 0 {
                i64::try_from(n.value())
                    .map_or_else(|_| RowValues::Float(n.value() as f64), RowValues::Int)
            } else {
                RowValues::Float(n.value() as f64 / 10f64.powi(i32::from(n.scale())))
            }
        }
        ColumnData::String(Some(s)) => RowValues::Text(s.to_string()),
        ColumnData::Guid(Some(g)) => RowValues::Text(g.to_string()),
        ColumnData::Binary(Some(b)) => RowValues::Blob(b.to_vec()),
        ColumnData::Xml(Some(xml)) => RowValues::Text(xml.to_string()),
        ColumnData::DateTime(Some(_))
        | ColumnData::SmallDateTime(Some(_))
        | ColumnData::DateTime2(Some(_)) => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .flatten()
            .map_or(RowValues::Null, RowValues::Timestamp),
        ColumnData::Date(Some(_)) => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .flatten()
            .map_or(RowValues::Null, |d| RowValues::Text(d.format("%Y-%m-%d").to_string())),
        ColumnData::Time(Some(_)) => row
            .try_get::<NaiveTime, _>(idx)
            .ok()
            .flatten()
            .map_or(RowValues::Null, |t| RowValues::Text(t.format("%H:%M:%S%.f").to_string())),
        ColumnData::DateTimeOffset(Some(_)) => row
            .try_get::<DateTime<FixedOffset>, _>(idx)
            .ok()
            .flatten()
            .map_or(RowValues::Null, |dt| RowValues::Text(dt.to_rfc3339())),
        _ => RowValues::Null,
    }
}
