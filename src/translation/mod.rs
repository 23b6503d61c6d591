//! Renders abstract SELECT statements into SQL Server SQL.
//!
//! SQL Server has no `LIMIT .. OFFSET`; a plain limit becomes `TOP n`, and a page past the
//! first row is emulated with `ROW_NUMBER() OVER (..)` inside a sub-select filtered with
//! `BETWEEN`.

mod limit;
mod placeholders;
mod scanner;

pub use limit::{Paging, parse_limit};
pub use placeholders::translate_placeholders;
pub(crate) use scanner::statement_start;

use crate::error::MssqlMiddlewareError;
use crate::select::{Predicate, SelectQuery, SortDirection};
use crate::types::RowValues;

/// Reserved alias of the injected row-number column.
pub const ROW_NUMBER_ALIAS: &str = "_RowNumber";
/// Alias of the windowed sub-select.
pub const PAGINATION_ALIAS: &str = "_Numbered";
/// Prefix query builders use for synthetic sort-column aliases.
pub const SORT_COLUMN_PREFIX: &str = "_SortColumn";

/// SQL text plus its positional parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStatement {
    sql: String,
    parameters: Vec<RowValues>,
}

impl RenderedStatement {
    #[must_use]
    pub fn new(sql: String, parameters: Vec<RowValues>) -> Self {
        Self { sql, parameters }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn parameters(&self) -> &[RowValues] {
        &self.parameters
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<RowValues>) {
        (self.sql, self.parameters)
    }
}

/// Render `query` as SQL Server SQL.
///
/// ```rust
/// use mssql_middleware::prelude::*;
///
/// let query = SqlSelect::new()
///     .select("\"ID\"")
///     .from("\"Orders\"")
///     .order_by("\"ID\"", SortDirection::Asc)
///     .limit(10, 20);
/// let rendered = render(&query)?;
/// assert!(rendered.sql().contains("BETWEEN 21 AND 30"));
/// # Ok::<(), MssqlMiddlewareError>(())
/// ```
///
/// # Errors
///
/// Returns `MssqlMiddlewareError::InvalidLimit` if a textual limit is malformed.
pub fn render<Q: SelectQuery + ?Sized>(query: &Q) -> Result<RenderedStatement, MssqlMiddlewareError> {
    let paging = parse_limit(query.limit())?;
    let mut parameters = Vec::new();

    if !paging.is_windowed() {
        if paging.limit.is_none() && paging.offset > 0 {
            tracing::warn!(
                offset = paging.offset,
                "offset without a limit is ignored by SQL Server rendering"
            );
        }
        let head = paging.limit.map(|limit| format!("TOP {limit}"));
        let sql = build_select(query, head.as_deref(), &paging, &mut parameters);
        return Ok(RenderedStatement::new(sql, parameters));
    }

    let head = format!(
        "ROW_NUMBER() OVER ({}) AS \"{ROW_NUMBER_ALIAS}\",",
        window_ordering(query)
    );
    let base = build_select(query, Some(&head), &paging, &mut parameters);

    // is_windowed guarantees a limit
    let limit = paging.limit.unwrap_or_default();
    let first = paging.offset.saturating_add(1);
    let last = paging.offset.saturating_add(limit);
    let sql = format!(
        "SELECT * FROM ({base}) AS \"{PAGINATION_ALIAS}\" WHERE \"{ROW_NUMBER_ALIAS}\" BETWEEN {first} AND {last} ORDER BY \"{ROW_NUMBER_ALIAS}\""
    );
    Ok(RenderedStatement::new(sql, parameters))
}

/// The trailing `ORDER BY` of the base statement.
///
/// Empty when there is no ordering, or when the window clause owns the ordering.
#[must_use]
pub fn order_by_fragment<Q: SelectQuery + ?Sized>(query: &Q, paging: &Paging) -> String {
    if paging.is_windowed() || query.order_by().is_empty() {
        return String::new();
    }
    format!("ORDER BY {}", ordering_list(query.order_by().iter().cloned()))
}

/// `ORDER BY` text for the `OVER` clause.
///
/// Entries naming a select-list alias are replaced by the aliased expression, since the
/// window cannot see aliases from its own select list. Without any ordering, paging falls
/// back to the first select-list expression.
fn window_ordering<Q: SelectQuery + ?Sized>(query: &Q) -> String {
    let order_by = query.order_by();
    if order_by.is_empty() {
        let first = query
            .select_items()
            .first()
            .map(|item| item.expression.as_str())
            .filter(|expr| !is_wildcard(expr));
        return match first {
            Some(expr) => format!("ORDER BY {expr} ASC"),
            None => "ORDER BY (SELECT NULL)".to_string(),
        };
    }

    let entries = order_by.iter().map(|(key, direction)| {
        let bare = unquote(key);
        let expression = query
            .select_items()
            .iter()
            .find(|item| item.alias.as_deref() == Some(bare) && item.expression != *key)
            .map_or_else(|| key.clone(), |item| item.expression.clone());
        (expression, *direction)
    });
    format!("ORDER BY {}", ordering_list(entries))
}

fn ordering_list(entries: impl Iterator<Item = (String, SortDirection)>) -> String {
    entries
        .map(|(expr, direction)| format!("{expr} {}", direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn build_select<Q: SelectQuery + ?Sized>(
    query: &Q,
    head: Option<&str>,
    paging: &Paging,
    parameters: &mut Vec<RowValues>,
) -> String {
    let mut sql = String::from("SELECT ");
    if query.is_distinct() {
        sql.push_str("DISTINCT ");
    }
    if let Some(head) = head {
        sql.push_str(head);
        sql.push(' ');
    }
    sql.push_str(&select_list(query));

    if !query.from_clauses().is_empty() {
        sql.push_str(" FROM ");
        sql.push_str(&query.from_clauses().join(" "));
    }
    if let Some(clause) = predicate_clause("WHERE", query.where_predicates(), parameters) {
        sql.push(' ');
        sql.push_str(&clause);
    }
    if !query.group_by().is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&query.group_by().join(", "));
    }
    if let Some(clause) = predicate_clause("HAVING", query.having_predicates(), parameters) {
        sql.push(' ');
        sql.push_str(&clause);
    }
    let order_by = order_by_fragment(query, paging);
    if !order_by.is_empty() {
        sql.push(' ');
        sql.push_str(&order_by);
    }
    sql
}

fn select_list<Q: SelectQuery + ?Sized>(query: &Q) -> String {
    if query.select_items().is_empty() {
        return "*".to_string();
    }
    query
        .select_items()
        .iter()
        .map(|item| match &item.alias {
            Some(alias) if alias != unquote(&item.expression) => {
                format!("{} AS \"{alias}\"", item.expression)
            }
            _ => item.expression.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn predicate_clause(
    keyword: &str,
    predicates: &[Predicate],
    parameters: &mut Vec<RowValues>,
) -> Option<String> {
    if predicates.is_empty() {
        return None;
    }
    let joined = predicates
        .iter()
        .map(|predicate| {
            parameters.extend(predicate.parameters.iter().cloned());
            format!("({})", predicate.sql)
        })
        .collect::<Vec<_>>()
        .join(" AND ");
    Some(format!("{keyword} {joined}"))
}

fn unquote(identifier: &str) -> &str {
    identifier
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(identifier)
}

fn is_wildcard(expression: &str) -> bool {
    expression == "*" || expression.ends_with(".*")
}
