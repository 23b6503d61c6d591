//! Read-only view of an abstract SELECT statement.
//!
//! Query builders hand the translator anything implementing [`SelectQuery`]; `SqlSelect`
//! is a plain owned implementation for callers without a builder of their own.

use crate::types::RowValues;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One select-list expression with its optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub expression: String,
    pub alias: Option<String>,
}

impl SelectItem {
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn aliased(expression: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            alias: Some(alias.into()),
        }
    }
}

/// A predicate fragment using `?` placeholders, with its positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub sql: String,
    pub parameters: Vec<RowValues>,
}

impl Predicate {
    #[must_use]
    pub fn new(sql: impl Into<String>, parameters: Vec<RowValues>) -> Self {
        Self {
            sql: sql.into(),
            parameters,
        }
    }
}

/// The shapes a limit can be supplied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitSpec {
    Structured { limit: Option<u64>, offset: u64 },
    /// `"N"`, `"N offset M"`, or `"offset,limit"`.
    Text(String),
}

/// Render-time accessors the translator reads from.
pub trait SelectQuery {
    fn is_distinct(&self) -> bool;
    fn select_items(&self) -> &[SelectItem];
    /// Table expression fragments, joined with a space (`"Orders"`, `"INNER JOIN ..."`).
    fn from_clauses(&self) -> &[String];
    fn where_predicates(&self) -> &[Predicate];
    fn group_by(&self) -> &[String];
    fn having_predicates(&self) -> &[Predicate];
    fn order_by(&self) -> &[(String, SortDirection)];
    fn limit(&self) -> Option<&LimitSpec>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlSelect {
    distinct: bool,
    select: Vec<SelectItem>,
    from: Vec<String>,
    wheres: Vec<Predicate>,
    group_by: Vec<String>,
    having: Vec<Predicate>,
    order_by: Vec<(String, SortDirection)>,
    limit: Option<LimitSpec>,
}

impl SqlSelect {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    #[must_use]
    pub fn select(mut self, expression: impl Into<String>) -> Self {
        self.select.push(SelectItem::new(expression));
        self
    }

    #[must_use]
    pub fn select_as(mut self, expression: impl Into<String>, alias: impl Into<String>) -> Self {
        self.select.push(SelectItem::aliased(expression, alias));
        self
    }

    #[must_use]
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.from.push(table.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, sql: impl Into<String>, parameters: Vec<RowValues>) -> Self {
        self.wheres.push(Predicate::new(sql, parameters));
        self
    }

    #[must_use]
    pub fn group_by(mut self, expression: impl Into<String>) -> Self {
        self.group_by.push(expression.into());
        self
    }

    #[must_use]
    pub fn having(mut self, sql: impl Into<String>, parameters: Vec<RowValues>) -> Self {
        self.having.push(Predicate::new(sql, parameters));
        self
    }

    /// Append an ordering entry; a repeated key replaces the earlier direction in place.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        let column = column.into();
        if let Some(entry) = self.order_by.iter_mut().find(|(key, _)| *key == column) {
            entry.1 = direction;
        } else {
            self.order_by.push((column, direction));
        }
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(LimitSpec::Structured {
            limit: Some(limit),
            offset,
        });
        self
    }

    #[must_use]
    pub fn limit_spec(mut self, spec: LimitSpec) -> Self {
        self.limit = Some(spec);
        self
    }

    #[must_use]
    pub fn limit_text(self, text: impl Into<String>) -> Self {
        self.limit_spec(LimitSpec::Text(text.into()))
    }
}

impl SelectQuery for SqlSelect {
    fn is_distinct(&self) -> bool {
        self.distinct
    }

    fn select_items(&self) -> &[SelectItem] {
        &self.select
    }

    fn from_clauses(&self) -> &[String] {
        &self.from
    }

    fn where_predicates(&self) -> &[Predicate] {
        &self.wheres
    }

    fn group_by(&self) -> &[String] {
        &self.group_by
    }

    fn having_predicates(&self) -> &[Predicate] {
        &self.having
    }

    fn order_by(&self) -> &[(String, SortDirection)] {
        &self.order_by
    }

    fn limit(&self) -> Option<&LimitSpec> {
        self.limit.as_ref()
    }
}
