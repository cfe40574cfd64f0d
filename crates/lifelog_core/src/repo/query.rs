//! Predicate and ordering builders for generic fetches.
//!
//! # Invariants
//! - Column names are `'static` identifiers chosen by code, never user input.
//! - Every value is bound as a parameter; nothing is interpolated into SQL.

use rusqlite::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: SortDirection,
    pub nulls_last: bool,
}

impl Sort {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
            nulls_last: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
            nulls_last: false,
        }
    }

    pub const fn nulls_last(mut self) -> Self {
        self.nulls_last = true;
        self
    }

    fn to_sql(self) -> String {
        let direction = match self.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        if self.nulls_last {
            format!("{} {direction} NULLS LAST", self.column)
        } else {
            format!("{} {direction}", self.column)
        }
    }
}

/// Ordering and pagination for [`Filter`]-based fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Empty means "use the entity default ordering".
    pub sort: Vec<Sort>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl FetchOptions {
    pub fn sorted_by(sort: Sort) -> Self {
        Self {
            sort: vec![sort],
            ..Self::default()
        }
    }

    pub fn then_by(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Renders `ORDER BY ... LIMIT ... OFFSET ...`. An `id ASC` tiebreak is
    /// appended unless the terms already order by `id`, so pages stay stable
    /// across equal sort keys.
    pub(crate) fn to_sql(&self, default_sort: &[Sort], binds: &mut Vec<Value>) -> String {
        let terms = if self.sort.is_empty() {
            default_sort
        } else {
            self.sort.as_slice()
        };
        let mut order = terms.iter().map(|sort| sort.to_sql()).collect::<Vec<_>>();
        if !terms.iter().any(|sort| sort.column == "id") {
            order.push("id ASC".to_string());
        }

        let mut sql = format!(" ORDER BY {}", order.join(", "));
        match (self.limit, self.offset) {
            (Some(limit), 0) => {
                sql.push_str(" LIMIT ?");
                binds.push(Value::Integer(i64::from(limit)));
            }
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                binds.push(Value::Integer(i64::from(limit)));
                binds.push(Value::Integer(i64::from(offset)));
            }
            (None, 0) => {}
            (None, offset) => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                binds.push(Value::Integer(i64::from(offset)));
            }
        }
        sql
    }
}

/// Conjunction of column conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Filter {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, "=", value.into())
    }

    pub fn ne(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, "<>", value.into())
    }

    pub fn gte(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, ">=", value.into())
    }

    pub fn lt(self, column: &'static str, value: impl Into<Value>) -> Self {
        self.compare(column, "<", value.into())
    }

    /// Half-open range `start <= column < end`.
    pub fn between(self, column: &'static str, start: i64, end: i64) -> Self {
        self.gte(column, start).lt(column, end)
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.clauses.push(format!("{column} IS NULL"));
        self
    }

    pub fn is_not_null(mut self, column: &'static str) -> Self {
        self.clauses.push(format!("{column} IS NOT NULL"));
        self
    }

    /// ASCII case-insensitive substring match; `%`, `_` and `\` in `needle` are literal.
    pub fn contains(mut self, column: &'static str, needle: &str) -> Self {
        self.clauses.push(format!("{column} LIKE ? ESCAPE '\\'"));
        self.values.push(Value::Text(format!("%{}%", escape_like(needle))));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }

    fn compare(mut self, column: &'static str, operator: &str, value: Value) -> Self {
        self.clauses.push(format!("{column} {operator} ?"));
        self.values.push(value);
        self
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
