//! Statement assembly for the repository layer.
//!
//! Every list, update and delete goes through [`assemble`]. Column and table
//! names only ever come from `&'static str` constants in the repositories.
//! Caller input reaches the statement through [`SqlValue`] (integers, flags,
//! enumerated strings, timestamps) or through a [`Pattern`], which is escaped
//! and wrapped in wildcards.

use std::fmt::Write as _;

use time::{format_description::well_known::Rfc3339, OffsetDateTime, UtcOffset};
use tracing::debug;

/// A typed value that can be rendered into a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Bool(bool),
    Enum(&'static str),
    Timestamp(OffsetDateTime),
}

impl SqlValue {
    fn render(&self) -> String {
        match self {
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Bool(v) => (if *v { "1" } else { "0" }).to_string(),
            SqlValue::Enum(v) => format!("'{}'", v.replace('\'', "''")),
            SqlValue::Timestamp(v) => {
                // Rfc3339 formatting of a UTC value cannot fail.
                let text = v
                    .to_offset(UtcOffset::UTC)
                    .format(&Rfc3339)
                    .unwrap_or_default();
                format!("'{text}'")
            }
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<OffsetDateTime> for SqlValue {
    fn from(v: OffsetDateTime) -> Self {
        SqlValue::Timestamp(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Le,
    Ge,
}

impl Cmp {
    fn as_str(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Le => "<=",
            Cmp::Ge => ">=",
        }
    }
}

/// One ANDed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate(String);

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::cmp(column, Cmp::Eq, value)
    }

    pub fn cmp(column: &'static str, op: Cmp, value: impl Into<SqlValue>) -> Self {
        Predicate(format!("{column}{}{}", op.as_str(), value.into().render()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A join fragment, appended verbatim after the base statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join(&'static str);

impl Join {
    pub const fn new(fragment: &'static str) -> Self {
        Join(fragment)
    }
}

/// Free-text match value, escaped for use inside a LIKE literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(String);

impl Pattern {
    pub fn new(raw: &str) -> Self {
        let mut escaped = String::with_capacity(raw.len());
        for c in raw.chars() {
            match c {
                '\'' => escaped.push_str("''"),
                '\\' | '%' | '_' => {
                    escaped.push('\\');
                    escaped.push(c);
                }
                _ => escaped.push(c),
            }
        }
        Pattern(escaped)
    }

    fn render_for(&self, field: &str) -> String {
        format!("{field} LIKE '%{}%' ESCAPE '\\'", self.0)
    }
}

/// Fields ORed against one pattern. Groups are ANDed with everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrGroup {
    fields: Vec<&'static str>,
    pattern: Pattern,
}

impl OrGroup {
    pub fn new(fields: &[&'static str], term: &str) -> Self {
        Self {
            fields: fields.to_vec(),
            pattern: Pattern::new(term),
        }
    }

    fn render(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|f| self.pattern.render_for(f))
            .collect();
        Some(format!("({})", parts.join(" OR ")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: Direction,
}

impl Sort {
    pub const fn asc(column: &'static str) -> Self {
        Self { column, direction: Direction::Asc }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self { column, direction: Direction::Desc }
    }
}

/// Caller-facing sort keys. Unknown or absent keys fall back to
/// [`SortKey::LastUpdated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Az,
    Za,
    Oldest,
    Newest,
    #[default]
    LastUpdated,
    Completed,
}

impl SortKey {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("az") => SortKey::Az,
            Some("za") => SortKey::Za,
            Some("oldest") => SortKey::Oldest,
            Some("newest") => SortKey::Newest,
            Some("completed") => SortKey::Completed,
            _ => SortKey::LastUpdated,
        }
    }
}

/// `?sort=` query parameter shared by every list endpoint.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SortQuery {
    pub sort: Option<String>,
}

impl SortQuery {
    pub fn key(&self) -> SortKey {
        SortKey::parse(self.sort.as_deref())
    }
}

/// Column whitelist an entity uses to resolve a [`SortKey`].
pub struct SortColumns {
    pub name: &'static str,
    pub created_at: &'static str,
    pub updated_at: &'static str,
    pub completed_at: Option<&'static str>,
}

impl SortColumns {
    pub fn resolve(&self, key: SortKey) -> Sort {
        match key {
            SortKey::Az => Sort::asc(self.name),
            SortKey::Za => Sort::desc(self.name),
            SortKey::Oldest => Sort::asc(self.created_at),
            SortKey::Newest => Sort::desc(self.created_at),
            SortKey::Completed => match self.completed_at {
                Some(col) => Sort::desc(col),
                None => Sort::desc(self.updated_at),
            },
            SortKey::LastUpdated => Sort::desc(self.updated_at),
        }
    }
}

/// Build one statement string. Joins, predicates and groups keep the order
/// they were supplied in.
pub fn assemble(
    base: &str,
    joins: &[Join],
    predicates: &[Predicate],
    groups: &[OrGroup],
    sort: Option<Sort>,
) -> String {
    let mut sql = String::from(base);
    for join in joins {
        sql.push(' ');
        sql.push_str(join.0);
    }

    let mut conditions: Vec<String> = predicates.iter().map(|p| p.0.clone()).collect();
    conditions.extend(groups.iter().filter_map(OrGroup::render));
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if let Some(sort) = sort {
        let dir = match sort.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        let _ = write!(sql, " ORDER BY {} {dir}", sort.column);
    }

    debug!(sql = %sql, "statement assembled");
    sql
}

/// Accumulates statement parts for [`assemble`].
#[derive(Debug, Default)]
pub struct StatementParts {
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    groups: Vec<OrGroup>,
    sort: Option<Sort>,
}

impl StatementParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, join: Join) -> &mut Self {
        self.joins.push(join);
        self
    }

    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds an equality predicate when `value` is present.
    pub fn filter_opt<V: Into<SqlValue>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.predicates.push(Predicate::eq(column, v));
        }
        self
    }

    /// Adds a substring search across `fields` when `term` is non-empty.
    pub fn search(&mut self, fields: &[&'static str], term: Option<&str>) -> &mut Self {
        if let Some(term) = term.filter(|t| !t.is_empty()) {
            self.groups.push(OrGroup::new(fields, term));
        }
        self
    }

    pub fn sort(&mut self, sort: Sort) -> &mut Self {
        self.sort = Some(sort);
        self
    }

    pub fn build(&self, base: &str) -> String {
        assemble(base, &self.joins, &self.predicates, &self.groups, self.sort)
    }
}
