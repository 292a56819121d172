//! Query building for entry listings
//!
//! Every type-specific filter a tool offers is one [`ContentFilter`]: a path
//! into the JSON payload plus a [`Matcher`]. Filters are rendered as SQL
//! predicates over `json_extract(content, '$.<path>')`, so the store never
//! has to post-filter rows in memory and the row limit stays exact.

use super::EntryType;
use sqlx::{QueryBuilder, Sqlite};

/// Default number of rows returned by a listing
pub const DEFAULT_LIMIT: usize = 50;

/// Hard cap on rows returned by a listing
pub const MAX_LIMIT: usize = 100;

/// How a filter value is compared against the stored field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Byte-for-byte equality
    Exact,
    /// Equality ignoring ASCII case (e.g. HTTP methods, log levels)
    ExactIgnoreCase,
    /// Case-insensitive substring
    Contains,
    /// Integer equality (e.g. response status)
    NumberEq,
    /// JSON boolean
    Bool,
}

/// Typed filter value, bound as a query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

/// One predicate over the JSON payload of an entry
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFilter {
    /// Dotted path into `content` (e.g. `response_status`, `user.email`)
    pub path: String,
    pub matcher: Matcher,
    pub value: FilterValue,
}

impl ContentFilter {
    pub fn new(path: impl Into<String>, matcher: Matcher, value: FilterValue) -> Self {
        Self {
            path: path.into(),
            matcher,
            value,
        }
    }

    /// JSON path understood by SQLite's `json_extract`
    pub fn json_path(&self) -> String {
        format!("$.{}", self.path)
    }

    /// Append this predicate (without a leading `AND`) to a query
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self.matcher {
            Matcher::Exact => {
                qb.push("json_extract(content, ");
                qb.push_bind(self.json_path());
                qb.push(") = ");
                self.push_value(qb);
            }
            Matcher::ExactIgnoreCase => {
                qb.push("LOWER(json_extract(content, ");
                qb.push_bind(self.json_path());
                qb.push(")) = LOWER(");
                self.push_value(qb);
                qb.push(")");
            }
            Matcher::Contains => {
                qb.push("INSTR(LOWER(CAST(json_extract(content, ");
                qb.push_bind(self.json_path());
                qb.push(") AS TEXT)), LOWER(");
                self.push_value(qb);
                qb.push(")) > 0");
            }
            Matcher::NumberEq => {
                qb.push("CAST(json_extract(content, ");
                qb.push_bind(self.json_path());
                qb.push(") AS INTEGER) = ");
                self.push_value(qb);
            }
            Matcher::Bool => {
                // json_extract yields 1/0 for JSON true/false
                qb.push("json_extract(content, ");
                qb.push_bind(self.json_path());
                qb.push(") = ");
                self.push_value(qb);
            }
        }
    }

    fn push_value(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match &self.value {
            FilterValue::Text(s) => {
                qb.push_bind(s.clone());
            }
            FilterValue::Integer(n) => {
                qb.push_bind(*n);
            }
            FilterValue::Bool(b) => {
                qb.push_bind(i64::from(*b));
            }
        }
    }
}

/// Listing request for one entry type
#[derive(Debug, Clone, PartialEq)]
pub struct EntryQuery {
    pub entry_type: EntryType,
    pub filters: Vec<ContentFilter>,
    pub tag: Option<String>,
    pub limit: usize,
}

impl EntryQuery {
    pub fn new(entry_type: EntryType) -> Self {
        Self {
            entry_type,
            filters: Vec::new(),
            tag: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn filter(mut self, filter: ContentFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the row limit, clamped to `1..=MAX_LIMIT`
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = clamp_limit(limit);
        self
    }

    /// Append the `WHERE` clause for this query
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE type = ");
        qb.push_bind(self.entry_type.as_str());

        for filter in &self.filters {
            qb.push(" AND ");
            filter.push_predicate(qb);
        }

        if let Some(tag) = &self.tag {
            qb.push(" AND uuid IN (SELECT entry_uuid FROM entry_tags WHERE tag = ");
            qb.push_bind(tag.clone());
            qb.push(")");
        }
    }
}

/// Clamp a requested row count to `1..=MAX_LIMIT`
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(50), 50);
        assert_eq!(clamp_limit(500), MAX_LIMIT);
    }

    #[test]
    fn test_default_query() {
        let query = EntryQuery::new(EntryType::Query);
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert!(query.filters.is_empty());
        assert!(query.tag.is_none());
    }

    #[test]
    fn test_push_where_renders_all_predicates() {
        let query = EntryQuery::new(EntryType::Request)
            .filter(ContentFilter::new(
                "method",
                Matcher::ExactIgnoreCase,
                FilterValue::Text("get".to_string()),
            ))
            .filter(ContentFilter::new(
                "response_status",
                Matcher::NumberEq,
                FilterValue::Integer(500),
            ))
            .tag("slow");

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT uuid FROM entries");
        query.push_where(&mut qb);
        let sql = qb.sql();

        assert!(sql.contains("WHERE type = ?"));
        assert!(sql.contains("LOWER(json_extract(content, ?)) = LOWER(?)"));
        assert!(sql.contains("CAST(json_extract(content, ?) AS INTEGER) = ?"));
        assert!(sql.contains("SELECT entry_uuid FROM entry_tags WHERE tag = ?"));
    }

    #[test]
    fn test_contains_is_case_insensitive_substring() {
        let filter = ContentFilter::new(
            "sql",
            Matcher::Contains,
            FilterValue::Text("Users".to_string()),
        );

        let mut qb = QueryBuilder::<Sqlite>::new("");
        filter.push_predicate(&mut qb);

        assert_eq!(
            qb.sql(),
            "INSTR(LOWER(CAST(json_extract(content, ?) AS TEXT)), LOWER(?)) > 0"
        );
        assert_eq!(filter.json_path(), "$.sql");
    }
}
