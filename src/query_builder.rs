//! Assembles expressions plus pagination/sort/source-projection into one
//! Elasticsearch `_search` body.

use serde_json::{json, Value};

use crate::expr::{Expression, LogicalRole};

/// A sort directive: `(path, descending)`.
#[derive(Debug, Clone)]
pub struct SortField {
    pub path: String,
    pub descending: bool,
}

/// Mutable accumulator for one query. Not reused across calls — construct a
/// fresh builder per `build()`.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    expressions: Vec<Expression>,
    size: Option<i64>,
    from: Option<i64>,
    source: Option<Vec<String>>,
    sort: Vec<SortField>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expression(&mut self, expr: Expression) -> &mut Self {
        self.expressions.push(expr);
        self
    }

    pub fn set_size(&mut self, n: i64) -> &mut Self {
        self.size = Some(n);
        self
    }

    pub fn set_from(&mut self, n: i64) -> &mut Self {
        self.from = Some(n);
        self
    }

    pub fn set_source(&mut self, paths: Vec<String>) -> &mut Self {
        self.source = Some(paths);
        self
    }

    pub fn set_sort(&mut self, sort: Vec<SortField>) -> &mut Self {
        self.sort = sort;
        self
    }

    /// Partitions expressions by logical role into `must`/`must_not`/`should`
    /// arrays (§4.4), omitting empty arrays, and assembles the request body.
    pub fn build(&self) -> Value {
        let mut must = Vec::new();
        let mut must_not = Vec::new();
        let mut should = Vec::new();

        for expr in &self.expressions {
            let fragment = expr.to_query_fragment();
            match expr.role() {
                LogicalRole::Must => must.push(fragment),
                LogicalRole::MustNot | LogicalRole::ShouldNot => must_not.push(fragment),
                LogicalRole::Should => should.push(fragment),
            }
        }

        let mut bool_query = serde_json::Map::new();
        if !must.is_empty() {
            bool_query.insert("must".to_string(), json!(must));
        }
        if !must_not.is_empty() {
            bool_query.insert("must_not".to_string(), json!(must_not));
        }
        if !should.is_empty() {
            bool_query.insert("should".to_string(), json!(should));
        }

        let mut body = serde_json::Map::new();
        body.insert("query".to_string(), json!({ "bool": bool_query }));

        if let Some(size) = self.size {
            if size >= 0 {
                body.insert("size".to_string(), json!(size));
            }
        }
        if let Some(from) = self.from {
            if from >= 0 {
                body.insert("from".to_string(), json!(from));
            }
        }
        if let Some(source) = &self.source {
            body.insert("_source".to_string(), json!(source));
        }
        if !self.sort.is_empty() {
            let sort = self
                .sort
                .iter()
                .map(|s| json!({ s.path.clone(): { "order": if s.descending { "desc" } else { "asc" } } }))
                .collect::<Vec<_>>();
            body.insert("sort".to_string(), json!(sort));
        }

        Value::Object(body)
    }
}
