//! The expression model: typed predicate nodes compiled into Elasticsearch
//! query fragments.

use serde_json::{json, Value};

/// How an expression participates in the enclosing `bool` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalRole {
    Must,
    MustNot,
    Should,
    ShouldNot,
}

/// A predicate node: a dotted path, a value payload, and a logical role.
///
/// Expressions are value objects produced by the list-options compiler
/// (`listoptions`) and consumed once by a `QueryBuilder::build()` call.
#[derive(Debug, Clone)]
pub enum Expression {
    Terms {
        path: String,
        values: Vec<String>,
        role: LogicalRole,
    },
    Fuzzy {
        path: String,
        values: Vec<String>,
        role: LogicalRole,
    },
    Range {
        path: String,
        gte: Option<i64>,
        lte: Option<i64>,
        role: LogicalRole,
    },
    Exist {
        path: String,
        role: LogicalRole,
    },
}

impl Expression {
    pub fn role(&self) -> LogicalRole {
        match self {
            Expression::Terms { role, .. }
            | Expression::Fuzzy { role, .. }
            | Expression::Range { role, .. }
            | Expression::Exist { role, .. } => *role,
        }
    }

    /// Produces this expression's backend JSON fragment (§4.3).
    pub fn to_query_fragment(&self) -> Value {
        match self {
            Expression::Terms { path, values, .. } => json!({ "terms": { path: values } }),
            Expression::Fuzzy { path, values, .. } => json!({ "fuzzy": { path: values } }),
            Expression::Range { path, gte, lte, .. } => {
                let mut range = serde_json::Map::new();
                if let Some(gte) = gte {
                    range.insert("gte".to_string(), json!(gte));
                }
                if let Some(lte) = lte {
                    range.insert("lte".to_string(), json!(lte));
                }
                json!({ "range": { path: range } })
            }
            Expression::Exist { path, .. } => json!({ "exists": { "field": path } }),
        }
    }
}

pub fn terms(path: impl Into<String>, values: Vec<String>, role: LogicalRole) -> Expression {
    Expression::Terms {
        path: path.into(),
        values,
        role,
    }
}

pub fn fuzzy(path: impl Into<String>, values: Vec<String>, role: LogicalRole) -> Expression {
    Expression::Fuzzy {
        path: path.into(),
        values,
        role,
    }
}

pub fn range(path: impl Into<String>, gte: Option<i64>, lte: Option<i64>, role: LogicalRole) -> Expression {
    Expression::Range {
        path: path.into(),
        gte,
        lte,
        role,
    }
}

pub fn exist(path: impl Into<String>, role: LogicalRole) -> Expression {
    Expression::Exist { path: path.into(), role }
}
