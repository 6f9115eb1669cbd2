//! In-memory `Gateway` fake used by integration tests, standing in for a
//! live Elasticsearch cluster (none is available in this test environment).

use std::sync::Mutex;

use async_trait::async_trait;
use clusterpedia_es_storage::document::RESOURCE_ALIAS;
use clusterpedia_es_storage::error::StorageResult;
use clusterpedia_es_storage::gateway::Gateway;
use clusterpedia_es_storage::response::{Hit, Hits, SearchResponse, Total};
use serde_json::Value;

struct StoredDoc {
    index: String,
    id: String,
    doc: Value,
}

#[derive(Default)]
pub struct FakeGateway {
    docs: Mutex<Vec<StoredDoc>>,
    created_indices: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching_docs(&self, indices: &[&str]) -> Vec<Value> {
        let search_all = indices.contains(&RESOURCE_ALIAS);
        self.docs
            .lock()
            .unwrap()
            .iter()
            .filter(|stored| search_all || indices.contains(&stored.index.as_str()))
            .map(|stored| stored.doc.clone())
            .collect()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn search(&self, indices: &[&str], query: &Value) -> StorageResult<SearchResponse> {
        let candidates = self.matching_docs(indices);
        let matched: Vec<Value> = candidates
            .into_iter()
            .filter(|doc| matches_query(doc, query))
            .collect();

        let total = matched.len() as u64;
        let from = query.get("from").and_then(Value::as_i64).unwrap_or(0).max(0) as usize;
        let size = query.get("size").and_then(Value::as_i64).unwrap_or(total as i64).max(0) as usize;

        let page: Vec<Value> = matched.into_iter().skip(from).take(size).collect();
        let hits = page
            .into_iter()
            .map(|doc| {
                let source = serde_json::from_value(doc).expect("fixture documents must deserialize");
                Hit {
                    index: String::new(),
                    id: String::new(),
                    score: None,
                    source,
                }
            })
            .collect();

        Ok(SearchResponse {
            scroll_id: None,
            took: 0,
            timed_out: false,
            hits: Hits {
                total: Total {
                    value: total,
                    relation: "eq".to_string(),
                },
                max_score: None,
                hits,
            },
        })
    }

    async fn search_all(&self, indices: &[&str], query: &Value) -> StorageResult<Vec<SearchResponse>> {
        Ok(vec![self.search(indices, query).await?])
    }

    async fn scroll_next(&self, _scroll_id: &str) -> StorageResult<SearchResponse> {
        Ok(SearchResponse {
            scroll_id: None,
            took: 0,
            timed_out: false,
            hits: Hits {
                total: Total { value: 0, relation: "eq".to_string() },
                max_score: None,
                hits: Vec::new(),
            },
        })
    }

    async fn clear_scroll(&self, _scroll_id: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn delete_by_query(&self, indices: &[&str], query: &Value) -> StorageResult<()> {
        let mut docs = self.docs.lock().unwrap();
        let search_all = indices.contains(&RESOURCE_ALIAS);
        docs.retain(|stored| {
            let in_scope = search_all || indices.contains(&stored.index.as_str());
            !(in_scope && matches_query(&stored.doc, query))
        });
        Ok(())
    }

    async fn delete_by_id(&self, index: &str, id: &str) -> StorageResult<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.retain(|stored| !(stored.index == index && stored.id == id));
        Ok(())
    }

    async fn upsert(&self, index: &str, id: &str, doc: &Value) -> StorageResult<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.retain(|stored| !(stored.index == index && stored.id == id));
        docs.push(StoredDoc {
            index: index.to_string(),
            id: id.to_string(),
            doc: doc.clone(),
        });
        Ok(())
    }

    async fn create_index(&self, index: &str, _mapping: &Value) -> StorageResult<()> {
        let mut indices = self.created_indices.lock().unwrap();
        if !indices.contains(&index.to_string()) {
            indices.push(index.to_string());
        }
        Ok(())
    }

    async fn list_indices(&self) -> StorageResult<Vec<String>> {
        Ok(self.created_indices.lock().unwrap().clone())
    }
}

/// Accepts any of the three shapes a query fragment shows up in across this
/// fake's callers: a full search body (`{"query": {"bool": {...}}}`), a bare
/// bool query (`{"bool": {...}}`), or a single clause (`{"term": {...}}`).
fn matches_query(doc: &Value, query: &Value) -> bool {
    if let Some(nested) = query.get("query") {
        return matches_query(doc, nested);
    }
    if let Some(bool_query) = query.get("bool") {
        return matches_bool_query(doc, bool_query);
    }
    matches_single_clause(doc, query)
}

fn matches_bool_query(doc: &Value, bool_query: &Value) -> bool {
    let must = bool_query.get("must").and_then(Value::as_array);
    let must_not = bool_query.get("must_not").and_then(Value::as_array);
    let should = bool_query.get("should").and_then(Value::as_array);

    if let Some(must) = must {
        if !must.iter().all(|f| matches_single_clause(doc, f)) {
            return false;
        }
    }
    if let Some(must_not) = must_not {
        if must_not.iter().any(|f| matches_single_clause(doc, f)) {
            return false;
        }
    }
    if let Some(should) = should {
        if !should.is_empty() && !should.iter().any(|f| matches_single_clause(doc, f)) {
            return false;
        }
    }
    true
}

fn matches_single_clause(doc: &Value, fragment: &Value) -> bool {
    if let Some(term) = fragment.get("term") {
        let (path, value) = term.as_object().and_then(|o| o.iter().next()).unwrap();
        let wanted = value_to_string(value);
        return path_values(doc, path).iter().any(|v| v == &wanted);
    }
    if let Some(terms) = fragment.get("terms") {
        let (path, values) = terms.as_object().and_then(|o| o.iter().next()).unwrap();
        let wanted: Vec<String> = values.as_array().unwrap().iter().map(value_to_string).collect();
        return path_values(doc, path).iter().any(|v| wanted.contains(v));
    }
    if let Some(fuzzy) = fragment.get("fuzzy") {
        let (path, values) = fuzzy.as_object().and_then(|o| o.iter().next()).unwrap();
        let needles: Vec<String> = values.as_array().unwrap().iter().map(value_to_string).collect();
        return path_values(doc, path)
            .iter()
            .any(|v| needles.iter().any(|n| v.contains(n.as_str())));
    }
    if let Some(range) = fragment.get("range") {
        let (path, bounds) = range.as_object().and_then(|o| o.iter().next()).unwrap();
        let actual = path_values(doc, path).into_iter().next().and_then(|v| v.parse::<i64>().ok());
        let Some(actual) = actual else { return false };
        if let Some(gte) = bounds.get("gte").and_then(Value::as_i64) {
            if actual < gte {
                return false;
            }
        }
        if let Some(lte) = bounds.get("lte").and_then(Value::as_i64) {
            if actual > lte {
                return false;
            }
        }
        return true;
    }
    if let Some(exists) = fragment.get("exists") {
        let field = exists["field"].as_str().unwrap();
        return !path_values(doc, field).is_empty();
    }
    false
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolves a dotted path against a stored `ResourceDocument` JSON value,
/// special-casing the handful of paths that don't translate cleanly into a
/// JSON pointer (the cluster annotation key itself contains dots and a
/// slash; owner references are an array).
fn path_values(doc: &Value, path: &str) -> Vec<String> {
    use clusterpedia_es_storage::paths;

    if path == paths::CLUSTER_PATH {
        return doc
            .pointer("/object/metadata/annotations")
            .and_then(|a| a.get("shadow.clusterpedia.io/cluster-name"))
            .map(|v| vec![value_to_string(v)])
            .unwrap_or_default();
    }
    if path == paths::OWNER_REFERENCE_UID_PATH {
        return doc
            .pointer("/object/metadata/ownerReferences")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|o| o.get("uid")).map(value_to_string).collect())
            .unwrap_or_default();
    }
    if path == paths::UID_PATH {
        return doc
            .pointer("/object/metadata/uid")
            .map(|v| vec![value_to_string(v)])
            .unwrap_or_default();
    }
    if path == paths::LABEL_PATH {
        return doc
            .pointer("/object/metadata/labels")
            .and_then(Value::as_object)
            .map(|m| m.values().map(value_to_string).collect())
            .unwrap_or_default();
    }
    if path == "group" || path == "version" || path == "resource" || path == "name" || path == "namespace" {
        return doc.get(path).map(|v| vec![value_to_string(v)]).unwrap_or_default();
    }
    if let Some(rest) = path.strip_prefix("object.") {
        let pointer = format!("/object/{}", rest.replace('.', "/"));
        return doc.pointer(&pointer).map(|v| vec![value_to_string(v)]).unwrap_or_default();
    }
    Vec::new()
}
