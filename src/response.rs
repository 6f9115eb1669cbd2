//! Backend response shapes decoded from `_search` and `_search/scroll`.

use serde::Deserialize;

use crate::document::ResourceDocument;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: Option<String>,
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
    pub hits: Hits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hits {
    pub total: Total,
    #[serde(default)]
    pub max_score: Option<f64>,
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Total {
    pub value: u64,
    #[serde(default)]
    pub relation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source")]
    pub source: ResourceDocument,
}

impl SearchResponse {
    pub fn total(&self) -> u64 {
        self.hits.total.value
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceDocument> {
        self.hits.hits.iter().map(|h| &h.source)
    }

    pub fn into_resources(self) -> Vec<ResourceDocument> {
        self.hits.hits.into_iter().map(|h| h.source).collect()
    }
}
