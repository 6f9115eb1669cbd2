//! Thin request/response adapter over the search backend (§4.2).

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cat::CatIndicesParts;
use elasticsearch::http::transport::{SingleNodeConnectionPool, Transport, TransportBuilder};
use elasticsearch::indices::IndicesCreateParts;
use elasticsearch::{DeleteByQueryParts, DeleteParts, Elasticsearch, IndexParts, ScrollParts, SearchParts};
use serde_json::Value;

use crate::config::EsStorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::response::SearchResponse;

const SCROLL_KEEPALIVE: &str = "1m";
const SCROLL_PAGE_SIZE: i64 = 5000;

/// Adapter boundary between the storage layer and a concrete search backend.
///
/// Storage/compiler code depends on this trait, never on the `elasticsearch`
/// client directly — tests substitute an in-memory fake here.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn search(&self, indices: &[&str], query: &Value) -> StorageResult<SearchResponse>;

    /// Opens a scroll over `indices` and returns every page until the
    /// backend reports an empty one, clearing the scroll when done.
    async fn search_all(&self, indices: &[&str], query: &Value) -> StorageResult<Vec<SearchResponse>>;

    async fn scroll_next(&self, scroll_id: &str) -> StorageResult<SearchResponse>;

    async fn clear_scroll(&self, scroll_id: &str) -> StorageResult<()>;

    async fn delete_by_query(&self, indices: &[&str], query: &Value) -> StorageResult<()>;

    async fn delete_by_id(&self, index: &str, id: &str) -> StorageResult<()>;

    async fn upsert(&self, index: &str, id: &str, doc: &Value) -> StorageResult<()>;

    /// Creates `index` with the given mapping body. A "resource already
    /// exists" error is swallowed (§3 invariant 5).
    async fn create_index(&self, index: &str, mapping: &Value) -> StorageResult<()>;

    async fn list_indices(&self) -> StorageResult<Vec<String>>;
}

/// `Gateway` implementation backed by the official `elasticsearch` client.
pub struct ElasticsearchGateway {
    client: Elasticsearch,
}

impl ElasticsearchGateway {
    pub fn new(config: &EsStorageConfig) -> StorageResult<Self> {
        let address = config
            .addresses
            .first()
            .ok_or_else(|| StorageError::Internal("no Elasticsearch addresses configured".to_string()))?;
        let url = address
            .parse()
            .map_err(|e| StorageError::Internal(format!("invalid Elasticsearch address {address}: {e}")))?;

        let pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(pool);
        if config.has_credentials() {
            builder = builder.auth(Credentials::Basic(config.username.clone(), config.password.clone()));
        }
        let transport = builder
            .build()
            .map_err(|e| StorageError::Internal(format!("failed to build Elasticsearch transport: {e}")))?;

        Ok(Self {
            client: Elasticsearch::new(transport),
        })
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self {
            client: Elasticsearch::new(transport),
        }
    }

    async fn decode_search_response(response: elasticsearch::http::response::Response) -> StorageResult<SearchResponse> {
        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        response.json::<SearchResponse>().await.map_err(StorageError::from)
    }
}

#[async_trait]
impl Gateway for ElasticsearchGateway {
    async fn search(&self, indices: &[&str], query: &Value) -> StorageResult<SearchResponse> {
        let response = self
            .client
            .search(SearchParts::Index(indices))
            .body(query)
            .send()
            .await?;
        Self::decode_search_response(response).await
    }

    async fn search_all(&self, indices: &[&str], query: &Value) -> StorageResult<Vec<SearchResponse>> {
        let mut pages = Vec::new();

        let response = self
            .client
            .search(SearchParts::Index(indices))
            .scroll(SCROLL_KEEPALIVE)
            .size(SCROLL_PAGE_SIZE)
            .body(query)
            .send()
            .await?;

        let first = Self::decode_search_response(response).await?;
        let mut scroll_id = first.scroll_id.clone();
        pages.push(first);

        while let Some(id) = scroll_id.clone() {
            let next = self.scroll_next(&id).await?;
            if next.hits.hits.is_empty() {
                break;
            }
            scroll_id = next.scroll_id.clone();
            pages.push(next);
        }

        if let Some(id) = scroll_id {
            self.clear_scroll(&id).await?;
        }

        Ok(pages)
    }

    async fn scroll_next(&self, scroll_id: &str) -> StorageResult<SearchResponse> {
        let body = serde_json::json!({ "scroll": SCROLL_KEEPALIVE, "scroll_id": scroll_id });
        let response = self
            .client
            .scroll(ScrollParts::None)
            .body(body)
            .send()
            .await?;
        Self::decode_search_response(response).await
    }

    async fn clear_scroll(&self, scroll_id: &str) -> StorageResult<()> {
        let body = serde_json::json!({ "scroll_id": [scroll_id] });
        self.client
            .clear_scroll(elasticsearch::ClearScrollParts::None)
            .body(body)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_by_query(&self, indices: &[&str], query: &Value) -> StorageResult<()> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(indices))
            .body(serde_json::json!({ "query": query }))
            .send()
            .await?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn delete_by_id(&self, index: &str, id: &str) -> StorageResult<()> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .send()
            .await?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn upsert(&self, index: &str, id: &str, doc: &Value) -> StorageResult<()> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(doc)
            .send()
            .await?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> StorageResult<()> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(mapping)
            .send()
            .await?;

        let status = response.status_code();
        if status.is_success() {
            return Ok(());
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let is_already_exists = body["error"]["type"]
            .as_str()
            .map(|t| t == "resource_already_exists_exception")
            .unwrap_or(false);
        if is_already_exists {
            tracing::debug!(index, "index already exists, treating as success");
            return Ok(());
        }

        Err(StorageError::Backend {
            status: status.as_u16(),
            body: body.to_string(),
        })
    }

    async fn list_indices(&self) -> StorageResult<Vec<String>> {
        let response = self
            .client
            .cat()
            .indices(CatIndicesParts::None)
            .send()
            .await?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(StorageError::from)?;
        Ok(parse_cat_indices(&text))
    }
}

/// Parses the plain-text `_cat/indices` table, taking column 3 (index 2) as
/// the index name, matching the original `ListIndex`.
fn parse_cat_indices(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split_whitespace().nth(2).map(str::to_string))
        .collect()
}
