//! Per-resource index lifecycle, alias management, and fleet-wide cluster
//! operations (§4.7).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::collection::CollectionResourceStorage;
use crate::document::{index_name, CollectionResourceType, RESOURCE_ALIAS};
use crate::error::{StorageError, StorageResult};
use crate::expr::{terms, LogicalRole};
use crate::gateway::Gateway;
use crate::gvr::GroupVersionResource;
use crate::paths;
use crate::query_builder::QueryBuilder;
use crate::schema;
use crate::storage::ResourceStorage;

const RESOURCE_CONFIGMAP: &str = "configmaps";

/// A per-cluster, per-GVR resource-version snapshot: `namespace/name` (or
/// bare `name` for cluster-scoped resources) → resourceVersion.
pub type ResourceVersionsByGvr = HashMap<GroupVersionResource, HashMap<String, String>>;

/// A named set of resource types that union into one collection resource
/// (original package-level `collectionResources` registry).
#[derive(Debug, Clone)]
pub struct CollectionResourceDefinition {
    pub name: String,
    pub resource_types: Vec<CollectionResourceType>,
}

/// Builds and tracks `ResourceStorage`/`CollectionResourceStorage` instances
/// for one backend, and owns the cluster-wide maintenance operations.
pub struct StorageFactory {
    gateway: Arc<dyn Gateway>,
    collection_resources: Vec<CollectionResourceDefinition>,
}

impl StorageFactory {
    /// `collection_resources` is the registry the original keeps as a
    /// package-level variable; here it's passed in at construction time
    /// instead, since a global mutable registry isn't idiomatic Rust.
    pub fn new(gateway: Arc<dyn Gateway>, collection_resources: Vec<CollectionResourceDefinition>) -> Self {
        Self {
            gateway,
            collection_resources,
        }
    }

    /// Returns the registered collection-resource definitions.
    pub fn get_collection_resources(&self) -> &[CollectionResourceDefinition] {
        &self.collection_resources
    }

    /// Computes the index name, obtains the per-kind mapping, creates the
    /// index (tolerating "already exists"), and returns a bound storage.
    pub async fn new_resource_storage(&self, gvr: GroupVersionResource) -> StorageResult<ResourceStorage> {
        let gr = gvr.group_resource();
        let name = index_name(&gr);
        let mapping = schema::mapping_for(&gr);
        self.gateway.create_index(&name, &mapping).await?;

        let extract_config = if gr.resource == RESOURCE_CONFIGMAP {
            vec!["data".to_string()]
        } else {
            Vec::new()
        };

        Ok(ResourceStorage::new(self.gateway.clone(), gvr, extract_config))
    }

    /// Returns a read-only aggregator for a declared set of resource types.
    pub fn new_collection_resource_storage(&self, resource_types: Vec<CollectionResourceType>) -> CollectionResourceStorage {
        CollectionResourceStorage::new(self.gateway.clone(), RESOURCE_ALIAS, resource_types)
    }

    /// Scrolls the entire alias for one cluster, returning a nested map
    /// `GVR → {qualified-name → resourceVersion}`. A 404 is treated as an
    /// empty map, not an error.
    pub async fn get_resource_versions(&self, cluster: &str) -> StorageResult<ResourceVersionsByGvr> {
        let mut builder = QueryBuilder::new();
        builder.add_expression(terms(paths::CLUSTER_PATH, vec![cluster.to_string()], LogicalRole::Must));
        builder.set_source(vec![
            paths::GROUP_PATH.to_string(),
            paths::VERSION_PATH.to_string(),
            paths::RESOURCE_PATH.to_string(),
            "namespace".to_string(),
            "name".to_string(),
            "resource_version".to_string(),
        ]);

        let pages = match self.gateway.search_all(&[RESOURCE_ALIAS], &builder.build()).await {
            Ok(pages) => pages,
            Err(StorageError::Backend { status: 404, .. }) => return Ok(HashMap::new()),
            Err(err) => return Err(err),
        };

        let mut versions: ResourceVersionsByGvr = HashMap::new();
        for page in pages {
            for doc in page.into_resources() {
                let gvr = GroupVersionResource::new(doc.group, doc.version, doc.resource);
                let key = match &doc.namespace {
                    Some(ns) if !ns.is_empty() => format!("{ns}/{}", doc.name),
                    _ => doc.name.clone(),
                };
                versions.entry(gvr).or_default().insert(key, doc.resource_version);
            }
        }
        Ok(versions)
    }

    /// Lists all indices, retains those prefixed `clusterpedia-`, and issues
    /// `deleteByQuery(cluster-term, targetIndices…)`.
    pub async fn clean_cluster(&self, cluster: &str) -> StorageResult<()> {
        let indices = self.gateway.list_indices().await?;
        let targets: Vec<&str> = indices
            .iter()
            .filter(|name| name.starts_with(crate::document::INDEX_PREFIX))
            .map(String::as_str)
            .collect();
        if targets.is_empty() {
            tracing::debug!(cluster, "no clusterpedia indices found, nothing to clean");
            return Ok(());
        }

        tracing::info!(cluster, indices = targets.len(), "cleaning cluster across indices");
        let query = json!({ "term": { paths::CLUSTER_PATH: cluster } });
        self.gateway.delete_by_query(&targets, &query).await
    }

    /// Deletes documents matching `(group, version, resource, cluster)` from
    /// the single per-resource index.
    pub async fn clean_cluster_resource(&self, cluster: &str, gvr: &GroupVersionResource) -> StorageResult<()> {
        let index = index_name(&gvr.group_resource());
        let mut builder = QueryBuilder::new();
        builder.add_expression(terms(paths::GROUP_PATH, vec![gvr.group.clone()], LogicalRole::Must));
        builder.add_expression(terms(paths::VERSION_PATH, vec![gvr.version.clone()], LogicalRole::Must));
        builder.add_expression(terms(paths::RESOURCE_PATH, vec![gvr.resource.clone()], LogicalRole::Must));
        builder.add_expression(terms(paths::CLUSTER_PATH, vec![cluster.to_string()], LogicalRole::Must));

        let query = builder.build()["query"].clone();
        self.gateway.delete_by_query(&[&index], &query).await
    }

    /// No-op hook invoked before a cluster is onboarded; kept as an explicit
    /// method so callers driving multi-cluster onboarding have a stable
    /// surface even though this backend needs no preparation step.
    pub fn prepare_cluster(&self, _cluster: &str) {}

    pub fn get_supported_request_verbs(&self) -> &'static [&'static str] {
        &["get", "list"]
    }
}
