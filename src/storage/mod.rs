//! CRUD surface per `(group, resource)`: upsert, get, list, delete, owner
//! closure, and list decoding (§4.6).

mod decode;
mod owner;

pub use decode::{paginate, ResourceList};
pub use owner::get_owner_ids;

use std::collections::HashMap;
use std::sync::Arc;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::document::{index_name, ResourceDocument, RESOURCE_ALIAS};
use crate::error::{StorageError, StorageResult};
use crate::gateway::Gateway;
use crate::gvr::GroupVersionResource;
use crate::listoptions::{self, ListOptions};

const FULL_TEXT_OBJECT_KEY: &str = "fullTextObject";

/// CRUD + list storage bound to one `(group, version, resource)`.
pub struct ResourceStorage {
    gateway: Arc<dyn Gateway>,
    gvr: GroupVersionResource,
    index_name: String,
    resource_alias: String,
    /// Dotted paths extracted from the object into `custom` on upsert
    /// (`["data"]` for ConfigMap-bound storages).
    extract_config: Vec<String>,
}

impl ResourceStorage {
    pub fn new(gateway: Arc<dyn Gateway>, gvr: GroupVersionResource, extract_config: Vec<String>) -> Self {
        let index_name = index_name(&gvr.group_resource());
        Self {
            gateway,
            gvr,
            index_name,
            resource_alias: RESOURCE_ALIAS.to_string(),
            extract_config,
        }
    }

    pub fn group_version_resource(&self) -> &GroupVersionResource {
        &self.gvr
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub async fn create(&self, cluster: &str, object: Value) -> StorageResult<()> {
        self.upsert(cluster, object).await
    }

    pub async fn update(&self, cluster: &str, object: Value) -> StorageResult<()> {
        self.upsert(cluster, object).await
    }

    /// Composes the resource document and indexes it keyed by UID (§4.6 upsert).
    async fn upsert(&self, cluster: &str, mut object: Value) -> StorageResult<()> {
        stamp_cluster_annotation(&mut object, cluster);

        let kind = object
            .get("kind")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StorageError::InvalidArgument("object is missing a kind".to_string()))?
            .to_string();

        let meta = object_meta(&object);
        let uid = meta
            .uid
            .filter(|u| !u.is_empty())
            .ok_or_else(|| StorageError::InvalidArgument("object is missing metadata.uid".to_string()))?;

        let name = meta.name.unwrap_or_default();
        let namespace = meta.namespace;
        let resource_version = meta.resource_version.unwrap_or_default();

        let custom = self.extract_custom(&object);

        let doc = ResourceDocument {
            group: self.gvr.group.clone(),
            version: self.gvr.version.clone(),
            resource: self.gvr.resource.clone(),
            kind,
            name,
            namespace,
            resource_version,
            object,
            custom: if custom.is_empty() { None } else { Some(custom) },
        };

        let body = serde_json::to_value(&doc)?;
        self.gateway.upsert(&self.index_name, &uid, &body).await
    }

    /// Extracts configured sub-trees plus, when enabled, the full object, as
    /// serialized JSON strings. Extraction failures are swallowed — this is
    /// best-effort auxiliary data, never a write failure.
    fn extract_custom(&self, object: &Value) -> HashMap<String, Value> {
        let mut custom = HashMap::new();

        for path in &self.extract_config {
            if let Some(sub_tree) = extract_dotted_path(object, path) {
                if let Ok(serialized) = serde_json::to_string(sub_tree) {
                    custom.insert(path.clone(), Value::String(serialized));
                }
            }
        }

        if cfg!(feature = "full-text-search") {
            if let Ok(serialized) = serde_json::to_string(object) {
                custom.insert(FULL_TEXT_OBJECT_KEY.to_string(), Value::String(serialized));
            }
        }

        custom
    }

    /// Deletes by UID. An object with an empty UID is treated as stale/dirty
    /// input and silently ignored (§4.6, §7).
    pub async fn delete(&self, object: &Value) -> StorageResult<()> {
        let uid = object_meta(object).uid.unwrap_or_default();
        if uid.is_empty() {
            return Ok(());
        }
        self.gateway.delete_by_id(&self.index_name, &uid).await
    }

    /// Compiles a fully-pinned query and returns *not-found* on zero hits.
    pub async fn get<T: DeserializeOwned>(
        &self,
        cluster: &str,
        namespace: Option<&str>,
        name: &str,
    ) -> StorageResult<T> {
        let mut opts = ListOptions {
            cluster_names: vec![cluster.to_string()],
            names: vec![name.to_string()],
            limit: 1,
            ..Default::default()
        };
        if let Some(ns) = namespace {
            opts.namespaces = vec![ns.to_string()];
        }

        let builder = listoptions::compile(&opts, &self.gvr, &[])?;
        let response = self.gateway.search(&[&self.resource_alias], &builder.build()).await?;

        let key = match namespace {
            Some(ns) => format!("{cluster}/{ns}/{name}"),
            None => format!("{cluster}//{name}"),
        };

        let hit = response
            .hits
            .hits
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound {
                key,
                resource_version: 0,
            })?;

        serde_json::from_value(hit.source.object).map_err(Into::into)
    }

    /// Builds and issues the list query, resolving owner closure first, and
    /// decodes each hit into `T`.
    pub async fn list<T: DeserializeOwned>(&self, opts: &ListOptions) -> StorageResult<ResourceList<T>> {
        let owner_ids = get_owner_ids(self.gateway.as_ref(), &self.resource_alias, opts).await?;
        let builder = listoptions::compile(opts, &self.gvr, &owner_ids)?;
        let body = builder.build();
        let from = body.get("from").and_then(Value::as_i64).unwrap_or(0);
        let limit = body.get("size").and_then(Value::as_i64).unwrap_or(0);

        let response = self.gateway.search(&[&self.resource_alias], &body).await?;
        let total = response.total();
        let objects: Vec<Value> = response.into_resources().into_iter().map(|doc| doc.object).collect();
        let page_len = objects.len();

        let (continue_token, remaining_item_count) = paginate(total, from, limit, page_len, opts.with_continue);
        let items = decode::decode_items(objects)?;

        Ok(ResourceList {
            items,
            continue_token,
            remaining_item_count,
        })
    }

    /// Always fails: watch is not implemented by this storage layer.
    pub async fn watch(&self) -> StorageResult<()> {
        Err(StorageError::MethodNotSupported("watch".to_string()))
    }
}

const CLUSTER_ANNOTATION_KEY: &str = "shadow.clusterpedia.io/cluster-name";

/// Deserializes `object.metadata` into the real apimachinery `ObjectMeta`
/// shape, defaulting when absent or malformed rather than failing outright —
/// individual fields are validated by their own callers.
fn object_meta(object: &Value) -> ObjectMeta {
    object
        .get("metadata")
        .cloned()
        .and_then(|m| serde_json::from_value(m).ok())
        .unwrap_or_default()
}

/// Stamps `object.metadata.annotations[cluster-name]` with the caller-supplied
/// `cluster`, satisfying §3 invariant 3. Always wins over whatever value the
/// object already carries — a stale annotation from a prior write to a
/// different cluster must not survive a `create`/`update` call.
fn stamp_cluster_annotation(object: &mut Value, cluster: &str) {
    let mut meta = object_meta(object);
    meta.annotations
        .get_or_insert_with(Default::default)
        .insert(CLUSTER_ANNOTATION_KEY.to_string(), cluster.to_string());

    if let Some(map) = object.as_object_mut() {
        if let Ok(meta_value) = serde_json::to_value(&meta) {
            map.insert("metadata".to_string(), meta_value);
        }
    }
}

/// Extracts the sub-tree at a dotted path, or `None` if any segment is
/// missing or not an object.
fn extract_dotted_path<'a>(object: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = object;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
