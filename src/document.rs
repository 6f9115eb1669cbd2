//! The persisted resource document shape and index-naming helpers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gvr::GroupResource;

/// Index prefix shared by every physical index and the cross-resource alias.
pub const INDEX_PREFIX: &str = "clusterpedia";

/// Shared alias every per-resource index is born into.
pub const RESOURCE_ALIAS: &str = "clusterpedia-resource";

/// Physical index name for a `(group, resource)` pair: `clusterpedia-<group>-<resource>`.
pub fn index_name(gr: &GroupResource) -> String {
    format!("{INDEX_PREFIX}-{}-{}", gr.group, gr.resource)
}

/// The canonical persisted record (§3 Resource document).
///
/// `object` carries the full resource payload (metadata, spec, data, ...).
/// `custom` holds derived projections used for auxiliary queries: extracted
/// sub-trees (serialized as JSON strings) and, when full-text search is
/// enabled, a serialized copy of the whole object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDocument {
    pub group: String,
    pub version: String,
    pub resource: String,
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "resource_version")]
    pub resource_version: String,
    pub object: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<HashMap<String, Value>>,
}

impl ResourceDocument {
    pub fn group_resource(&self) -> GroupResource {
        GroupResource {
            group: self.group.clone(),
            resource: self.resource.clone(),
        }
    }
}

/// A declared concrete type observed (or expected) inside a collection
/// resource (original `internal.CollectionResourceType`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionResourceType {
    pub group: String,
    pub version: String,
    pub resource: String,
    pub kind: String,
}

/// A read-only union of several declared resource types (original
/// `internal.CollectionResource`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionResource {
    pub resource_types: Vec<CollectionResourceType>,
    pub items: Vec<Value>,
}
