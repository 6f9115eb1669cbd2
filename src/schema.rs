//! Per-resource index mapping generation (§4.1).

use serde_json::{json, Value};

use crate::document::RESOURCE_ALIAS;
use crate::gvr::GroupResource;

const RESOURCE_CONFIGMAP: &str = "configmaps";
const RESOURCE_SECRET: &str = "secrets";
const RESOURCE_EVENT: &str = "events";

/// Returns the create-index body for `gr`, including the alias wiring and a
/// per-kind specialized property block.
pub fn mapping_for(gr: &GroupResource) -> Value {
    json!({
        "aliases": { RESOURCE_ALIAS: {} },
        "settings": {
            "index": {
                "number_of_shards": 1,
                "auto_expand_replicas": "0-1",
                "number_of_replicas": 0
            }
        },
        "mappings": {
            "_source": { "excludes": ["custom"] },
            "properties": base_properties(gr)
        }
    })
}

fn base_properties(gr: &GroupResource) -> Value {
    let mut object_properties = serde_json::Map::new();
    object_properties.insert("name".to_string(), text_with_keyword());
    object_properties.insert("namespace".to_string(), text_with_keyword());
    object_properties.insert("resourceVersion".to_string(), text_with_keyword());
    object_properties.insert("annotations".to_string(), json!({ "type": "flattened" }));
    object_properties.insert("labels".to_string(), json!({ "type": "flattened" }));
    object_properties.insert("ownerReferences".to_string(), json!({ "type": "flattened" }));
    object_properties.insert("managedFields".to_string(), json!({ "enabled": false }));
    object_properties.insert("creationTimestamp".to_string(), date_field());
    object_properties.insert("deletionTimestamp".to_string(), date_field());

    match gr.resource.as_str() {
        RESOURCE_CONFIGMAP => {
            object_properties.insert("data".to_string(), json!({ "enabled": false }));
            object_properties.insert("binaryData".to_string(), json!({ "enabled": false }));
        }
        RESOURCE_SECRET => {
            object_properties.insert("data".to_string(), json!({ "enabled": false }));
            object_properties.insert("stringData".to_string(), json!({ "enabled": false }));
        }
        RESOURCE_EVENT => {
            object_properties.insert("involvedObject".to_string(), json!({ "type": "flattened" }));
            object_properties.insert("source".to_string(), json!({ "type": "flattened" }));
            object_properties.insert("related".to_string(), json!({ "type": "flattened" }));
            object_properties.insert("series".to_string(), json!({ "type": "flattened" }));
            object_properties.insert("firstTimestamp".to_string(), date_field());
            object_properties.insert("lastTimestamp".to_string(), date_field());
            object_properties.insert("eventTime".to_string(), date_field());
        }
        _ => {
            object_properties.insert(
                "spec".to_string(),
                json!({ "type": "flattened", "ignore_above": 256 }),
            );
        }
    }

    json!({
        "group": { "type": "keyword" },
        "version": { "type": "keyword" },
        "resource": { "type": "keyword" },
        "name": { "type": "keyword" },
        "namespace": { "type": "keyword" },
        "resource_version": { "type": "keyword" },
        "object": {
            "properties": {
                "metadata": {
                    "properties": Value::Object(object_properties)
                }
            }
        }
    })
}

fn text_with_keyword() -> Value {
    json!({
        "type": "text",
        "fields": {
            "keyword": { "type": "keyword", "ignore_above": 256 }
        }
    })
}

fn date_field() -> Value {
    json!({ "type": "date", "format": "yyyy-MM-dd'T'HH:mm:ss'Z'" })
}
