//! Owner-reference transitive-closure resolution (`GetOwnerIds`, §4.6).

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::Value;

use crate::error::{StorageError, StorageResult};
use crate::expr::{terms, LogicalRole};
use crate::gateway::Gateway;
use crate::listoptions::ListOptions;
use crate::paths;
use crate::query_builder::QueryBuilder;

const OWNER_LOOKUP_PAGE_SIZE: i64 = 500;

/// Resolves the set of owner UIDs a list query should filter
/// `object.metadata.ownerReferences.uid` against, or an empty vector when no
/// owner filter applies.
pub async fn get_owner_ids(gateway: &dyn Gateway, alias: &str, opts: &ListOptions) -> StorageResult<Vec<String>> {
    if opts.cluster_names.len() != 1 {
        return Ok(Vec::new());
    }
    let cluster = &opts.cluster_names[0];

    if let Some(uid) = &opts.owner_uid {
        return get_uids(gateway, alias, cluster, vec![uid.clone()], opts.owner_seniority).await;
    }

    if let Some(name) = &opts.owner_name {
        let top = get_uids_by_name(gateway, alias, cluster, name, opts).await?;
        return get_uids(gateway, alias, cluster, top, opts.owner_seniority).await;
    }

    Ok(Vec::new())
}

/// Resolves the UIDs of the "top" owners by name, scoped to cluster (and
/// namespace / owner group-resource when given).
async fn get_uids_by_name(
    gateway: &dyn Gateway,
    alias: &str,
    cluster: &str,
    owner_name: &str,
    opts: &ListOptions,
) -> StorageResult<Vec<String>> {
    let mut builder = QueryBuilder::new();
    builder.add_expression(terms(paths::CLUSTER_PATH, vec![cluster.to_string()], LogicalRole::Must));
    builder.add_expression(terms("name", vec![owner_name.to_string()], LogicalRole::Must));
    if !opts.namespaces.is_empty() {
        builder.add_expression(terms("namespace", opts.namespaces.clone(), LogicalRole::Must));
    }
    if !opts.owner_group_resource.is_empty() {
        if !opts.owner_group_resource.group.is_empty() {
            builder.add_expression(terms(
                paths::GROUP_PATH,
                vec![opts.owner_group_resource.group.clone()],
                LogicalRole::Must,
            ));
        }
        if !opts.owner_group_resource.resource.is_empty() {
            builder.add_expression(terms(
                paths::RESOURCE_PATH,
                vec![opts.owner_group_resource.resource.clone()],
                LogicalRole::Must,
            ));
        }
    }
    builder.set_size(OWNER_LOOKUP_PAGE_SIZE);
    builder.set_source(vec![paths::UID_PATH.to_string()]);

    let response = gateway.search(&[alias], &builder.build()).await?;
    extract_uids(response.hits.hits.iter().map(|h| &h.source.object))
}

/// Walks the ownership graph upward `seniority` times. Each hop searches
/// `alias` for documents whose `ownerReferences.uid` is in the current UID
/// set and replaces the set with the UIDs found.
async fn get_uids(
    gateway: &dyn Gateway,
    alias: &str,
    cluster: &str,
    mut uids: Vec<String>,
    seniority: u32,
) -> StorageResult<Vec<String>> {
    if seniority == 0 {
        return Ok(uids);
    }

    for _ in 0..seniority {
        if uids.is_empty() {
            break;
        }
        let mut builder = QueryBuilder::new();
        builder.add_expression(terms(
            paths::OWNER_REFERENCE_UID_PATH,
            uids.clone(),
            LogicalRole::Must,
        ));
        builder.add_expression(terms(paths::CLUSTER_PATH, vec![cluster.to_string()], LogicalRole::Must));
        builder.set_size(OWNER_LOOKUP_PAGE_SIZE);
        builder.set_source(vec![paths::UID_PATH.to_string()]);

        let response = gateway.search(&[alias], &builder.build()).await?;
        let next = extract_uids(response.hits.hits.iter().map(|h| &h.source.object))?;
        tracing::debug!(hop_in = uids.len(), hop_out = next.len(), "owner closure hop");
        uids = next;
    }

    Ok(uids)
}

fn extract_uids<'a>(objects: impl Iterator<Item = &'a Value>) -> StorageResult<Vec<String>> {
    objects
        .map(|object| {
            let meta: ObjectMeta = object
                .get("metadata")
                .cloned()
                .and_then(|m| serde_json::from_value(m).ok())
                .unwrap_or_default();
            meta.uid
                .filter(|u| !u.is_empty())
                .ok_or_else(|| StorageError::Internal(format!("extract uid failure, targetObject is {object}")))
        })
        .collect()
}
