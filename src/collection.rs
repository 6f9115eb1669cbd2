//! Read-only aggregator across a declared set of resource types (§4.7).

use std::collections::HashSet;
use std::sync::Arc;

use crate::document::{CollectionResource, CollectionResourceType};
use crate::error::StorageResult;
use crate::expr::{terms, LogicalRole};
use crate::gateway::Gateway;
use crate::listoptions::ListOptions;
use crate::paths;
use crate::query_builder::QueryBuilder;

/// For a declared set of resource types, issues a single `should`-only query
/// across the shared alias and yields the union, collecting the set of
/// concrete resource types actually observed.
pub struct CollectionResourceStorage {
    gateway: Arc<dyn Gateway>,
    alias: String,
    resource_types: Vec<CollectionResourceType>,
}

impl CollectionResourceStorage {
    pub fn new(gateway: Arc<dyn Gateway>, alias: impl Into<String>, resource_types: Vec<CollectionResourceType>) -> Self {
        Self {
            gateway,
            alias: alias.into(),
            resource_types,
        }
    }

    pub async fn get(&self, opts: &ListOptions) -> StorageResult<CollectionResource> {
        let mut builder = QueryBuilder::new();
        for rt in &self.resource_types {
            builder.add_expression(terms(paths::GROUP_PATH, vec![rt.group.clone()], LogicalRole::Should));
            if !rt.resource.is_empty() {
                builder.add_expression(terms(paths::RESOURCE_PATH, vec![rt.resource.clone()], LogicalRole::Should));
            }
            if !rt.version.is_empty() {
                builder.add_expression(terms(paths::VERSION_PATH, vec![rt.version.clone()], LogicalRole::Should));
            }
        }
        apply_list_options(&mut builder, opts);

        let response = self.gateway.search(&[&self.alias], &builder.build()).await?;

        let mut seen = HashSet::new();
        let mut observed_types = Vec::new();
        let mut items = Vec::with_capacity(response.hits.hits.len());

        for doc in response.into_resources() {
            let observed = CollectionResourceType {
                group: doc.group.clone(),
                version: doc.version.clone(),
                resource: doc.resource.clone(),
                kind: doc.kind.clone(),
            };
            if seen.insert(observed.clone()) {
                observed_types.push(observed);
            }
            items.push(doc.object);
        }

        Ok(CollectionResource {
            resource_types: observed_types,
            items,
        })
    }
}

/// Layers pagination/sort on top of the should-only type union, reusing the
/// same translation rules the per-resource compiler uses (minus type
/// pinning, which the should-clauses above already express).
fn apply_list_options(builder: &mut QueryBuilder, opts: &ListOptions) {
    if !opts.cluster_names.is_empty() {
        builder.add_expression(terms(paths::CLUSTER_PATH, opts.cluster_names.clone(), LogicalRole::Must));
    }
    if !opts.namespaces.is_empty() {
        builder.add_expression(terms("namespace", opts.namespaces.clone(), LogicalRole::Must));
    }
    if !opts.names.is_empty() {
        builder.add_expression(terms("name", opts.names.clone(), LogicalRole::Must));
    }

    let size = if opts.limit > 0 { opts.limit } else { 500 };
    let from = opts
        .continue_token
        .as_deref()
        .and_then(|c| c.parse::<i64>().ok())
        .unwrap_or(0);
    builder.set_size(size);
    builder.set_from(from);
}
