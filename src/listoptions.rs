//! Translates a caller's list-options structure into query-builder
//! expressions (§4.5).

use crate::error::{StorageError, StorageResult};
use crate::expr::{fuzzy, range, terms, LogicalRole};
use crate::gvr::{GroupResource, GroupVersionResource};
use crate::paths;
use crate::query_builder::{QueryBuilder, SortField};

/// The reserved extra-label-selector key recognized as a fuzzy name filter.
pub const FUZZY_NAME_KEY: &str = "search.clusterpedia.io/fuzzy-name";

const DEFAULT_LIMIT: i64 = 500;

/// A single label or field selector requirement: `key <op> values`.
#[derive(Debug, Clone)]
pub struct SelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOperator {
    Equals,
    DoubleEquals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
    /// Any operator this compiler does not translate (e.g. `Gt`/`Lt`); such
    /// requirements are skipped, never erroring.
    Unsupported,
}

impl SelectorOperator {
    /// Maps an operator to the logical role its requirement compiles to, or
    /// `None` when the operator is silently skipped (§4.5 rule 3).
    fn role(self) -> Option<LogicalRole> {
        match self {
            SelectorOperator::Equals | SelectorOperator::DoubleEquals | SelectorOperator::Exists => {
                Some(LogicalRole::Must)
            }
            SelectorOperator::NotEquals | SelectorOperator::NotIn | SelectorOperator::DoesNotExist => {
                Some(LogicalRole::MustNot)
            }
            SelectorOperator::In | SelectorOperator::Unsupported => None,
        }
    }
}

/// A single `OrderBy` directive.
#[derive(Debug, Clone)]
pub struct OrderByField {
    pub field: String,
    pub descending: bool,
}

/// Mirrors the caller-supplied list-options structure (§4.5).
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub cluster_names: Vec<String>,
    pub namespaces: Vec<String>,
    pub names: Vec<String>,
    pub since: Option<i64>,
    pub before: Option<i64>,
    pub label_selector: Vec<SelectorRequirement>,
    pub extra_label_selector: Vec<SelectorRequirement>,
    pub enhanced_field_selector: Vec<SelectorRequirement>,
    pub owner_uid: Option<String>,
    pub owner_name: Option<String>,
    pub owner_group_resource: GroupResource,
    pub owner_seniority: u32,
    pub limit: i64,
    pub continue_token: Option<String>,
    pub with_continue: bool,
    pub order_by: Vec<OrderByField>,
}

/// Compiles `opts` plus the already-resolved owner-UID closure (§4.6) into a
/// populated query builder, scoped to `gvr`.
pub fn compile(opts: &ListOptions, gvr: &GroupVersionResource, owner_ids: &[String]) -> StorageResult<QueryBuilder> {
    let mut builder = QueryBuilder::new();

    // Rule 1: scalar set filters.
    if !opts.cluster_names.is_empty() {
        builder.add_expression(terms(paths::CLUSTER_PATH, opts.cluster_names.clone(), LogicalRole::Must));
    }
    if !opts.namespaces.is_empty() {
        builder.add_expression(terms("namespace", opts.namespaces.clone(), LogicalRole::Must));
    }
    if !opts.names.is_empty() {
        builder.add_expression(terms("name", opts.names.clone(), LogicalRole::Must));
    }

    // Rule 2: temporal window.
    if opts.since.is_some() || opts.before.is_some() {
        builder.add_expression(range(
            paths::CREATION_TIMESTAMP_PATH,
            opts.since,
            opts.before,
            LogicalRole::Must,
        ));
    }

    // Rule 3: label selector.
    for req in &opts.label_selector {
        if let Some(role) = req.operator.role() {
            builder.add_expression(terms(paths::LABEL_PATH, req.values.clone(), role));
        }
    }

    // Rule 4: extra-label selector — only the fuzzy-name key is recognized.
    for req in &opts.extra_label_selector {
        if req.key != FUZZY_NAME_KEY {
            continue;
        }
        for value in &req.values {
            builder.add_expression(fuzzy("name", vec![value.trim().to_string()], LogicalRole::Must));
        }
    }

    // Rule 5: enhanced field selector.
    for req in &opts.enhanced_field_selector {
        if is_list_indexed(&req.key) {
            return Err(StorageError::InvalidArgument(format!(
                "field selector references a list index: {}",
                req.key
            )));
        }
        if let Some(role) = req.operator.role() {
            let path = format!("{}.{}", paths::OBJECT_PATH, req.key);
            builder.add_expression(terms(path, req.values.clone(), role));
        }
    }

    // Rule 6: owner closure.
    let single_cluster = opts.cluster_names.len() == 1;
    let owner_requested = opts.owner_uid.is_some() || opts.owner_name.is_some();
    if single_cluster && owner_requested && !owner_ids.is_empty() {
        builder.add_expression(terms(
            paths::OWNER_REFERENCE_UID_PATH,
            owner_ids.to_vec(),
            LogicalRole::Must,
        ));
    }

    // Rule 7: type pinning.
    builder.add_expression(terms(paths::GROUP_PATH, vec![gvr.group.clone()], LogicalRole::Must));
    builder.add_expression(terms(paths::VERSION_PATH, vec![gvr.version.clone()], LogicalRole::Must));
    builder.add_expression(terms(paths::RESOURCE_PATH, vec![gvr.resource.clone()], LogicalRole::Must));

    // Rule 8: pagination.
    let size = if opts.limit > 0 { opts.limit } else { DEFAULT_LIMIT };
    let from = opts
        .continue_token
        .as_deref()
        .and_then(|c| c.parse::<i64>().ok())
        .unwrap_or(0);
    builder.set_size(size);
    builder.set_from(from);

    // Rule 9: sort.
    if !opts.order_by.is_empty() {
        let sort = opts
            .order_by
            .iter()
            .map(|o| SortField {
                path: sort_path(&o.field),
                descending: o.descending,
            })
            .collect();
        builder.set_sort(sort);
    }

    Ok(builder)
}

/// Rewrites a caller-supplied sort field name into the concrete path it maps
/// to (§4.5 rule 9). `created_at` sorts on the raw date field, not a
/// `.keyword` sub-field, since `creationTimestamp` is mapped as `date` and
/// has no keyword multi-field.
fn sort_path(field: &str) -> String {
    if field == "created_at" {
        return paths::CREATION_TIMESTAMP_PATH.to_string();
    }
    if field.contains(paths::SPEC_PATH) {
        return format!("{}.{}", paths::OBJECT_PATH, field);
    }
    format!("{field}.{}", paths::KEYWORD_SUFFIX)
}

fn is_list_indexed(path: &str) -> bool {
    path.split('.').any(|segment| segment.contains('[') && segment.contains(']'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gvr() -> GroupVersionResource {
        GroupVersionResource::new("apps", "v1", "deployments")
    }

    #[test]
    fn compiles_basic_list() {
        let opts = ListOptions {
            cluster_names: vec!["c1".to_string()],
            namespaces: vec!["ns".to_string()],
            limit: 50,
            order_by: vec![OrderByField {
                field: "name".to_string(),
                descending: false,
            }],
            ..Default::default()
        };
        let builder = compile(&opts, &gvr(), &[]).unwrap();
        let body = builder.build();
        assert_eq!(body["size"], serde_json::json!(50));
        assert_eq!(body["from"], serde_json::json!(0));
        assert_eq!(body["sort"], serde_json::json!([{"name.keyword": {"order": "asc"}}]));
    }

    #[test]
    fn rejects_list_indexed_field_selector() {
        let opts = ListOptions {
            enhanced_field_selector: vec![SelectorRequirement {
                key: "spec.containers[0].image".to_string(),
                operator: SelectorOperator::Equals,
                values: vec!["nginx".to_string()],
            }],
            ..Default::default()
        };
        let err = compile(&opts, &gvr(), &[]).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument(_)));
    }

    #[test]
    fn fuzzy_name_trims_values() {
        let opts = ListOptions {
            extra_label_selector: vec![SelectorRequirement {
                key: FUZZY_NAME_KEY.to_string(),
                operator: SelectorOperator::Equals,
                values: vec!["web".to_string(), "  api  ".to_string()],
            }],
            ..Default::default()
        };
        let builder = compile(&opts, &gvr(), &[]).unwrap();
        let body = builder.build();
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert!(must.contains(&serde_json::json!({"fuzzy": {"name": ["web"]}})));
        assert!(must.contains(&serde_json::json!({"fuzzy": {"name": ["api"]}})));
    }

    #[test]
    fn label_not_in_compiles_to_must_not() {
        let opts = ListOptions {
            label_selector: vec![SelectorRequirement {
                key: "env".to_string(),
                operator: SelectorOperator::NotIn,
                values: vec!["prod".to_string(), "staging".to_string()],
            }],
            ..Default::default()
        };
        let builder = compile(&opts, &gvr(), &[]).unwrap();
        let body = builder.build();
        let must_not = body["query"]["bool"]["must_not"].as_array().unwrap();
        assert!(must_not.contains(&serde_json::json!({"terms": {"object.metadata.labels": ["prod", "staging"]}})));
    }

    #[test]
    fn created_at_sorts_on_raw_date_field() {
        assert_eq!(sort_path("created_at"), "object.metadata.creationTimestamp");
    }

    #[test]
    fn type_pinning_always_present() {
        let builder = compile(&ListOptions::default(), &gvr(), &[]).unwrap();
        let body = builder.build();
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert!(must.contains(&serde_json::json!({"terms": {"group": ["apps"]}})));
        assert!(must.contains(&serde_json::json!({"terms": {"version": ["v1"]}})));
        assert!(must.contains(&serde_json::json!({"terms": {"resource": ["deployments"]}})));
    }
}
