//! Dotted JSON paths addressed by expressions and mappings.
//!
//! Named once here so the compiler, query builder, and schema generator
//! never repeat the literal strings.

pub const OBJECT_PATH: &str = "object";
pub const SPEC_PATH: &str = "spec";
pub const CLUSTER_PATH: &str = "object.metadata.annotations.shadow.clusterpedia.io/cluster-name";
pub const NAMESPACE_PATH: &str = "object.metadata.namespace";
pub const NAME_PATH: &str = "object.metadata.name";
pub const OWNER_REFERENCE_UID_PATH: &str = "object.metadata.ownerReferences.uid";
pub const CREATION_TIMESTAMP_PATH: &str = "object.metadata.creationTimestamp";
pub const LABEL_PATH: &str = "object.metadata.labels";
pub const GROUP_PATH: &str = "group";
pub const VERSION_PATH: &str = "version";
pub const RESOURCE_PATH: &str = "resource";
pub const UID_PATH: &str = "object.metadata.uid";
pub const KEYWORD_SUFFIX: &str = "keyword";
