//! Elasticsearch-backed storage for a multi-cluster Kubernetes resource
//! aggregator.
//!
//! This crate is the backing store for a system that collects resource
//! snapshots from many clusters and serves structured list/get queries
//! against them — filters, label and field selectors, owner-reference
//! traversal, pagination, and ordering, all compiled down to Elasticsearch
//! `_search` requests.
//!
//! # Architecture
//!
//! - [`expr`] / [`query_builder`] — the predicate model and the accumulator
//!   that assembles predicates, pagination, and sort into one search body.
//! - [`listoptions`] — compiles a caller's list-options structure into
//!   expressions.
//! - [`schema`] — per-resource index mapping generation.
//! - [`gateway`] — the thin adapter over the Elasticsearch client; the seam
//!   everything else depends on instead of the concrete client.
//! - [`storage`] — CRUD + list decoding bound to one `(group, version, resource)`.
//! - [`collection`] — the read-only aggregator across several resource types.
//! - [`factory`] — index lifecycle and fleet-wide cluster operations.
//!
//! # Quick start
//!
//! ```no_run
//! # async fn run() -> clusterpedia_es_storage::error::StorageResult<()> {
//! use std::sync::Arc;
//! use clusterpedia_es_storage::config::EsStorageConfig;
//! use clusterpedia_es_storage::factory::StorageFactory;
//! use clusterpedia_es_storage::gateway::ElasticsearchGateway;
//! use clusterpedia_es_storage::gvr::GroupVersionResource;
//!
//! let config = EsStorageConfig::from_env();
//! let gateway = Arc::new(ElasticsearchGateway::new(&config)?);
//! let factory = StorageFactory::new(gateway, Vec::new());
//!
//! let storage = factory
//!     .new_resource_storage(GroupVersionResource::new("apps", "v1", "deployments"))
//!     .await?;
//! # let _ = storage;
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod expr;
pub mod factory;
pub mod gateway;
pub mod gvr;
pub mod listoptions;
pub mod paths;
pub mod query_builder;
pub mod response;
pub mod schema;
pub mod storage;

pub use error::{StorageError, StorageResult};
