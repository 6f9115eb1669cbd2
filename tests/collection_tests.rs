mod support;

use std::sync::Arc;

use clusterpedia_es_storage::collection::CollectionResourceStorage;
use clusterpedia_es_storage::document::{CollectionResourceType, RESOURCE_ALIAS};
use clusterpedia_es_storage::gvr::GroupVersionResource;
use clusterpedia_es_storage::listoptions::ListOptions;
use clusterpedia_es_storage::storage::ResourceStorage;
use serde_json::json;
use support::FakeGateway;

fn pod(cluster: &str, name: &str, uid: &str) -> serde_json::Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "uid": uid,
            "name": name,
            "namespace": "ns",
            "resourceVersion": "1",
            "annotations": { "shadow.clusterpedia.io/cluster-name": cluster }
        },
        "spec": {}
    })
}

fn deployment(cluster: &str, name: &str, uid: &str) -> serde_json::Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "uid": uid,
            "name": name,
            "namespace": "ns",
            "resourceVersion": "1",
            "annotations": { "shadow.clusterpedia.io/cluster-name": cluster }
        },
        "spec": {}
    })
}

#[tokio::test]
async fn unions_across_declared_resource_types_and_dedupes_observed_types() {
    let gateway = Arc::new(FakeGateway::new());

    let pods = ResourceStorage::new(gateway.clone(), GroupVersionResource::new("", "v1", "pods"), Vec::new());
    let deployments = ResourceStorage::new(
        gateway.clone(),
        GroupVersionResource::new("apps", "v1", "deployments"),
        Vec::new(),
    );

    pods.create("c1", pod("c1", "web-pod", "uid-pod-1")).await.unwrap();
    pods.create("c1", pod("c1", "db-pod", "uid-pod-2")).await.unwrap();
    deployments
        .create("c1", deployment("c1", "web", "uid-deploy-1"))
        .await
        .unwrap();

    let collection = CollectionResourceStorage::new(
        gateway.clone(),
        RESOURCE_ALIAS,
        vec![
            CollectionResourceType {
                group: "".to_string(),
                version: "v1".to_string(),
                resource: "pods".to_string(),
                kind: "Pod".to_string(),
            },
            CollectionResourceType {
                group: "apps".to_string(),
                version: "v1".to_string(),
                resource: "deployments".to_string(),
                kind: "Deployment".to_string(),
            },
        ],
    );

    let result = collection.get(&ListOptions::default()).await.unwrap();
    assert_eq!(result.items.len(), 3);
    assert_eq!(result.resource_types.len(), 2);
}

#[tokio::test]
async fn cluster_filter_narrows_the_union() {
    let gateway = Arc::new(FakeGateway::new());
    let pods = ResourceStorage::new(gateway.clone(), GroupVersionResource::new("", "v1", "pods"), Vec::new());
    pods.create("c1", pod("c1", "web-pod", "uid-pod-1")).await.unwrap();
    pods.create("c2", pod("c2", "web-pod", "uid-pod-2")).await.unwrap();

    let collection = CollectionResourceStorage::new(
        gateway.clone(),
        RESOURCE_ALIAS,
        vec![CollectionResourceType {
            group: "".to_string(),
            version: "v1".to_string(),
            resource: "pods".to_string(),
            kind: "Pod".to_string(),
        }],
    );

    let opts = ListOptions {
        cluster_names: vec!["c1".to_string()],
        ..Default::default()
    };
    let result = collection.get(&opts).await.unwrap();
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0]["metadata"]["uid"], json!("uid-pod-1"));
}
