//! End-to-end scenarios against synthetic enumerated JSON hierarchies.

mod common;

use std::sync::Arc;

use cloudtree::hierarchy::HierarchyError;
use cloudtree::octree::coord::NodeCoord;
use cloudtree::octree::node::NodeState;
use cloudtree::point_cloud::PointCloud;
use cloudtree::resource::memory::MemoryClient;

use common::{enumerated_descriptor, source_with};

const ROOT_TABLE: &str = r#"{ "0-0-0-0": 4000, "1-0-0-0": 1000, "1-1-0-0": -1 }"#;
const BOUNDARY_TABLE: &str = r#"{ "1-1-0-0": 500, "2-2-0-0": 250 }"#;

fn two_table_cloud() -> (PointCloud<Arc<MemoryClient>>, Arc<MemoryClient>) {
    let client = Arc::new(
        MemoryClient::new()
            .with("mem://ept/ept-hierarchy/0-0-0-0.json", ROOT_TABLE.as_bytes())
            .with("mem://ept/ept-hierarchy/1-1-0-0.json", BOUNDARY_TABLE.as_bytes()),
    );
    let (source, _) = source_with(enumerated_descriptor("mem://ept"), client.clone());
    (PointCloud::new(source).unwrap(), client)
}

#[tokio::test]
async fn one_table_expands_the_whole_inline_subtree() {
    let (cloud, client) = two_table_cloud();
    let root = cloud.root_id();
    cloud.resolve_hierarchy(root).await.unwrap();

    let octree = cloud.octree();
    assert_eq!(octree.root().num_points(), Some(4000));
    assert_eq!(octree.root().children.len(), 2);

    let concrete = octree.lookup(NodeCoord::parse("1-0-0-0").unwrap()).unwrap();
    assert_eq!(octree.node(concrete).unwrap().num_points(), Some(1000));
    assert!(octree.node(concrete).unwrap().is_subtree_resolved());

    // The -1 entry is materialized as a page pointer to its own table and
    // costs no fetch until it is asked to resolve.
    let boundary = octree.lookup(NodeCoord::parse("1-1-0-0").unwrap()).unwrap();
    assert!(!octree.node(boundary).unwrap().is_subtree_resolved());
    assert!(matches!(
        octree.node(boundary).unwrap().state,
        NodeState::Page { num_points: None, .. }
    ));
    assert_eq!(client.fetch_count(), 1);
}

#[tokio::test]
async fn boundary_node_resolves_lazily_from_its_own_table() {
    let (cloud, client) = two_table_cloud();
    let root = cloud.root_id();
    cloud.resolve_hierarchy(root).await.unwrap();

    let boundary = cloud.node_id(NodeCoord::parse("1-1-0-0").unwrap()).unwrap();
    cloud.resolve_hierarchy(boundary).await.unwrap();

    let octree = cloud.octree();
    let node = octree.node(boundary).unwrap();
    assert_eq!(node.num_points(), Some(500));
    assert_eq!(node.children.len(), 1);

    let grandchild = octree.lookup(NodeCoord::parse("2-2-0-0").unwrap()).unwrap();
    assert_eq!(octree.node(grandchild).unwrap().num_points(), Some(250));
    assert_eq!(client.fetch_count(), 2);
}

#[tokio::test]
async fn table_without_own_entry_is_a_format_error() {
    let client = Arc::new(MemoryClient::new().with(
        "mem://ept/ept-hierarchy/0-0-0-0.json",
        r#"{ "1-0-0-0": 1000 }"#.as_bytes(),
    ));
    let (source, _) = source_with(enumerated_descriptor("mem://ept"), client.clone());
    let cloud = PointCloud::new(source).unwrap();

    let root = cloud.root_id();
    let err = cloud.resolve_hierarchy(root).await.unwrap_err();
    assert!(matches!(err, HierarchyError::MissingOwnEntry(_)));
    // The tree is left untouched; the error did not fabricate an empty node.
    assert!(!cloud.octree().root().is_subtree_resolved());
    assert!(cloud.octree().root().children.is_empty());
}

#[tokio::test]
async fn load_points_fetches_the_per_node_payload() {
    let client = Arc::new(
        MemoryClient::new()
            .with("mem://ept/ept-hierarchy/0-0-0-0.json", ROOT_TABLE.as_bytes())
            .with("mem://ept/ept-data/1-0-0-0.laz", vec![7u8; 2048]),
    );
    let (source, parser) = source_with(enumerated_descriptor("mem://ept"), client.clone());
    let cloud = PointCloud::new(source).unwrap();

    let root = cloud.root_id();
    cloud.resolve_hierarchy(root).await.unwrap();
    let child = cloud.node_id(NodeCoord::parse("1-0-0-0").unwrap()).unwrap();
    let buffers = cloud.load_points(child).await.unwrap();
    assert_eq!(buffers.positions.len(), 1000);

    let calls = parser.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].bytes, 2048);
    assert_eq!(client.fetch_count(), 2);
}
