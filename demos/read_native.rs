use std::sync::Arc;

use cloudtree::attributes::{AttributeBuffers, ParseContext, ParseError, PointParser};
use cloudtree::crs::Crs;
use cloudtree::point_cloud::PointCloud;
use cloudtree::resource::file::FileClient;

/// Stand-in parser: the demo only walks the hierarchy, so payload bytes are
/// acknowledged without decoding.
struct NullParser;

impl PointParser for NullParser {
    fn parse(
        &self,
        _bytes: &[u8],
        _context: &ParseContext<'_>,
    ) -> Result<AttributeBuffers, ParseError> {
        Ok(AttributeBuffers::default())
    }
}

#[tokio::main(flavor = "current_thread")]
pub async fn main() {
    tracing_subscriber::fmt::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "file://assets/heidentor".to_string());

    let cloud = PointCloud::from_paged_url(
        &url,
        Crs::from_code("EPSG:2154"),
        FileClient,
        Arc::new(NullParser),
    )
    .await
    .expect("loading metadata failed");

    let root = cloud.root_id();
    cloud
        .resolve_hierarchy(root)
        .await
        .expect("resolving the root hierarchy failed");

    for node in cloud.snapshot().iter() {
        println!(
            "{:indent$}{} points={:?} resolved={}",
            "",
            node.id(),
            node.num_points,
            node.subtree_resolved,
            indent = node.coord.depth as usize * 2,
        );
    }
}
