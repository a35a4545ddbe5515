//! Per-node enumerated hierarchy tables.
//!
//! One JSON object per subtree root, mapping node ids to point counts:
//!
//! ```json
//! { "0-0-0-0": 4000, "1-0-0-0": 1000, "1-1-0-0": -1 }
//! ```
//!
//! A count of -1 marks a node whose subtree lives in its own deeper table,
//! published under that node's id; it is fetched only when that node is
//! asked to resolve. All other entries are concrete, with per-node point
//! payloads addressed by id.

use std::collections::HashMap;

use crate::hierarchy::{EntryMap, HierarchyEntry, HierarchyError};
use crate::octree::coord::NodeCoord;
use crate::octree::node::{PageLocator, PayloadLocator};

/// Decode one table into a coordinate-keyed entry map.
pub fn decode_table(bytes: &[u8]) -> Result<EntryMap, HierarchyError> {
    let raw: HashMap<String, i64> = serde_json::from_slice(bytes)?;

    let mut entries = EntryMap::with_capacity(raw.len());
    for (id, count) in raw {
        let coord = NodeCoord::parse(&id).ok_or(HierarchyError::BadEntryId(id))?;
        let entry = if count < 0 {
            HierarchyEntry::Page {
                num_points: None,
                locator: PageLocator::Table { key: coord },
            }
        } else {
            HierarchyEntry::Concrete {
                num_points: count as u64,
                payload: PayloadLocator::Key(coord),
            }
        };
        entries.insert(coord, entry);
    }
    Ok(entries)
}
