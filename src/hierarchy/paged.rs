//! Paged binary hierarchy chunks.
//!
//! A chunk is a flat run of 22-byte little-endian entries describing the
//! subtree under one chunk root, in breadth-first discovery order: the first
//! entry is the chunk root itself, and each non-proxy entry's child mask
//! announces which of its 8 children follow. Proxy entries (kind 2) carry
//! the byte range of the chunk holding the rest of that subtree instead of a
//! payload range.

use std::io::Cursor;

use binrw::{binrw, BinReaderExt};
use tracing::warn;

use crate::hierarchy::{EntryMap, HierarchyEntry, HierarchyError};
use crate::octree::coord::NodeCoord;
use crate::octree::node::{PageLocator, PayloadLocator};

pub const BYTES_PER_ENTRY: usize = 22;

/// Entry kind marking a page pointer to a further chunk.
pub const KIND_PAGE: u8 = 2;

/// Point count published for a proxy whose real count is not yet known.
pub const NUM_POINTS_UNKNOWN: u32 = u32::MAX;

#[binrw]
#[derive(Debug, Clone)]
#[br(little)]
#[bw(little)]
pub struct PagedEntry {
    pub kind: u8,
    pub child_mask: u8,
    pub num_points: u32,
    pub byte_offset: u64,
    pub byte_size: u64,
}

/// Decode one chunk into a coordinate-keyed entry map.
///
/// Coordinates are reconstructed from the chunk root and the child masks;
/// the wire format never spells them out.
pub fn decode_chunk(chunk_root: NodeCoord, buf: &[u8]) -> Result<EntryMap, HierarchyError> {
    if buf.is_empty() || buf.len() % BYTES_PER_ENTRY != 0 {
        return Err(HierarchyError::TruncatedChunk(buf.len()));
    }
    let num_entries = buf.len() / BYTES_PER_ENTRY;

    let mut cursor = Cursor::new(buf);
    // Discovery order: index i of this list is the coordinate entry i
    // describes. Expanding a child mask appends to the tail.
    let mut order = Vec::with_capacity(num_entries);
    order.push(chunk_root);
    let mut entries = EntryMap::with_capacity(num_entries);

    for i in 0..num_entries {
        let raw: PagedEntry = cursor.read_le()?;
        let coord = *order.get(i).ok_or(HierarchyError::OverfullChunk(chunk_root))?;

        let entry = if raw.kind == KIND_PAGE {
            let num_points =
                (raw.num_points != NUM_POINTS_UNKNOWN).then(|| u64::from(raw.num_points));
            HierarchyEntry::Page {
                num_points,
                locator: PageLocator::Range {
                    offset: raw.byte_offset,
                    size: raw.byte_size,
                },
            }
        } else {
            let mut num_points = u64::from(raw.num_points);
            if raw.byte_size == 0 && num_points > 0 {
                // Some writers report a point count on inner nodes that hold
                // no payload; a zero byte size is the reliable signal.
                warn!(node = %coord, num_points, "zero-size payload, dropping reported count");
                num_points = 0;
            }
            for child_index in 0..8 {
                if (raw.child_mask >> child_index) & 1 != 0 {
                    order.push(coord.child(child_index));
                }
            }
            HierarchyEntry::Concrete {
                num_points,
                payload: PayloadLocator::Range {
                    offset: raw.byte_offset,
                    size: raw.byte_size,
                },
            }
        };
        entries.insert(coord, entry);
    }

    Ok(entries)
}

#[cfg(test)]
pub(crate) fn encode_entry(entry: &PagedEntry) -> [u8; BYTES_PER_ENTRY] {
    let mut bytes = [0u8; BYTES_PER_ENTRY];
    bytes[0] = entry.kind;
    bytes[1] = entry.child_mask;
    bytes[2..6].copy_from_slice(&entry.num_points.to_le_bytes());
    bytes[6..14].copy_from_slice(&entry.byte_offset.to_le_bytes());
    bytes[14..22].copy_from_slice(&entry.byte_size.to_le_bytes());
    bytes
}
