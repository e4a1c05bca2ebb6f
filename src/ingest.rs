use std::path::Path;

use tracing::info;

use crate::error::{PlumeError, Result};
#[cfg(unix)]
use crate::mmap::Advice;
use crate::mmap::MmapRegion;
use crate::model::{Key, NodeId, Value};
use crate::store::FeatureStoreBuilder;

/// Typical GNN feature dimension, pre-reserved per row.
const TYPICAL_TENSOR_DIM: usize = 128;

fn map_for_scan(path: &Path) -> Result<MmapRegion> {
    let region = MmapRegion::open(path)
        .map_err(|e| PlumeError::Ingest(format!("cannot map {}: {e}", path.display())))?;
    // Single start-to-finish pass; let the kernel read ahead.
    #[cfg(unix)]
    region.advise(Advice::Sequential);
    Ok(region)
}

fn parse_field(token: &[u8]) -> Option<f32> {
    std::str::from_utf8(token).ok()?.trim().parse().ok()
}

fn parse_id(token: &[u8]) -> Option<NodeId> {
    std::str::from_utf8(token).ok()?.trim().parse().ok()
}

/// Streams a features CSV into the builder: one node per line,
/// comma-separated decimal floats, implicit zero-based node IDs. A field
/// that fails to parse truncates its line there; lines yielding an empty
/// tensor are skipped without consuming an ID. Returns the number of
/// rows handed to the builder.
pub fn ingest_features(path: &Path, builder: &mut FeatureStoreBuilder) -> Result<u64> {
    let region = map_for_scan(path)?;
    let bytes = region.as_bytes();
    let len = bytes.len();

    let mut node_id: NodeId = 0;
    let mut tensor: Value = Vec::with_capacity(TYPICAL_TENSOR_DIM);
    let mut pos = 0;

    while pos < len {
        tensor.clear();

        while pos < len && bytes[pos] != b'\n' && bytes[pos] != b'\r' {
            let start = pos;
            while pos < len && !matches!(bytes[pos], b',' | b'\n' | b'\r') {
                pos += 1;
            }
            match parse_field(&bytes[start..pos]) {
                Some(v) => tensor.push(v),
                None => {
                    // Truncate the row at the bad field.
                    while pos < len && !matches!(bytes[pos], b'\n' | b'\r') {
                        pos += 1;
                    }
                    break;
                }
            }
            if pos < len && bytes[pos] == b',' {
                pos += 1;
            }
        }

        if !tensor.is_empty() {
            builder.put_tensor(Key(node_id), tensor.clone())?;
            node_id += 1;
        }

        while pos < len && matches!(bytes[pos], b'\n' | b'\r') {
            pos += 1;
        }
    }

    info!(rows = node_id, path = %path.display(), "ingested node features");
    Ok(node_id)
}

/// Streams an edge-list CSV into `out_edges`: one `src,dst` pair of
/// unsigned decimal integers per line. A line failing to parse either
/// integer terminates the scan.
pub fn ingest_edgelist(path: &Path, out_edges: &mut Vec<(NodeId, NodeId)>) -> Result<()> {
    let region = map_for_scan(path)?;
    let bytes = region.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    'scan: while pos < len {
        while pos < len && matches!(bytes[pos], b'\n' | b'\r') {
            pos += 1;
        }
        if pos >= len {
            break;
        }

        let mut pair = [0 as NodeId; 2];
        for slot in &mut pair {
            let start = pos;
            while pos < len && !matches!(bytes[pos], b',' | b'\n' | b'\r') {
                pos += 1;
            }
            match parse_id(&bytes[start..pos]) {
                Some(id) => *slot = id,
                None => break 'scan,
            }
            if pos < len && bytes[pos] == b',' {
                pos += 1;
            }
        }
        out_edges.push((pair[0], pair[1]));
    }

    info!(edges = out_edges.len(), path = %path.display(), "ingested edge list");
    Ok(())
}
