use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tracing::{error, info, warn};

use crate::error::Result;
#[cfg(unix)]
use crate::mmap::Advice;
use crate::mmap::MmapRegion;
use crate::model::{GraphTopology, Key, KeyMap, Value};
use crate::store::{EngineBuilder, FeatureStore};

/// Engine backed by a headerless on-disk concatenation of little-endian
/// f32 payloads. The file is meaningless without the in-memory
/// key→byte-offset index handed over by the builder; gathers resolve
/// through a private read-only mapping and the kernel pages tensors in
/// on demand.
pub struct FlatMmapStore {
    region: MmapRegion,
    key_to_byte: KeyMap<usize>,
    tensor_size: Option<usize>,
}

impl FlatMmapStore {
    pub(crate) fn open(
        db_path: &Path,
        key_to_byte: KeyMap<usize>,
        tensor_size: Option<usize>,
    ) -> Result<Self> {
        let region = MmapRegion::open(db_path)?;
        // Gathers scatter across the file; tell the kernel not to
        // read ahead.
        #[cfg(unix)]
        region.advise(Advice::Random);
        Ok(Self {
            region,
            key_to_byte,
            tensor_size,
        })
    }

    fn decode_tensor(&self, byte_off: usize, ts: usize) -> Option<Value> {
        let bytes = self.region.as_bytes();
        let end = byte_off.checked_add(ts * 4)?;
        if end > bytes.len() {
            warn!(byte_off, "tensor offset past end of backing file");
            return None;
        }
        Some(
            bytes[byte_off..end]
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }
}

impl FeatureStore for FlatMmapStore {
    fn name(&self) -> &'static str {
        "flat_mmap"
    }

    fn num_keys(&self) -> usize {
        self.key_to_byte.len()
    }

    fn tensor_size(&self) -> Option<usize> {
        self.tensor_size
    }

    fn get_multi_tensor_async<'a>(&'a self, keys: &'a [Key]) -> BoxFuture<'a, Vec<Option<Value>>> {
        let results = match self.tensor_size {
            None => {
                warn!("gather against a store with no tensor size");
                vec![None; keys.len()]
            }
            Some(ts) => keys
                .iter()
                .map(|key| {
                    self.key_to_byte
                        .get(key)
                        .and_then(|&off| self.decode_tensor(off, ts))
                })
                .collect(),
        };
        Box::pin(futures::future::ready(results))
    }
}

pub struct FlatMmapBuilder {
    db_path: PathBuf,
    out: BufWriter<File>,
    key_to_byte: KeyMap<usize>,
    tensor_size: Option<usize>,
    write_pos: usize,
    scratch: Vec<u8>,
    // A failed write would desynchronize recorded offsets from the file,
    // so the first failure poisons all further puts.
    wedged: bool,
}

impl FlatMmapBuilder {
    pub fn create(db_path: PathBuf) -> Result<Self> {
        let file = File::create(&db_path)?;
        Ok(Self {
            db_path,
            out: BufWriter::new(file),
            key_to_byte: KeyMap::default(),
            tensor_size: None,
            write_pos: 0,
            scratch: Vec::new(),
            wedged: false,
        })
    }
}

impl EngineBuilder for FlatMmapBuilder {
    fn put_tensor(&mut self, key: Key, tensor: Value) -> bool {
        if self.wedged {
            error!(key = %key, "dropping tensor: output file is in an errored state");
            return false;
        }
        match self.tensor_size {
            Some(ts) if tensor.len() != ts => {
                warn!(
                    key = %key,
                    got = tensor.len(),
                    expected = ts,
                    "rejecting tensor with mismatched size"
                );
                return false;
            }
            Some(_) => {}
            None => self.tensor_size = Some(tensor.len()),
        }

        self.scratch.clear();
        for v in &tensor {
            self.scratch.extend_from_slice(&v.to_le_bytes());
        }
        if let Err(e) = self.out.write_all(&self.scratch) {
            error!("write to {} failed: {e}", self.db_path.display());
            self.wedged = true;
            return false;
        }

        // Last writer wins; an overwritten key leaves its old bytes
        // behind as a tombstone.
        self.key_to_byte.insert(key, self.write_pos);
        self.write_pos += self.scratch.len();
        true
    }

    fn build(
        mut self: Box<Self>,
        _graph: Option<GraphTopology<'_>>,
    ) -> Result<Box<dyn FeatureStore>> {
        self.out.flush()?;
        drop(self.out);
        info!(
            total_keys = self.key_to_byte.len(),
            path = %self.db_path.display(),
            "building flat-mmap store ({:.3} GB file)",
            self.write_pos as f64 / (1024.0 * 1024.0 * 1024.0)
        );
        let store = FlatMmapStore::open(&self.db_path, self.key_to_byte, self.tensor_size)?;
        Ok(Box::new(store))
    }
}
