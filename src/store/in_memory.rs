use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::error::Result;
use crate::model::{GraphTopology, Key, KeyMap, Value};
use crate::store::{EngineBuilder, FeatureStore};

/// Tensors reserved up front once the first put latches the tensor size.
const INITIAL_TENSOR_CAPACITY: usize = 10_000;

/// Engine backed by one contiguous float blob plus an element-offset
/// index. A single allocation amortizes heap overhead and keeps gathers
/// on hot cache lines; sizing the store is `blob.len() * 4` bytes.
pub struct InMemoryStore {
    blob: Vec<f32>,
    offsets: KeyMap<usize>,
    tensor_size: Option<usize>,
}

impl FeatureStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    fn num_keys(&self) -> usize {
        self.offsets.len()
    }

    fn tensor_size(&self) -> Option<usize> {
        self.tensor_size
    }

    fn get_multi_tensor_async<'a>(&'a self, keys: &'a [Key]) -> BoxFuture<'a, Vec<Option<Value>>> {
        let results = match self.tensor_size {
            None => {
                warn!("gather against an empty store");
                vec![None; keys.len()]
            }
            Some(ts) => keys
                .iter()
                .map(|key| {
                    self.offsets
                        .get(key)
                        .map(|&off| self.blob[off..off + ts].to_vec())
                })
                .collect(),
        };
        Box::pin(futures::future::ready(results))
    }
}

#[derive(Default)]
pub struct InMemoryBuilder {
    blob: Vec<f32>,
    offsets: KeyMap<usize>,
    tensor_size: Option<usize>,
}

impl InMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EngineBuilder for InMemoryBuilder {
    fn put_tensor(&mut self, key: Key, tensor: Value) -> bool {
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
            None => {
                self.tensor_size = Some(tensor.len());
                self.blob.reserve(INITIAL_TENSOR_CAPACITY * tensor.len());
            }
        }

        // A repeated key appends a fresh region and repoints the offset;
        // the old region stays behind as an unreachable tombstone.
        self.offsets.insert(key, self.blob.len());
        self.blob.extend_from_slice(&tensor);
        true
    }

    fn build(
        self: Box<Self>,
        _graph: Option<GraphTopology<'_>>,
    ) -> Result<Box<dyn FeatureStore>> {
        let estimated_bytes = self.blob.len() * std::mem::size_of::<f32>();
        info!(
            total_keys = self.offsets.len(),
            "building in-memory store ({:.3} GB blob)",
            estimated_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
        );
        Ok(Box::new(InMemoryStore {
            blob: self.blob,
            offsets: self.offsets,
            tensor_size: self.tensor_size,
        }))
    }
}
