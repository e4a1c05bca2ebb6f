use futures::future::BoxFuture;

use crate::error::{PlumeError, Result};
use crate::model::{GraphTopology, Key, Value};

mod factory;
pub mod flat_mmap;
pub mod in_memory;

pub use factory::create_builder;

/// The read side of an engine: metadata queries plus a batched gather.
///
/// The asynchronous form is the primary so that an engine backed by true
/// asynchronous IO can slot in without breaking callers; both current
/// engines fulfill the future eagerly. Within one call, `result[i]`
/// corresponds to `keys[i]`; missing keys yield `None`, present keys an
/// owned copy the caller may mutate freely.
pub trait FeatureStore: Send + Sync {
    fn name(&self) -> &'static str;

    fn num_keys(&self) -> usize;

    /// `None` iff the store holds no keys.
    fn tensor_size(&self) -> Option<usize>;

    fn get_multi_tensor_async<'a>(&'a self, keys: &'a [Key]) -> BoxFuture<'a, Vec<Option<Value>>>;

    /// Blocking adaptor over the asynchronous primary.
    fn get_multi_tensor(&self, keys: &[Key]) -> Vec<Option<Value>> {
        futures::executor::block_on(self.get_multi_tensor_async(keys))
    }
}

/// What a concrete engine implements. Soft rejections (tensor-size
/// mismatch, write failure) return `false`; the defunct-builder check
/// lives in [`FeatureStoreBuilder`] so every engine inherits it.
pub(crate) trait EngineBuilder {
    fn put_tensor(&mut self, key: Key, tensor: Value) -> bool;

    fn build(
        self: Box<Self>,
        graph: Option<GraphTopology<'_>>,
    ) -> Result<Box<dyn FeatureStore>>;
}

/// Write-side handle with a one-shot state machine: any number of puts,
/// then exactly one `build`. Afterwards the builder is defunct and both
/// operations fail with [`PlumeError::BuilderDefunct`].
pub struct FeatureStoreBuilder {
    engine: Option<Box<dyn EngineBuilder>>,
}

impl FeatureStoreBuilder {
    pub(crate) fn new(engine: Box<dyn EngineBuilder>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// `Ok(true)` for an accepted insertion, `Ok(false)` for a soft
    /// rejection (logged by the engine, state unchanged).
    pub fn put_tensor(&mut self, key: Key, tensor: Value) -> Result<bool> {
        let engine = self.engine.as_mut().ok_or(PlumeError::BuilderDefunct)?;
        Ok(engine.put_tensor(key, tensor))
    }

    /// Consumes the accumulated tensors and produces the immutable store.
    pub fn build(
        &mut self,
        graph: Option<GraphTopology<'_>>,
    ) -> Result<Box<dyn FeatureStore>> {
        let engine = self.engine.take().ok_or(PlumeError::BuilderDefunct)?;
        engine.build(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EngineConfig;

    #[test]
    fn builder_is_single_use() {
        let mut builder = create_builder(&EngineConfig::InMemory).expect("builder");
        assert!(builder.put_tensor(Key(0), vec![1.0, 2.0]).expect("put"));
        builder.build(None).expect("first build");

        assert!(matches!(
            builder.put_tensor(Key(1), vec![3.0, 4.0]),
            Err(PlumeError::BuilderDefunct)
        ));
        assert!(matches!(builder.build(None), Err(PlumeError::BuilderDefunct)));
    }

    #[test]
    fn gather_preserves_input_order() {
        let mut builder = create_builder(&EngineConfig::InMemory).expect("builder");
        for id in 0..4u64 {
            let base = id as f32;
            assert!(builder
                .put_tensor(Key(id), vec![base, base + 0.5])
                .expect("put"));
        }
        let store = builder.build(None).expect("build");

        let keys = [Key(3), Key(0), Key(7), Key(1)];
        let results = store.get_multi_tensor(&keys);
        assert_eq!(results.len(), keys.len());
        assert_eq!(results[0].as_deref(), Some(&[3.0, 3.5][..]));
        assert_eq!(results[1].as_deref(), Some(&[0.0, 0.5][..]));
        assert_eq!(results[2], None);
        assert_eq!(results[3].as_deref(), Some(&[1.0, 1.5][..]));
    }
}
