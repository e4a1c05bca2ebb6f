use tracing::debug;

use crate::error::Result;
use crate::model::EngineConfig;
use crate::store::flat_mmap::FlatMmapBuilder;
use crate::store::in_memory::InMemoryBuilder;
use crate::store::FeatureStoreBuilder;

/// The single point where engine selection is encoded; everything
/// downstream sees only the abstract builder and store.
pub fn create_builder(cfg: &EngineConfig) -> Result<FeatureStoreBuilder> {
    match cfg {
        EngineConfig::InMemory => {
            debug!("creating in-memory builder");
            Ok(FeatureStoreBuilder::new(Box::new(InMemoryBuilder::new())))
        }
        EngineConfig::FlatMmap { db_path } => {
            debug!(path = %db_path.display(), "creating flat-mmap builder");
            let builder = FlatMmapBuilder::create(db_path.clone())?;
            Ok(FeatureStoreBuilder::new(Box::new(builder)))
        }
    }
}
