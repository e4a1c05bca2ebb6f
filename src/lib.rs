pub mod bench;
pub mod error;
pub mod ingest;
pub mod mmap;
pub mod model;
pub mod store;

pub use crate::error::{PlumeError, Result};
pub use crate::ingest::{ingest_edgelist, ingest_features};
pub use crate::mmap::MmapRegion;
pub use crate::model::{EngineConfig, GraphTopology, Key, KeyMap, NodeId, Value};
pub use crate::store::{create_builder, FeatureStore, FeatureStoreBuilder};
