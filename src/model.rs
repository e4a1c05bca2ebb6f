use std::fmt;
use std::path::PathBuf;

pub type NodeId = u64;

/// A homogeneous node identifier. Index maps hash it through [`KeyMap`],
/// which reduces to a single multiply over the raw id; inputs are dense
/// small integers generated upstream, so no adversarial mixing is needed.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Key(pub NodeId);

/// The key→offset index type shared by both engines.
pub type KeyMap<V> = rustc_hash::FxHashMap<Key, V>;

/// A dense tensor of 32-bit floats. Within one store every value has the
/// same length, latched by the first successful put.
pub type Value = Vec<f32>;

/// Borrowed view of an edge list. Accepted at build time; the core
/// engines do not index it yet. Reserved for engines that co-locate
/// neighboring tensors.
#[derive(Copy, Clone, Debug)]
pub struct GraphTopology<'a> {
    pub edges: &'a [(NodeId, NodeId)],
}

#[derive(Clone, Debug)]
pub enum EngineConfig {
    InMemory,
    FlatMmap { db_path: PathBuf },
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<NodeId> for Key {
    fn from(id: NodeId) -> Self {
        Key(id)
    }
}
