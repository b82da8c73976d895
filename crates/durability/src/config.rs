//! Configuration accepted by the durability layer.

use crate::framing::SerializerConfig;
use crate::hash::HashFunction;

/// Policy controlling how [`crate::stream::StreamManager`] frames and
/// compacts records.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    pub serializer: SerializerConfig,
    /// Whether snapshot writes are passed through zstd before framing.
    pub deflate_snapshots: bool,
    /// Whether snapshot writes factor out repeated task configs.
    pub deduplicate_snapshots: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            serializer: SerializerConfig::default(),
            deflate_snapshots: true,
            deduplicate_snapshots: true,
        }
    }
}

impl StreamConfig {
    pub fn hash_function(&self) -> HashFunction {
        self.serializer.hash_function
    }
}
