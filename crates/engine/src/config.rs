//! Engine configuration.

use storage_durability::{HashFunction, SerializerConfig, StreamConfig};
use thiserror::Error;

/// Validation failures raised by [`EngineConfigBuilder::build`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_entry_size must be greater than zero")]
    MaxEntrySizeZero,
    #[error("snapshot_interval_ms must be greater than zero")]
    SnapshotIntervalZero,
    #[error("schema_version must be greater than zero")]
    SchemaVersionZero,
}

/// Engine-wide configuration, covering both the wire-level policy
/// (`storage-durability::StreamConfig`) and engine-level behavior
/// (snapshot cadence, schema version written into every transaction).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub stream: StreamConfig,
    /// How often `storage-engine::engine::StorageEngine::maybe_snapshot`
    /// takes a new snapshot, in milliseconds of wall-clock time since
    /// the last one.
    pub snapshot_interval_ms: i64,
    /// Written into every `Transaction` record; replay does not use
    /// this value, but it's available to callers doing schema
    /// migrations downstream of the engine.
    pub schema_version: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            snapshot_interval_ms: 60 * 60 * 1000,
            schema_version: 1,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Fluent builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn max_entry_size(mut self, bytes: usize) -> Self {
        self.config.stream.serializer.max_entry_size = bytes;
        self
    }

    pub fn hash_function(mut self, hash_function: HashFunction) -> Self {
        self.config.stream.serializer.hash_function = hash_function;
        self
    }

    pub fn deflate_snapshots(mut self, enabled: bool) -> Self {
        self.config.stream.deflate_snapshots = enabled;
        self
    }

    pub fn deduplicate_snapshots(mut self, enabled: bool) -> Self {
        self.config.stream.deduplicate_snapshots = enabled;
        self
    }

    pub fn snapshot_interval_ms(mut self, millis: i64) -> Self {
        self.config.snapshot_interval_ms = millis;
        self
    }

    pub fn schema_version(mut self, version: u32) -> Self {
        self.config.schema_version = version;
        self
    }

    pub fn serializer(mut self, serializer: SerializerConfig) -> Self {
        self.config.stream.serializer = serializer;
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        if self.config.stream.serializer.max_entry_size == 0 {
            return Err(ConfigError::MaxEntrySizeZero);
        }
        if self.config.snapshot_interval_ms <= 0 {
            return Err(ConfigError::SnapshotIntervalZero);
        }
        if self.config.schema_version == 0 {
            return Err(ConfigError::SchemaVersionZero);
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::builder().build().unwrap();
    }

    #[test]
    fn zero_max_entry_size_is_rejected() {
        let err = EngineConfig::builder().max_entry_size(0).build().unwrap_err();
        assert_eq!(err, ConfigError::MaxEntrySizeZero);
    }

    #[test]
    fn zero_snapshot_interval_is_rejected() {
        let err = EngineConfig::builder()
            .snapshot_interval_ms(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::SnapshotIntervalZero);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = EngineConfig::builder()
            .max_entry_size(1024)
            .deflate_snapshots(false)
            .schema_version(3)
            .build()
            .unwrap();
        assert_eq!(config.stream.serializer.max_entry_size, 1024);
        assert!(!config.stream.deflate_snapshots);
        assert_eq!(config.schema_version, 3);
    }
}
