//! Stream manager: the durability layer's single point of contact with
//! a log's one stream. Composes the codec, entry serializer, and
//! snapshot deduplicator into `read_from_beginning` / `write_transaction`
//! / `write_snapshot` / `truncate_before`.

use tracing::debug;

use storage_core::record::{Snapshot, Transaction};
use storage_core::{LogicalRecord, Op, Result, StorageError};

use crate::config::StreamConfig;
use crate::dedup;
use crate::external::{Entry, Position, Stream};
use crate::framing::{EntryDecoder, EntrySerializer};

/// Reads and writes logical records against one stream, transparently
/// handling framing, deflation, and snapshot deduplication.
pub struct StreamManager<S: Stream> {
    stream: S,
    serializer: EntrySerializer,
    config: StreamConfig,
}

impl<S: Stream> StreamManager<S> {
    pub fn new(stream: S, config: StreamConfig) -> Self {
        Self {
            stream,
            serializer: EntrySerializer::new(config.serializer),
            config,
        }
    }

    /// Reads every record from the beginning, expanding deduplicated
    /// snapshots and unwrapping deflation, skipping `Noop` and
    /// `Unknown` records. The returned order is append order.
    pub fn read_from_beginning(&mut self) -> Result<Vec<LogicalRecord>> {
        let raw_entries = self.stream.read_all()?;
        let mut decoder = EntryDecoder::new(self.config.serializer);
        let mut out = Vec::new();

        for raw in &raw_entries {
            if let Some(record) = decoder.feed(raw)? {
                match record {
                    LogicalRecord::DeduplicatedSnapshot(dedup_snapshot) => {
                        let snapshot = dedup::reduplicate(&dedup_snapshot)?;
                        out.push(LogicalRecord::Snapshot(snapshot));
                    }
                    other => out.push(other),
                }
            }
        }
        debug!(records = out.len(), "replayed records from stream");
        Ok(out)
    }

    /// Appends a transaction, returning the position of its first
    /// physical entry.
    pub fn write_transaction(&mut self, ops: Vec<Op>, schema_version: u32) -> Result<Position> {
        if ops.is_empty() {
            return Err(StorageError::Append(
                "refusing to append a transaction with no ops".into(),
            ));
        }
        let record = LogicalRecord::Transaction(Transaction { ops, schema_version });
        self.append_record(&record, false)
    }

    /// Appends a snapshot, applying the configured deduplication and
    /// deflation policy, returning the position of its first physical
    /// entry.
    pub fn write_snapshot(&mut self, snapshot: Snapshot) -> Result<Position> {
        let record = if self.config.deduplicate_snapshots {
            let dedup_snapshot = dedup::deduplicate(&snapshot, self.config.hash_function())?;
            LogicalRecord::DeduplicatedSnapshot(dedup_snapshot)
        } else {
            LogicalRecord::Snapshot(snapshot)
        };
        self.append_record(&record, self.config.deflate_snapshots)
    }

    /// Discards every entry strictly before `position`, used after a
    /// successful snapshot write to bound log growth.
    pub fn truncate_before(&mut self, position: Position) -> Result<()> {
        self.stream
            .truncate_before(position)
            .map_err(|e| match e {
                StorageError::Append(_) => e,
                other => StorageError::Append(other.to_string()),
            })
    }

    fn append_record(&mut self, record: &LogicalRecord, deflate: bool) -> Result<Position> {
        let entries: Vec<Entry> = self.serializer.serialize(record, deflate)?;
        let mut first_position = None;
        for entry in entries {
            let position = self
                .stream
                .append(entry)
                .map_err(|e| StorageError::Append(e.to_string()))?;
            first_position.get_or_insert(position);
        }
        first_position.ok_or_else(|| StorageError::Append("serializer produced no entries".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::testing::MemoryLog;
    use crate::external::Log;
    use storage_core::task::SchedulerMetadata;

    fn manager() -> StreamManager<crate::external::testing::MemoryStream> {
        let log = MemoryLog::new();
        StreamManager::new(log.open().unwrap(), StreamConfig::default())
    }

    #[test]
    fn empty_log_replays_to_nothing() {
        let mut mgr = manager();
        assert_eq!(mgr.read_from_beginning().unwrap(), vec![]);
    }

    #[test]
    fn transaction_round_trips_through_the_stream() {
        let mut mgr = manager();
        mgr.write_transaction(
            vec![Op::SaveFrameworkId {
                id: "fw-1".into(),
            }],
            1,
        )
        .unwrap();
        let records = mgr.read_from_beginning().unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], LogicalRecord::Transaction(_)));
    }

    #[test]
    fn snapshot_round_trips_and_expands_dedup_transparently() {
        let mut mgr = manager();
        let snapshot = Snapshot {
            timestamp_ms: 5,
            tasks: vec![],
            jobs: vec![],
            quotas: vec![],
            host_attributes: vec![],
            locks: vec![],
            job_updates: vec![],
            scheduler_metadata: SchedulerMetadata::default(),
        };
        mgr.write_snapshot(snapshot.clone()).unwrap();
        let records = mgr.read_from_beginning().unwrap();
        assert_eq!(records, vec![LogicalRecord::Snapshot(snapshot)]);
    }

    #[test]
    fn truncate_before_drops_prior_entries() {
        let mut mgr = manager();
        mgr.write_transaction(vec![Op::SaveFrameworkId { id: "1".into() }], 1)
            .unwrap();
        let second_position = mgr
            .write_transaction(vec![Op::SaveFrameworkId { id: "2".into() }], 1)
            .unwrap();
        mgr.truncate_before(second_position).unwrap();
        let records = mgr.read_from_beginning().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_transaction_is_rejected() {
        let mut mgr = manager();
        let err = mgr.write_transaction(vec![], 1).unwrap_err();
        assert!(matches!(err, StorageError::Append(_)));
    }
}
