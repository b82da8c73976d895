//! The storage engine: ties the log, the wire format, transaction
//! coalescing, and replay dispatch into the four operations the
//! surrounding scheduler calls: `prepare`, `start`, `write`, and
//! `snapshot`.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use parking_lot::Mutex;
use tracing::{info, instrument};

use storage_concurrency::TransactionCoalescer;
use storage_core::{Result, StorageError};
use storage_durability::{Log, LogManager, Position, StreamManager};

use crate::config::EngineConfig;
use crate::replay::replay_record;
use crate::stores::{DomainStores, SnapshotSource};
use crate::writer::MutableStoreProvider;

/// Point-in-time counters describing what the engine has done since
/// construction. Not persisted; reset whenever the process restarts.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    pub records_replayed: u64,
    pub transactions_appended: u64,
    pub snapshots_written: u64,
    pub last_snapshot_position: Option<Position>,
}

/// Log-backed transactional storage engine.
///
/// `L` is the log transport, injected by the surrounding scheduler;
/// this crate never opens a file or socket itself.
pub struct StorageEngine<L: Log> {
    log_manager: LogManager<L>,
    stream: Mutex<Option<StreamManager<L::Stream>>>,
    coalescer: TransactionCoalescer,
    stores: DomainStores,
    snapshot_source: Box<dyn SnapshotSource>,
    config: EngineConfig,
    prepared: AtomicBool,
    started: AtomicBool,
    last_snapshot_ms: AtomicI64,
    stats: Mutex<EngineStats>,
}

impl<L: Log> StorageEngine<L> {
    pub fn new(
        log: L,
        stores: DomainStores,
        snapshot_source: Box<dyn SnapshotSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            log_manager: LogManager::new(log),
            stream: Mutex::new(None),
            coalescer: TransactionCoalescer::new(),
            stores,
            snapshot_source,
            config,
            prepared: AtomicBool::new(false),
            started: AtomicBool::new(false),
            last_snapshot_ms: AtomicI64::new(0),
            stats: Mutex::new(EngineStats::default()),
        }
    }

    /// Opens the log's stream. Idempotent: calling this more than once
    /// is a no-op.
    pub fn prepare(&self) -> Result<()> {
        if self.prepared.load(Ordering::Acquire) {
            return Ok(());
        }
        let mut guard = self.stream.lock();
        if guard.is_none() {
            *guard = Some(self.log_manager.open_stream(self.config.stream)?);
        }
        self.prepared.store(true, Ordering::Release);
        Ok(())
    }

    /// Replays every record from the beginning, then runs
    /// `initialization_work` inside the same write scope so its ops
    /// are appended as one transaction immediately after recovery.
    /// `now_ms` stamps the snapshot baseline so `snapshot_due` measures
    /// the first interval from start rather than from the epoch.
    /// Idempotent: calling this again after a successful `start` is a
    /// no-op.
    #[instrument(skip_all)]
    pub fn start(
        &self,
        now_ms: i64,
        initialization_work: impl FnOnce(&MutableStoreProvider) -> Result<()>,
    ) -> Result<()> {
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }
        self.prepare()?;

        let records = {
            let mut guard = self.stream.lock();
            guard.as_mut().expect("prepare populates stream").read_from_beginning()?
        };
        let record_count = records.len() as u64;

        let result = self.coalescer.write(
            move |sink| -> Result<()> {
                for record in records {
                    replay_record(record, &self.stores).map_err(|e| match e {
                        StorageError::Replay(msg) => StorageError::Replay(msg),
                        other => StorageError::Replay(other.to_string()),
                    })?;
                }
                let provider = MutableStoreProvider::new(&self.stores, sink);
                initialization_work(&provider)
            },
            |ops| self.append_transaction(ops.to_vec()),
        );

        if result.is_ok() {
            let mut stats = self.stats.lock();
            stats.records_replayed += record_count;
            self.started.store(true, Ordering::Release);
            self.last_snapshot_ms.store(now_ms, Ordering::Release);
            info!(records_replayed = record_count, "engine started");
        }
        result
    }

    /// Runs `work` inside a write scope. Nested calls from within
    /// `work` (directly or through callbacks) join this scope instead
    /// of appending their own transaction.
    pub fn write<T>(
        &self,
        work: impl FnOnce(&MutableStoreProvider) -> Result<T>,
    ) -> Result<T> {
        self.coalescer.write(
            move |sink| {
                let provider = MutableStoreProvider::new(&self.stores, sink);
                work(&provider)
            },
            |ops| self.append_transaction(ops.to_vec()),
        )
    }

    /// Runs a read-only closure straight against the domain stores, with
    /// no transaction scope and no op buffering. Callers that only need
    /// to query state should use this instead of `write` so a read
    /// never coalesces into, or blocks behind, a write scope's append.
    pub fn read<T>(&self, work: impl FnOnce(&DomainStores) -> T) -> T {
        work(&self.stores)
    }

    fn append_transaction(&self, ops: Vec<storage_core::Op>) -> Result<()> {
        let mut guard = self.stream.lock();
        let stream = guard.as_mut().expect("write scope requires prepare()");
        stream
            .write_transaction(ops, self.config.schema_version)
            .map(|_| ())?;
        self.stats.lock().transactions_appended += 1;
        Ok(())
    }

    /// Captures the current state via the injected [`SnapshotSource`],
    /// appends it, and truncates the log up to the snapshot's position.
    /// Serialized against write scopes by the same reentrant lock.
    #[instrument(skip_all)]
    pub fn snapshot(&self, timestamp_ms: i64) -> Result<Position> {
        self.coalescer.exclusive(|| {
            let snapshot = self.snapshot_source.capture(timestamp_ms)?;
            let mut guard = self.stream.lock();
            let stream = guard.as_mut().expect("snapshot requires prepare()");
            let position = stream.write_snapshot(snapshot)?;
            stream.truncate_before(position)?;
            self.last_snapshot_ms.store(timestamp_ms, Ordering::Release);
            let mut stats = self.stats.lock();
            stats.snapshots_written += 1;
            stats.last_snapshot_position = Some(position);
            info!(position, "snapshot written and log truncated");
            Ok(position)
        })
    }

    /// Whether enough wall-clock time has passed since the last
    /// snapshot (or engine start, if none has been taken yet) that the
    /// caller's periodic snapshot job should run.
    pub fn snapshot_due(&self, now_ms: i64) -> bool {
        let last = self.last_snapshot_ms.load(Ordering::Acquire);
        now_ms.saturating_sub(last) >= self.config.snapshot_interval_ms
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.lock().clone()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}
