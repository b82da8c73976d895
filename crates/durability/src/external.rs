//! The log transport boundary.
//!
//! The raw append-only log is owned by the surrounding cluster
//! scheduler, not this crate: `Log` and `Stream` are the interfaces the
//! durability layer consumes. Production code injects a real
//! implementation; `MemoryLog` here exists only so the rest of the
//! workspace has something to test against.

use storage_core::Result;

/// Byte offset into a stream, opaque outside the log transport.
pub type Position = u64;

/// A single physical entry as stored on the wire.
pub type Entry = Vec<u8>;

/// Opens the single stream backing this engine instance.
pub trait Log: Send + Sync {
    /// The stream type this log hands out.
    type Stream: Stream;

    /// Opens (or creates) the log's one stream.
    fn open(&self) -> Result<Self::Stream>;
}

/// An append-only sequence of physical entries.
pub trait Stream: Send {
    /// Reads every entry from the beginning, in append order.
    fn read_all(&mut self) -> Result<Vec<Entry>>;

    /// Appends one physical entry, returning its position.
    fn append(&mut self, entry: Entry) -> Result<Position>;

    /// Discards all entries strictly before `position`.
    fn truncate_before(&mut self, position: Position) -> Result<()>;
}

/// Durable storage for periodic snapshots, keyed only by recency.
pub trait SnapshotStore<S>: Send + Sync {
    /// Persists a snapshot and the log position it was taken at.
    fn save(&self, snapshot: &S, position: Position) -> Result<()>;

    /// Loads the most recently saved snapshot, if any.
    fn load_latest(&self) -> Result<Option<(S, Position)>>;
}

/// In-memory [`Log`]/[`Stream`] double used by the test suites across
/// this workspace. Not part of the engine's production surface.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Shared backing storage for a [`MemoryLog`], so tests can reopen
    /// the same log to exercise recovery.
    #[derive(Clone, Default)]
    pub struct MemoryLogState(Arc<Mutex<Vec<Entry>>>);

    impl MemoryLogState {
        pub fn new() -> Self {
            Self::default()
        }
    }

    /// A [`Log`] backed by an in-process `Vec<Entry>`.
    #[derive(Clone)]
    pub struct MemoryLog {
        state: MemoryLogState,
    }

    impl MemoryLog {
        pub fn new() -> Self {
            Self {
                state: MemoryLogState::new(),
            }
        }

        pub fn from_state(state: MemoryLogState) -> Self {
            Self { state }
        }

        pub fn state(&self) -> MemoryLogState {
            self.state.clone()
        }
    }

    impl Default for MemoryLog {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Log for MemoryLog {
        type Stream = MemoryStream;

        fn open(&self) -> Result<Self::Stream> {
            Ok(MemoryStream {
                state: self.state.clone(),
            })
        }
    }

    /// The [`Stream`] half of [`MemoryLog`].
    pub struct MemoryStream {
        state: MemoryLogState,
    }

    impl Stream for MemoryStream {
        fn read_all(&mut self) -> Result<Vec<Entry>> {
            Ok(self.state.0.lock().clone())
        }

        fn append(&mut self, entry: Entry) -> Result<Position> {
            let mut entries = self.state.0.lock();
            let position = entries.len() as Position;
            entries.push(entry);
            Ok(position)
        }

        fn truncate_before(&mut self, position: Position) -> Result<()> {
            let mut entries = self.state.0.lock();
            if (position as usize) <= entries.len() {
                entries.drain(0..position as usize);
            }
            Ok(())
        }
    }
}
