//! Unified error type for the storage engine.
//!
//! Mirrors the error kinds enumerated by the design: coding, framing,
//! dedup, replay, append, and store errors each carry enough context to
//! diagnose a corrupt log without re-deriving it from a bare string.

use thiserror::Error;

/// Errors produced anywhere in the storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Malformed bytes encountered during `decode`.
    #[error("coding error at record tag {tag:?}: {detail}")]
    Coding {
        /// Wire tag byte of the record being decoded, if one was read.
        tag: Option<u8>,
        /// Human-readable detail.
        detail: String,
    },

    /// A frame sequence violated the header/chunk contract or a digest
    /// failed to verify.
    #[error("framing error: {0}")]
    Framing(String),

    /// A deduplicated snapshot referenced a task config digest that has
    /// no backing entry.
    #[error("dedup error: task {task_id} references missing config digest {digest:032x}")]
    Dedup {
        /// Task whose config reference could not be resolved.
        task_id: String,
        /// The digest that was looked up.
        digest: u128,
    },

    /// An op variant had no registered replay handler, or a handler
    /// raised an error while applying a record during recovery.
    #[error("replay error: {0}")]
    Replay(String),

    /// The underlying log failed to append or truncate.
    #[error("append error: {0}")]
    Append(String),

    /// A domain store call failed during a live write.
    #[error("store error: {0}")]
    Store(String),

    /// I/O failure from the underlying log transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine was misconfigured.
    #[error("config error: {0}")]
    Config(String),
}

impl StorageError {
    /// Errors that must abort `start()` during recovery (spec.md §7).
    ///
    /// `Noop` records and unrecognized record kinds are skipped rather
    /// than surfaced as errors, so they never reach this classification.
    pub fn is_fatal_during_recovery(&self) -> bool {
        matches!(
            self,
            StorageError::Coding { .. } | StorageError::Framing(_) | StorageError::Replay(_)
        )
    }

    /// Whether a store call failed without having appended anything;
    /// callers may retry the whole `write` safely.
    pub fn is_store_error(&self) -> bool {
        matches!(self, StorageError::Store(_))
    }

    /// An `AppendError` after a successful store mutation leaves the
    /// store ahead of the log; per spec.md §7 this is always fatal.
    pub fn is_append_error(&self) -> bool {
        matches!(self, StorageError::Append(_))
    }
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StorageError>;
