//! Shared vocabulary for the log-backed scheduler storage engine.
//!
//! This crate has no knowledge of the log transport, wire framing, or
//! concurrency discipline built on top of it in the other workspace
//! crates; it only defines the record/op/error types they all share.

pub mod error;
pub mod op;
pub mod record;
pub mod task;

pub use error::{Result, StorageError};
pub use op::Op;
pub use record::{DeduplicatedSnapshot, LogicalRecord, PartialSnapshot, Snapshot, Transaction};
pub use task::*;
