//! Reentrant transaction coalescing for the scheduler storage engine.
//!
//! This crate knows nothing about the log or the wire format; it only
//! implements the discipline that lets nested `write` calls on the
//! same thread join one outer transaction instead of each appending
//! their own.

pub mod coalescer;

pub use coalescer::{OpSink, TransactionCoalescer};
