//! Reentrant transaction coalescing.
//!
//! A single engine-wide reentrant mutex serializes write scopes.
//! Nested `write` calls on the same thread join the outermost scope
//! instead of blocking on themselves; every op pushed through the
//! [`OpSink`], from any nesting depth, lands in one buffer that is
//! appended as a single transaction when the outermost scope completes.

use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use tracing::trace;

use storage_core::Op;

struct ScopeState {
    depth: u32,
    buffer: Vec<Op>,
}

/// Coalesces nested write scopes on the same thread into one
/// transaction.
pub struct TransactionCoalescer {
    lock: ReentrantMutex<RefCell<ScopeState>>,
}

impl Default for TransactionCoalescer {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionCoalescer {
    pub fn new() -> Self {
        Self {
            lock: ReentrantMutex::new(RefCell::new(ScopeState {
                depth: 0,
                buffer: Vec::new(),
            })),
        }
    }

    /// Runs `work` inside a (possibly nested) write scope, then, only if
    /// this call is the outermost one, invokes `on_commit` with the
    /// full, ordered op buffer while still holding the scope lock, so
    /// the append and the next write scope can never interleave.
    ///
    /// If `work` fails, the buffer accumulated by this call (and any
    /// scopes nested inside it) is discarded without ever reaching
    /// `on_commit`; partial, inconsistent transactions are never
    /// appended.
    pub fn write<T, E>(
        &self,
        work: impl FnOnce(&OpSink) -> Result<T, E>,
        on_commit: impl FnOnce(&[Op]) -> Result<(), E>,
    ) -> Result<T, E> {
        let guard = self.lock.lock();
        let depth = {
            let mut state = guard.borrow_mut();
            state.depth += 1;
            state.depth
        };
        trace!(depth, "write scope opened");

        let sink = OpSink { lock: &self.lock };
        let result = work(&sink);

        let mut state = guard.borrow_mut();
        state.depth -= 1;
        let is_outermost = state.depth == 0;

        match result {
            Ok(value) => {
                if is_outermost {
                    let ops = std::mem::take(&mut state.buffer);
                    drop(state);
                    if !ops.is_empty() {
                        trace!(op_count = ops.len(), "outermost write scope committing");
                        on_commit(&ops)?;
                    }
                }
                Ok(value)
            }
            Err(e) => {
                if is_outermost {
                    trace!("outermost write scope discarded on error");
                    state.buffer.clear();
                }
                Err(e)
            }
        }
    }

    /// Runs `f` while holding the same scope lock `write` uses, without
    /// participating in op coalescing. Used to serialize snapshot
    /// writes against outermost write scopes.
    pub fn exclusive<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.lock.lock();
        f()
    }

    /// Current nesting depth on the calling thread; zero outside any
    /// scope. Exposed for tests.
    #[cfg(test)]
    fn depth(&self) -> u32 {
        self.lock.lock().borrow().depth
    }
}

/// Handle passed into a `TransactionCoalescer::write` closure; pushes
/// ops into the scope's shared buffer in call order, including ops
/// pushed from scopes nested inside this one.
pub struct OpSink<'a> {
    lock: &'a ReentrantMutex<RefCell<ScopeState>>,
}

impl<'a> OpSink<'a> {
    /// Appends `op` to the current scope's buffer. Ops that represent
    /// "no change" (e.g. an `unsafe_modify_in_place` that returned
    /// `false`) must not be pushed; the caller decides that before
    /// calling `push`.
    ///
    /// Re-enters the same reentrant scope lock the enclosing `write`
    /// call is already holding on this thread, so this never blocks.
    pub fn push(&self, op: Op) {
        let guard = self.lock.lock();
        guard.borrow_mut().buffer.push(op);
    }

    /// Appends every op in `ops`, in order.
    pub fn push_all(&self, ops: impl IntoIterator<Item = Op>) {
        let guard = self.lock.lock();
        guard.borrow_mut().buffer.extend(ops);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outermost_scope_commits_its_ops() {
        let coalescer = TransactionCoalescer::new();
        let mut committed = None;
        let result: Result<(), ()> = coalescer.write(
            |sink| {
                sink.push(Op::SaveFrameworkId { id: "fw-1".into() });
                Ok(())
            },
            |ops| {
                committed = Some(ops.to_vec());
                Ok(())
            },
        );
        result.unwrap();
        assert_eq!(
            committed,
            Some(vec![Op::SaveFrameworkId { id: "fw-1".into() }])
        );
    }

    #[test]
    fn nested_scope_joins_the_outer_buffer() {
        let coalescer = TransactionCoalescer::new();
        let mut commits = Vec::new();
        let result: Result<(), ()> = coalescer.write(
            |outer| {
                outer.push(Op::SaveFrameworkId { id: "1".into() });
                let inner: Result<(), ()> = coalescer.write(
                    |inner_sink| {
                        inner_sink.push(Op::SaveFrameworkId { id: "2".into() });
                        Ok(())
                    },
                    |ops| {
                        commits.push(ops.to_vec());
                        Ok(())
                    },
                );
                inner.unwrap();
                outer.push(Op::SaveFrameworkId { id: "3".into() });
                Ok(())
            },
            |ops| {
                commits.push(ops.to_vec());
                Ok(())
            },
        );
        result.unwrap();
        // The nested scope never commits on its own; only one commit,
        // from the outermost scope, carrying all three ops in order.
        assert_eq!(commits.len(), 1);
        assert_eq!(
            commits[0],
            vec![
                Op::SaveFrameworkId { id: "1".into() },
                Op::SaveFrameworkId { id: "2".into() },
                Op::SaveFrameworkId { id: "3".into() },
            ]
        );
    }

    #[test]
    fn empty_buffer_never_calls_commit() {
        let coalescer = TransactionCoalescer::new();
        let mut called = false;
        let result: Result<(), ()> = coalescer.write(
            |_sink| Ok(()),
            |_ops| {
                called = true;
                Ok(())
            },
        );
        result.unwrap();
        assert!(!called);
    }

    #[test]
    fn failed_work_discards_buffer_without_committing() {
        let coalescer = TransactionCoalescer::new();
        let mut called = false;
        let result: Result<(), &str> = coalescer.write(
            |sink| {
                sink.push(Op::SaveFrameworkId { id: "1".into() });
                Err("boom")
            },
            |_ops| {
                called = true;
                Ok(())
            },
        );
        assert_eq!(result, Err("boom"));
        assert!(!called);
        assert_eq!(coalescer.depth(), 0);
    }

    proptest::proptest! {
        #[test]
        fn commit_buffer_matches_push_order(ids in proptest::collection::vec(".*", 0..20)) {
            let coalescer = TransactionCoalescer::new();
            let mut committed = None;
            let result: Result<(), ()> = coalescer.write(
                |sink| {
                    for id in &ids {
                        sink.push(Op::SaveFrameworkId { id: id.clone() });
                    }
                    Ok(())
                },
                |ops| {
                    committed = Some(ops.to_vec());
                    Ok(())
                },
            );
            result.unwrap();
            let expected: Vec<Op> = ids.into_iter().map(|id| Op::SaveFrameworkId { id }).collect();
            if expected.is_empty() {
                proptest::prop_assert_eq!(committed, None);
            } else {
                proptest::prop_assert_eq!(committed, Some(expected));
            }
        }
    }
}
