//! Deferred-dispatch scheduling.
//!
//! Directives promoted out of the pending queue are not handed to their
//! listeners inline; the sequencer batches them and flushes the batch on
//! the host loop's next idle slot. That keeps a burst of `complete()` calls
//! from recursing into listener callbacks and guarantees the caller's own
//! logic finishes before a promoted directive runs.
//!
//! [`IdleScheduler`] abstracts over the host loop. The sequencer arms at
//! most one flush at a time; implementations only need to run the callback
//! once, after the current unit of host work has returned.

use std::sync::Mutex;

use tracing::debug;

/// A one-shot deferred flush callback armed by the sequencer.
pub type IdleCallback = Box<dyn FnOnce() + Send + 'static>;

/// Hands a flush callback to the owning event loop to run at its next idle
/// slot.
///
/// The sequencer guarantees at most one callback is outstanding at a time,
/// so implementations never need to coalesce.
pub trait IdleScheduler: Send + Sync {
    /// Queue `flush` to run after the current unit of host work completes.
    fn schedule(&self, flush: IdleCallback);
}

/// Tokio-backed scheduler: the flush runs as a freshly spawned task, i.e.
/// after the currently executing task yields.
///
/// Must be used from within a tokio runtime context.
#[derive(Debug, Default)]
pub struct TokioIdleScheduler;

impl TokioIdleScheduler {
    /// Create a tokio idle scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl IdleScheduler for TokioIdleScheduler {
    fn schedule(&self, flush: IdleCallback) {
        debug!("arming idle flush on tokio task queue");
        tokio::spawn(async move {
            flush();
        });
    }
}

/// Manually pumped scheduler for tests and embedders that drive their own
/// loop: armed callbacks are held until [`run_pending`](Self::run_pending)
/// is called.
#[derive(Default)]
pub struct ManualIdleScheduler {
    pending: Mutex<Vec<IdleCallback>>,
}

impl ManualIdleScheduler {
    /// Create a manual scheduler with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed callbacks not yet run.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Run every armed callback, in arming order. Callbacks armed while
    /// running are picked up too (the drain loops until quiescent).
    /// Returns the number of callbacks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch = std::mem::take(&mut *self.pending.lock().unwrap());
            if batch.is_empty() {
                return ran;
            }
            for flush in batch {
                flush();
                ran += 1;
            }
        }
    }
}

impl IdleScheduler for ManualIdleScheduler {
    fn schedule(&self, flush: IdleCallback) {
        self.pending.lock().unwrap().push(flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn manual_scheduler_holds_until_pumped() {
        let sched = ManualIdleScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        sched.schedule(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(sched.pending_count(), 1);

        assert_eq!(sched.run_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(sched.pending_count(), 0);
        // nothing left to run
        assert_eq!(sched.run_pending(), 0);
    }

    #[test]
    fn manual_scheduler_drains_rearmed_callbacks() {
        let sched = Arc::new(ManualIdleScheduler::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_sched = sched.clone();
        let h = hits.clone();
        sched.schedule(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
            let h2 = h.clone();
            inner_sched.schedule(Box::new(move || {
                h2.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        assert_eq!(sched.run_pending(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn tokio_scheduler_runs_after_yield() {
        let sched = TokioIdleScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        sched.schedule(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // give the spawned flush a chance to run
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
