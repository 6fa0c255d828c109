use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

pub type DeferredFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
pub type DeferredAction = Box<dyn FnOnce() -> DeferredFuture + Send + 'static>;

struct Entry {
    action: DeferredAction,
    /// Submitted by a caller that is allowed to run now; only waits for the
    /// work ahead of it.
    ready: bool,
}

#[derive(Default)]
struct Pending {
    entries: VecDeque<Entry>,
    draining: bool,
}

/// FIFO of side effects postponed until the host allows them.
///
/// Producers may enqueue concurrently. Drains are serialized, so actions run
/// one at a time in enqueue order, and each action is removed from the queue
/// before it runs. The queue counts as busy until the running action has
/// finished, so work submitted meanwhile lands behind it.
#[derive(Default)]
pub struct DeferredQueue {
    pending: Mutex<Pending>,
    drain_lock: tokio::sync::Mutex<()>,
}

fn boxed<F, Fut>(action: F) -> DeferredAction
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move || -> DeferredFuture { Box::pin(action()) })
}

impl DeferredQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.push(boxed(action));
    }

    pub fn push(&self, action: DeferredAction) {
        let mut pending = self.state();
        pending.entries.push_back(Entry {
            action,
            ready: false,
        });
        debug!(pending = pending.entries.len(), "deferred action queued");
    }

    /// Runs `action` now, after everything queued or running ahead of it.
    ///
    /// When a drain is already in progress (including when called from inside
    /// a deferred action) the action is handed to that drain and this returns
    /// without waiting for it.
    pub async fn run_in_order<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.submit(action) {
            self.drain_all().await;
        }
    }

    /// Queues `action` as runnable now. Returns `true` when no drain is in
    /// progress and the caller must run `drain_all` to get it executed.
    #[must_use]
    pub fn submit<F, Fut>(&self, action: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.state();
        pending.entries.push_back(Entry {
            action: boxed(action),
            ready: true,
        });
        if pending.draining {
            debug!("drain in progress; action handed over");
        }
        !pending.draining
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nothing queued and nothing running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let pending = self.state();
        pending.entries.is_empty() && !pending.draining
    }

    /// Runs every queued action, including ones queued while draining.
    /// Returns how many ran.
    pub async fn drain_all(&self) -> usize {
        let _drain = self.drain_lock.lock().await;
        self.begin_drain();
        let mut ran = 0;
        while let Some(action) = self.next(false) {
            action().await;
            ran += 1;
        }
        if ran > 0 {
            debug!(ran, "deferred actions drained");
        }
        ran
    }

    /// Runs the oldest queued action, if any. Work submitted through
    /// `run_in_order` while it ran is not left behind: it runs too, together
    /// with anything queued ahead of it.
    pub async fn drain_one(&self) -> bool {
        let _drain = self.drain_lock.lock().await;
        self.begin_drain();
        let Some(first) = self.next(false) else {
            return false;
        };
        first().await;
        let mut ran = 1;
        while let Some(action) = self.next(true) {
            action().await;
            ran += 1;
        }
        if ran > 1 {
            debug!(ran, "deferred actions drained");
        }
        true
    }

    fn state(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_drain(&self) {
        self.state().draining = true;
    }

    /// Pops the next action, or ends the drain when there is none. With
    /// `only_if_ready`, stops unless a ready entry is still waiting.
    fn next(&self, only_if_ready: bool) -> Option<DeferredAction> {
        let mut pending = self.state();
        let more = if only_if_ready {
            pending.entries.iter().any(|entry| entry.ready)
        } else {
            !pending.entries.is_empty()
        };
        if !more {
            pending.draining = false;
            return None;
        }
        pending.entries.pop_front().map(|entry| entry.action)
    }
}
