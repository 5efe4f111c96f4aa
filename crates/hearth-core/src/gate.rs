//! Per-resource coordination: keyed mutual exclusion and poll-until-ready.
//!
//! Locks serialize the short critical sections around shared per-resource
//! caches (one in-flight profile fetch per user, in-order sends per room).
//! The wait primitive parks a task until a resource that is expected to
//! appear eventually actually does, complaining on a cadence instead of
//! giving up.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::errors::CoreError;

/// Lazily created per-key locks. Entries are never removed; the table is
/// bounded by the number of distinct resource ids seen over the process
/// lifetime.
#[derive(Default)]
pub struct ResourceGate {
    locks: RefCell<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResourceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock dedicated to `key`, created on first request and reused
    /// thereafter. Release happens on guard drop, on every exit path.
    pub fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.locks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.borrow().is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    /// Warn after this many consecutive failed polls, and at every multiple
    /// thereafter. Zero disables the diagnostics.
    pub warn_after: u32,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            warn_after: 100,
        }
    }
}

impl WaitOptions {
    pub fn warn_after(mut self, attempts: u32) -> Self {
        self.warn_after = attempts;
        self
    }
}

/// Poll `check` on a fixed interval until it yields a value.
///
/// Never gives up: the resource is expected to eventually appear, and its
/// registration resolves the wait on the next poll. Progress diagnostics
/// carry the elapsed time and `context`. Dropping the returned future
/// cancels the wait; callers that need a deadline use
/// [`await_ready_timeout`] instead.
pub async fn await_ready<T>(
    mut check: impl FnMut() -> Option<T>,
    opts: WaitOptions,
    context: &str,
) -> T {
    let started = Instant::now();
    let mut failures: u32 = 0;

    loop {
        if let Some(value) = check() {
            return value;
        }

        failures += 1;
        if opts.warn_after > 0 && failures % opts.warn_after == 0 {
            tracing::warn!(
                context,
                elapsed_secs = started.elapsed().as_secs(),
                attempts = failures,
                "still waiting for resource"
            );
        }

        tokio::time::sleep(opts.poll_interval).await;
    }
}

/// [`await_ready`] under an external deadline. Expiry surfaces as
/// [`CoreError::ResourceUnavailable`] rather than an endless wait.
pub async fn await_ready_timeout<T>(
    check: impl FnMut() -> Option<T>,
    opts: WaitOptions,
    context: &str,
    deadline: Duration,
) -> Result<T, CoreError> {
    tokio::time::timeout(deadline, await_ready(check, opts, context))
        .await
        .map_err(|_| CoreError::ResourceUnavailable {
            context: context.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[test]
    fn lock_for_returns_the_same_lock_per_key() {
        let gate = ResourceGate::new();
        let first = gate.lock_for("@alice:example.org");
        let again = gate.lock_for("@alice:example.org");
        let other = gate.lock_for("@bob:example.org");

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(gate.len(), 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn at_most_one_holder_per_key() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let gate = Rc::new(ResourceGate::new());
                let active = Rc::new(Cell::new(0u32));
                let max_active = Rc::new(Cell::new(0u32));

                let mut handles = Vec::new();
                for _ in 0..32 {
                    let gate = Rc::clone(&gate);
                    let active = Rc::clone(&active);
                    let max_active = Rc::clone(&max_active);
                    handles.push(tokio::task::spawn_local(async move {
                        let lock = gate.lock_for("!room:example.org");
                        let _guard = lock.lock().await;
                        active.set(active.get() + 1);
                        max_active.set(max_active.get().max(active.get()));
                        // Yield inside the critical section so contenders get
                        // a chance to misbehave if the lock were broken.
                        tokio::task::yield_now().await;
                        tokio::task::yield_now().await;
                        active.set(active.get() - 1);
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }

                assert_eq!(max_active.get(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn await_ready_polls_until_value() {
        let calls = Cell::new(0u32);
        let value = await_ready(
            || {
                calls.set(calls.get() + 1);
                (calls.get() >= 5).then_some(42)
            },
            WaitOptions::default(),
            "test resource",
        )
        .await;

        assert_eq!(value, 42);
        assert_eq!(calls.get(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_expiry_maps_to_resource_unavailable() {
        let err = await_ready_timeout(
            || None::<u32>,
            WaitOptions::default(),
            "never ready",
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::ResourceUnavailable { .. }));
    }
}
