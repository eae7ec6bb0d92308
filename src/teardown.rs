//! Teardown registry: cleanup hooks that must run once, at the latest when the process winds down.
//!
//! Every fixture registers itself here when it is created. The registry only holds weak references, so a fixture
//! that was dropped (and therefore already cleaned up) simply disappears from it. Hooks may run more than once,
//! through an explicit `destroy`, a `Drop`, and the registry, so they must be idempotent.
//!
//! Rust has no at-exit callbacks; [`install`] returns an [`ExitGuard`] that runs the process-wide registry when
//! it goes out of scope at the end of `main` (or of a test harness).

use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use crate::error::{FixtureError, FixtureResult};

/// A cleanup action that tolerates being run more than once.
pub trait Teardown: Send + Sync {
    fn teardown(&self) -> FixtureResult<()>;
}

/// A set of registered cleanup hooks.
#[derive(Default)]
pub struct TeardownRegistry {
    hooks: Mutex<Vec<Weak<dyn Teardown>>>,
}

impl TeardownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. Dead hooks are pruned on the way.
    pub fn register(&self, hook: Weak<dyn Teardown>) {
        let mut hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
        hooks.retain(|h| h.strong_count() > 0);
        hooks.push(hook);
    }

    /// Number of hooks whose owner is still alive.
    pub fn len(&self) -> usize {
        let hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
        hooks.iter().filter(|h| h.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every live hook once and forget all of them.
    ///
    /// A failing hook does not stop the others.
    ///
    /// ## Returns
    /// - The errors of the hooks that failed, in registration order.
    pub fn run_all(&self) -> Vec<FixtureError> {
        // Hooks run outside the lock so they may register or inspect the registry themselves.
        let hooks = std::mem::take(&mut *self.hooks.lock().unwrap_or_else(PoisonError::into_inner));
        hooks
            .iter()
            .filter_map(Weak::upgrade)
            .filter_map(|hook| hook.teardown().err())
            .collect()
    }
}

/// The process-wide registry used by fixtures that were not given one.
pub fn global() -> &'static Arc<TeardownRegistry> {
    static GLOBAL: OnceLock<Arc<TeardownRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(TeardownRegistry::new()))
}

/// Runs a registry when dropped.
#[must_use = "the registry runs when the guard is dropped"]
pub struct ExitGuard {
    registry: Arc<TeardownRegistry>,
}

impl ExitGuard {
    pub fn new(registry: Arc<TeardownRegistry>) -> Self {
        Self { registry }
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        for err in self.registry.run_all() {
            tracing::warn!("teardown failed: {}", err);
        }
    }
}

/// Guard running the [`global`] registry at the end of its scope.
pub fn install() -> ExitGuard {
    ExitGuard::new(Arc::clone(global()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counter {
        runs: AtomicUsize,
        fail: bool,
    }

    impl Teardown for Counter {
        fn teardown(&self) -> FixtureResult<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FixtureError::Server("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    fn weak(hook: &Arc<Counter>) -> Weak<dyn Teardown> {
        let weak: Weak<Counter> = Arc::downgrade(hook);
        weak
    }

    #[test]
    fn test_run_all_runs_each_hook_once() {
        let registry = TeardownRegistry::new();
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        registry.register(weak(&a));
        registry.register(weak(&b));
        assert_eq!(registry.len(), 2);

        assert!(registry.run_all().is_empty());
        assert!(registry.run_all().is_empty());
        assert_eq!(a.runs.load(Ordering::SeqCst), 1);
        assert_eq!(b.runs.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_hooks_are_skipped() {
        let registry = TeardownRegistry::new();
        let gone = Arc::new(Counter::default());
        registry.register(weak(&gone));
        drop(gone);
        assert_eq!(registry.len(), 0);
        assert!(registry.run_all().is_empty());
    }

    #[test]
    fn test_failures_are_collected() {
        let registry = TeardownRegistry::new();
        let bad = Arc::new(Counter { fail: true, ..Counter::default() });
        let good = Arc::new(Counter::default());
        registry.register(weak(&bad));
        registry.register(weak(&good));

        let errors = registry.run_all();
        assert_eq!(errors.len(), 1);
        assert_eq!(good.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exit_guard_runs_registry() {
        let registry = Arc::new(TeardownRegistry::new());
        let hook = Arc::new(Counter::default());
        registry.register(weak(&hook));
        drop(ExitGuard::new(Arc::clone(&registry)));
        assert_eq!(hook.runs.load(Ordering::SeqCst), 1);
    }
}
