//! Guaranteed resource release.

use std::sync::{Arc, Mutex};

type Callback = Box<dyn FnOnce() + Send>;

/// Scoped cleanup registrations with guaranteed release.
///
/// Callbacks registered here run exactly once when the guard drops,
/// regardless of how the owning scope exits (success, early return, error,
/// or cancellation). Registration order is preserved; callbacks run in
/// reverse, so later acquisitions release first.
#[derive(Clone, Default)]
pub struct CleanupGuard {
    callbacks: Arc<Mutex<Vec<Callback>>>,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback to run at release time.
    pub fn register<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self.callbacks.lock() {
            Ok(mut callbacks) => callbacks.push(Box::new(callback)),
            Err(mut poisoned) => poisoned.get_mut().push(Box::new(callback)),
        }
    }

    /// Run all registered callbacks now instead of at drop.
    pub fn release(&self) {
        let mut callbacks = match self.callbacks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        while let Some(callback) = callbacks.pop() {
            callback();
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Only the last clone runs the callbacks
        if Arc::strong_count(&self.callbacks) == 1 {
            self.release();
        }
    }
}

impl std::fmt::Debug for CleanupGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CleanupGuard")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callbacks_run_on_drop() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let guard = CleanupGuard::new();
            let counter = Arc::clone(&counter);
            guard.register(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callbacks_run_once_despite_clones() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let guard = CleanupGuard::new();
            let cloned = guard.clone();
            let cb_counter = Arc::clone(&counter);
            guard.register(move || {
                cb_counter.fetch_add(1, Ordering::SeqCst);
            });
            drop(cloned);
            assert_eq!(counter.load(Ordering::SeqCst), 0, "clone must not release");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_then_drop_is_single_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = CleanupGuard::new();
        {
            let counter = Arc::clone(&counter);
            guard.register(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        guard.release();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        drop(guard);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_order_is_reverse_of_registration() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let guard = CleanupGuard::new();
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            guard.register(move || {
                order.lock().expect("order lock").push(label);
            });
        }
        guard.release();
        let recorded = order.lock().expect("order lock").clone();
        assert_eq!(recorded, vec!["third", "second", "first"]);
    }
}
