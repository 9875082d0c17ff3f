//! Hook dispatch engine

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::callback::Callback;
use super::error::{CallbackFailure, FailureReason};
use super::handle::{HookHandle, Slot, next_handle_id};
use super::lock;
use super::report::{FailureReporter, TracingReporter};

pub(crate) struct HookInner<T> {
    name: String,
    /// Insertion order; the `order` key is only applied when invoking
    slots: Mutex<Vec<Arc<Slot<T>>>>,
    reporter: Arc<dyn FailureReporter>,
}

impl<T> HookInner<T> {
    pub(crate) fn remove(&self, handle_id: u64) -> bool {
        let mut slots = lock(&self.slots);
        match slots.iter().position(|s| s.id == handle_id) {
            Some(index) => {
                slots.remove(index);
                debug!("Detached callback #{} from hook '{}'", handle_id, self.name);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, handle_id: u64) -> bool {
        lock(&self.slots).iter().any(|s| s.id == handle_id)
    }
}

/// A named extension point to which ordered callbacks are fastened.
///
/// Cloning a `Hook` yields another reference to the same hook.
pub struct Hook<T> {
    inner: Arc<HookInner<T>>,
}

impl<T> Hook<T> {
    /// Create a standalone hook reporting failures through `tracing`
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_reporter(name, Arc::new(TracingReporter::default()))
    }

    pub fn with_reporter(name: impl Into<String>, reporter: Arc<dyn FailureReporter>) -> Self {
        Self {
            inner: Arc::new(HookInner {
                name: name.into(),
                slots: Mutex::new(Vec::new()),
                reporter,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of attached callbacks
    pub fn len(&self) -> usize {
        lock(&self.inner.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach a callback. The same callback may be fastened several times;
    /// each call yields an independent handle.
    pub fn fasten(&self, callback: Callback<T>, order: Option<i64>) -> HookHandle<T> {
        let id = next_handle_id();
        let slot = Arc::new(Slot::new(id, order, callback));
        lock(&self.inner.slots).push(Arc::clone(&slot));
        debug!(
            "Fastened callback #{} to hook '{}' (order {:?})",
            id, self.inner.name, order
        );
        HookHandle::new(slot, Arc::downgrade(&self.inner))
    }

    /// Detach the first attachment of `callback` (by identity).
    /// Removes at most one attachment.
    pub fn detach(&self, callback: &Callback<T>) -> bool {
        let id = lock(&self.inner.slots)
            .iter()
            .find(|s| Callback::ptr_eq(&s.callback, callback))
            .map(|s| s.id);
        match id {
            Some(id) => self.inner.remove(id),
            None => false,
        }
    }

    /// Sorted copy of the attachments, each paired with the order it was
    /// sorted under. Later mutation of the hook or of a handle's order does
    /// not affect an invocation already holding a snapshot.
    fn snapshot(&self) -> Vec<(Option<i64>, Arc<Slot<T>>)> {
        let mut slots: Vec<_> = lock(&self.inner.slots)
            .iter()
            .map(|s| (s.order(), Arc::clone(s)))
            .collect();
        // stable: equal orders keep insertion order
        slots.sort_by_key(|(order, _)| order.unwrap_or(0));
        slots
    }

    /// Invoke every callback in order from the calling thread.
    ///
    /// Async callbacks are not run here and count as failures. Returns
    /// false if any callback failed; failures never stop the remaining
    /// callbacks.
    pub fn invoke(&self, arg: &T) -> bool {
        let slots = self.snapshot();
        debug!(
            "Invoking hook '{}' with {} callback(s)",
            self.inner.name,
            slots.len()
        );

        let mut failures = Vec::new();
        for (order, slot) in &slots {
            if let Err(reason) = slot.callback.call_blocking(arg) {
                failures.push(self.failure(slot, *order, reason));
            }
        }
        self.finish(failures, slots.len())
    }

    fn failure(
        &self,
        slot: &Slot<T>,
        order: Option<i64>,
        reason: FailureReason,
    ) -> CallbackFailure {
        CallbackFailure {
            hook: self.inner.name.clone(),
            handle_id: slot.id,
            order,
            reason,
        }
    }

    fn finish(&self, failures: Vec<CallbackFailure>, total: usize) -> bool {
        if failures.is_empty() {
            return true;
        }
        for failure in &failures {
            self.inner.reporter.report(failure);
        }
        self.inner
            .reporter
            .summarize(&self.inner.name, failures.len(), total);
        false
    }
}

impl<T: Clone + Send + Sync> Hook<T> {
    /// Invoke every callback in order, awaiting each before starting the
    /// next. Sync callbacks borrow `arg`, async callbacks receive a clone.
    pub async fn invoke_async(&self, arg: T) -> bool {
        let slots = self.snapshot();
        debug!(
            "Invoking hook '{}' asynchronously with {} callback(s)",
            self.inner.name,
            slots.len()
        );

        let mut failures = Vec::new();
        for (order, slot) in &slots {
            if let Err(reason) = slot.callback.call(&arg).await {
                failures.push(self.failure(slot, *order, reason));
            }
        }
        self.finish(failures, slots.len())
    }
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.inner.name)
            .field("callbacks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::MockFailureReporter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, label: &'static str) -> Callback<u32> {
        let log = Arc::clone(log);
        Callback::sync(move |_| {
            log.lock().unwrap().push(label);
            Ok(())
        })
    }

    fn quiet_hook(name: &str) -> Hook<u32> {
        let mut reporter = MockFailureReporter::new();
        reporter.expect_report().return_const(());
        reporter.expect_summarize().return_const(());
        Hook::with_reporter(name, Arc::new(reporter))
    }

    #[test]
    fn test_invoke_empty_hook_succeeds() {
        let hook = Hook::<u32>::new("empty");
        assert!(hook.is_empty());
        assert!(hook.invoke(&1));
    }

    #[test]
    fn test_each_callback_runs_once() {
        let hook = Hook::<u32>::new("count");
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let calls = Arc::clone(&calls);
            hook.fasten(
                Callback::sync(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
                None,
            );
        }

        assert_eq!(hook.len(), 4);
        assert!(hook.invoke(&0));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_order_sorts_ascending() {
        let hook = Hook::<u32>::new("ordered");
        let log = Log::default();
        hook.fasten(recorder(&log, "five"), Some(5));
        hook.fasten(recorder(&log, "one"), Some(1));
        hook.fasten(recorder(&log, "three"), Some(3));

        assert!(hook.invoke(&0));
        assert_eq!(*log.lock().unwrap(), vec!["one", "three", "five"]);
    }

    #[test]
    fn test_equal_and_missing_orders_keep_insertion_order() {
        let hook = Hook::<u32>::new("stable");
        let log = Log::default();
        hook.fasten(recorder(&log, "a"), None);
        hook.fasten(recorder(&log, "b"), Some(0));
        hook.fasten(recorder(&log, "c"), None);
        hook.fasten(recorder(&log, "first"), Some(-1));

        hook.invoke(&0);
        assert_eq!(*log.lock().unwrap(), vec!["first", "a", "b", "c"]);
    }

    #[test]
    fn test_set_order_applies_to_next_invocation() {
        let hook = Hook::<u32>::new("reorder");
        let log = Log::default();
        let a = hook.fasten(recorder(&log, "a"), None);
        hook.fasten(recorder(&log, "b"), None);

        a.set_order(Some(10));
        hook.invoke(&0);
        assert_eq!(*log.lock().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_failure_reports_order_sorted_under() {
        let mut reporter = MockFailureReporter::new();
        reporter
            .expect_report()
            .withf(|f| f.order == Some(1))
            .times(1)
            .return_const(());
        reporter.expect_summarize().times(1).return_const(());
        let hook = Hook::<u32>::with_reporter("reordering", Arc::new(reporter));

        let own_handle: Arc<Mutex<Option<HookHandle<u32>>>> = Arc::default();
        let slot = Arc::clone(&own_handle);
        let handle = hook.fasten(
            Callback::sync(move |_| {
                if let Some(handle) = slot.lock().unwrap().as_ref() {
                    handle.set_order(Some(99));
                }
                anyhow::bail!("failed after reordering")
            }),
            Some(1),
        );
        *own_handle.lock().unwrap() = Some(handle.clone());

        assert!(!hook.invoke(&0));
        assert_eq!(handle.order(), Some(99));
    }

    #[test]
    fn test_detach_by_callback_removes_one_attachment() {
        let hook = Hook::<u32>::new("dupes");
        let calls = Arc::new(AtomicUsize::new(0));
        let cb = {
            let calls = Arc::clone(&calls);
            Callback::sync(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        hook.fasten(cb.clone(), None);
        hook.fasten(cb.clone(), None);

        assert!(hook.detach(&cb));
        hook.invoke(&0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(hook.detach(&cb));
        assert!(!hook.detach(&cb));
        assert!(hook.is_empty());
    }

    #[test]
    fn test_detach_unknown_callback() {
        let hook = Hook::<u32>::new("other");
        hook.fasten(Callback::sync(|_| Ok(())), None);
        assert!(!hook.detach(&Callback::sync(|_| Ok(()))));
        assert_eq!(hook.len(), 1);
    }

    #[test]
    fn test_failures_do_not_stop_siblings() {
        let mut reporter = MockFailureReporter::new();
        reporter
            .expect_report()
            .withf(|f| f.hook == "faulty" && f.order == Some(1))
            .times(1)
            .return_const(());
        reporter
            .expect_summarize()
            .withf(|hook, failed, total| hook == "faulty" && *failed == 1 && *total == 3)
            .times(1)
            .return_const(());
        let hook = Hook::with_reporter("faulty", Arc::new(reporter));

        let log = Log::default();
        hook.fasten(recorder(&log, "before"), Some(0));
        hook.fasten(Callback::sync(|_| anyhow::bail!("broken")), Some(1));
        hook.fasten(recorder(&log, "after"), Some(2));

        assert!(!hook.invoke(&0));
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let hook = quiet_hook("panics");
        let log = Log::default();
        hook.fasten(
            Callback::sync(|_| -> anyhow::Result<()> { panic!("exploded") }),
            None,
        );
        hook.fasten(recorder(&log, "survivor"), None);

        assert!(!hook.invoke(&0));
        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }

    #[test]
    fn test_sync_invoke_reports_async_callbacks() {
        let mut reporter = MockFailureReporter::new();
        reporter
            .expect_report()
            .withf(|f| matches!(f.reason, FailureReason::AsyncInSyncInvocation))
            .times(1)
            .return_const(());
        reporter.expect_summarize().times(1).return_const(());
        let hook = Hook::with_reporter("mixed", Arc::new(reporter));

        let log = Log::default();
        hook.fasten(Callback::asynchronous(|_| async { Ok(()) }), None);
        hook.fasten(recorder(&log, "sync"), None);

        assert!(!hook.invoke(&0));
        assert_eq!(*log.lock().unwrap(), vec!["sync"]);
    }

    #[test]
    fn test_detach_during_invocation_uses_snapshot() {
        let hook = Hook::<u32>::new("snapshot");
        let log = Log::default();
        let victim = recorder(&log, "victim");

        let detacher = {
            let hook = hook.clone();
            let victim = victim.clone();
            Callback::sync(move |_| {
                hook.detach(&victim);
                Ok(())
            })
        };
        hook.fasten(detacher, Some(0));
        hook.fasten(victim, Some(1));

        // the in-flight invocation still sees the victim
        assert!(hook.invoke(&0));
        assert_eq!(*log.lock().unwrap(), vec!["victim"]);
        assert_eq!(hook.len(), 1);

        hook.invoke(&0);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reentrant_invocation() {
        let hook = Hook::<u32>::new("reentrant");
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = hook.clone();
        let counter = Arc::clone(&calls);
        hook.fasten(
            Callback::sync(move |depth| {
                counter.fetch_add(1, Ordering::SeqCst);
                if *depth < 2 {
                    inner.invoke(&(depth + 1));
                }
                Ok(())
            }),
            None,
        );

        assert!(hook.invoke(&0));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invoke_async_is_sequential() {
        let hook = Hook::<u32>::new("sequential");
        let log = Log::default();

        let slow = {
            let log = Arc::clone(&log);
            Callback::asynchronous(move |_| {
                let log = Arc::clone(&log);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    log.lock().unwrap().push("slow");
                    Ok(())
                }
            })
        };
        hook.fasten(recorder(&log, "last"), Some(2));
        hook.fasten(slow, Some(1));

        assert!(hook.invoke_async(7).await);
        assert_eq!(*log.lock().unwrap(), vec!["slow", "last"]);
    }

    #[tokio::test]
    async fn test_invoke_async_collects_rejections() {
        let hook = quiet_hook("rejecting");
        let log = Log::default();
        hook.fasten(
            Callback::asynchronous(|n: u32| async move {
                Err::<(), _>(anyhow::anyhow!("rejected {n}"))
            }),
            None,
        );
        hook.fasten(recorder(&log, "still runs"), None);

        assert!(!hook.invoke_async(1).await);
        assert_eq!(*log.lock().unwrap(), vec!["still runs"]);
    }

    #[tokio::test]
    async fn test_invoke_async_passes_argument() {
        let hook = Hook::<String>::new("args");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        hook.fasten(
            Callback::asynchronous(move |s: String| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(s);
                    Ok(())
                }
            }),
            None,
        );

        assert!(hook.invoke_async("payload".to_string()).await);
        assert_eq!(*seen.lock().unwrap(), vec!["payload".to_string()]);
    }
}
