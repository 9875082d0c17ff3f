//! Callbacks that can be fastened to a hook

use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;

use super::error::FailureReason;

type SyncFn<T> = dyn Fn(&T) -> Result<()> + Send + Sync;
type AsyncFn<T> = dyn Fn(T) -> BoxFuture<'static, Result<()>> + Send + Sync;

/// A callback declared either synchronous or asynchronous at construction.
///
/// Clones share identity: detaching by callback compares the underlying
/// allocation, so keep a clone of the value you fastened.
pub enum Callback<T> {
    /// Runs to completion on the invoking thread, borrowing the argument
    Sync(Arc<SyncFn<T>>),
    /// Returns a future that is awaited before the next callback starts.
    /// Receives its own clone of the argument.
    Async(Arc<AsyncFn<T>>),
}

impl<T> Callback<T> {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        Callback::Sync(Arc::new(f))
    }

    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
        T: 'static,
    {
        Callback::Async(Arc::new(move |arg| f(arg).boxed()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Callback::Async(_))
    }

    /// Identity comparison; true only for clones of the same callback
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        match (a, b) {
            (Callback::Sync(a), Callback::Sync(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Callback::Async(a), Callback::Async(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    /// Run from a synchronous invocation. Async callbacks are refused.
    pub(crate) fn call_blocking(&self, arg: &T) -> Result<(), FailureReason> {
        match self {
            Callback::Sync(f) => run_caught(|| f(arg)),
            Callback::Async(_) => Err(FailureReason::AsyncInSyncInvocation),
        }
    }
}

impl<T: Clone> Callback<T> {
    pub(crate) async fn call(&self, arg: &T) -> Result<(), FailureReason> {
        match self {
            Callback::Sync(f) => run_caught(|| f(arg)),
            Callback::Async(f) => {
                let fut = match catch_unwind(AssertUnwindSafe(|| f(arg.clone()))) {
                    Ok(fut) => fut,
                    Err(payload) => return Err(FailureReason::from_panic(payload)),
                };
                match AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(result) => result.map_err(FailureReason::Error),
                    Err(payload) => Err(FailureReason::from_panic(payload)),
                }
            }
        }
    }
}

fn run_caught(f: impl FnOnce() -> Result<()>) -> Result<(), FailureReason> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(FailureReason::Error),
        Err(payload) => Err(FailureReason::from_panic(payload)),
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Callback::Sync(f) => Callback::Sync(Arc::clone(f)),
            Callback::Async(f) => Callback::Async(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Sync(_) => f.write_str("Callback::Sync"),
            Callback::Async(_) => f.write_str("Callback::Async"),
        }
    }
}
