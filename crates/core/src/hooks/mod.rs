//! Named hooks with ordered callbacks, grouped into scopes
//!
//! A [`Hook`] owns the callbacks fastened to one named event. Invoking it
//! calls each callback with the argument, lowest `order` first (absent = 0,
//! ties keep attachment order). A failing callback never stops its
//! siblings; failures go to the hook's [`FailureReporter`] and the invoke
//! call returns `false`.
//!
//! ```
//! use hooksie_core::hooks::{Callback, HooksScope};
//!
//! let scope = HooksScope::new(Some("demo"));
//! let send_info = scope.hook::<String>("sendInfo").unwrap();
//!
//! let handle = send_info.fasten(Callback::sync(|info: &String| {
//!     println!("info: {info}");
//!     Ok(())
//! }), None);
//!
//! assert!(send_info.invoke(&"hello".to_string()));
//! assert!(handle.detach());
//! ```
//!
//! [`HooksScope`] keeps hook names unique and forwards fasten/detach by
//! name. The process-wide default scope lives in [`crate::registry`].

mod callback;
mod error;
mod handle;
mod hook;
mod report;
mod scope;

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use callback::Callback;
pub use error::{CallbackFailure, FailureReason, HookError};
pub use handle::HookHandle;
pub use hook::Hook;
pub use report::{FailureReporter, ReportLevel, TracingReporter};
pub use scope::HooksScope;

#[cfg(test)]
pub(crate) use report::MockFailureReporter;

// Callbacks never run under these locks, so a poisoned lock still holds
// consistent data.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}
