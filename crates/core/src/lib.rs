//! Hooksie Core — named hooks, ordered callbacks, and scopes.
//!
//! Callbacks are fastened to a [`Hook`](hooks::Hook) and run in `order` when
//! the hook is invoked. Hooks are grouped into uniquely named
//! [`HooksScope`](hooks::HooksScope)s, and the [`registry`] module provides a
//! process-wide default scope for top-level use.

pub mod config;
pub mod hooks;
pub mod registry;

pub use config::HooksConfig;
pub use hooks::{Callback, Hook, HookError, HookHandle, HooksScope};
pub use registry::Hooksie;
