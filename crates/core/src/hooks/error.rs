//! Error types for hook registration and dispatch

use thiserror::Error;

/// Structural errors raised immediately to the caller of a scope operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("scope \"{scope}\" already contains a hook named \"{name}\"")]
    DuplicateHookName { scope: String, name: String },

    #[error("scope \"{scope}\" has no hook named \"{name}\"")]
    UnknownHookName { scope: String, name: String },

    #[error("hook \"{name}\" in scope \"{scope}\" was created for a different argument type")]
    HookTypeMismatch { scope: String, name: String },
}

/// Why a single callback failed during an invocation
#[derive(Error, Debug)]
pub enum FailureReason {
    #[error("{0:#}")]
    Error(anyhow::Error),

    #[error("panicked: {0}")]
    Panic(String),

    #[error("asynchronous callback cannot run in a synchronous invocation")]
    AsyncInSyncInvocation,
}

impl FailureReason {
    /// Build a reason from a caught panic payload
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        FailureReason::Panic(message)
    }
}

/// A callback failure captured during invocation. Never returned as `Err`,
/// only handed to the hook's reporter.
#[derive(Debug)]
pub struct CallbackFailure {
    /// Name of the hook being invoked
    pub hook: String,
    /// Id of the handle whose callback failed
    pub handle_id: u64,
    /// Order the callback was sorted under for this invocation
    pub order: Option<i64>,
    pub reason: FailureReason,
}

impl std::fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "callback #{} on hook \"{}\" failed: {}",
            self.handle_id, self.hook, self.reason
        )
    }
}
