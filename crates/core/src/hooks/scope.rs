//! Named groups of hooks

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::callback::Callback;
use super::error::HookError;
use super::handle::HookHandle;
use super::hook::Hook;
use super::report::{FailureReporter, TracingReporter};
use super::{read, write};

/// Erased storage so hooks of different argument types share one map
type AnyHook = Box<dyn Any + Send + Sync>;

struct ScopeInner {
    name: Option<String>,
    hooks: RwLock<HashMap<String, AnyHook>>,
    reporter: Arc<dyn FailureReporter>,
}

/// A namespace owning a set of uniquely named hooks.
///
/// Cloning a scope yields another reference to the same namespace.
#[derive(Clone)]
pub struct HooksScope {
    inner: Arc<ScopeInner>,
}

impl HooksScope {
    pub fn new(name: Option<&str>) -> Self {
        Self::with_reporter(name, Arc::new(TracingReporter::default()))
    }

    /// Hooks created in this scope report their failures to `reporter`
    pub fn with_reporter(name: Option<&str>, reporter: Arc<dyn FailureReporter>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name: name.map(str::to_string),
                hooks: RwLock::new(HashMap::new()),
                reporter,
            }),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    fn label(&self) -> String {
        self.name().unwrap_or("<unnamed>").to_string()
    }

    /// Create and register a new hook named `name`
    pub fn hook<T: 'static>(&self, name: &str) -> Result<Hook<T>, HookError> {
        let mut hooks = write(&self.inner.hooks);
        if hooks.contains_key(name) {
            return Err(HookError::DuplicateHookName {
                scope: self.label(),
                name: name.to_string(),
            });
        }

        let hook = Hook::<T>::with_reporter(name, Arc::clone(&self.inner.reporter));
        hooks.insert(name.to_string(), Box::new(hook.clone()));
        debug!("Created hook '{}' in scope '{}'", name, self.label());
        Ok(hook)
    }

    /// Look up an existing hook by name
    pub fn get<T: 'static>(&self, name: &str) -> Result<Hook<T>, HookError> {
        let hooks = read(&self.inner.hooks);
        let erased = hooks.get(name).ok_or_else(|| HookError::UnknownHookName {
            scope: self.label(),
            name: name.to_string(),
        })?;
        erased
            .downcast_ref::<Hook<T>>()
            .cloned()
            .ok_or_else(|| HookError::HookTypeMismatch {
                scope: self.label(),
                name: name.to_string(),
            })
    }

    /// Attach a callback to the hook named `hook_name`
    pub fn fasten<T: 'static>(
        &self,
        hook_name: &str,
        callback: Callback<T>,
        order: Option<i64>,
    ) -> Result<HookHandle<T>, HookError> {
        // the lookup lock is released before the hook is touched
        let hook = self.get::<T>(hook_name)?;
        Ok(hook.fasten(callback, order))
    }

    /// Detach one attachment of `callback` from the hook named `hook_name`.
    ///
    /// A hook of another argument type cannot hold `callback`, so that case
    /// returns `Ok(false)`.
    pub fn detach_from_hook<T: 'static>(
        &self,
        hook_name: &str,
        callback: &Callback<T>,
    ) -> Result<bool, HookError> {
        match self.get::<T>(hook_name) {
            Ok(hook) => Ok(hook.detach(callback)),
            Err(HookError::HookTypeMismatch { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Detach `callback` from every hook in this scope that holds it.
    /// Returns true if at least one hook detached it.
    pub fn detach_from_all<T: 'static>(&self, callback: &Callback<T>) -> bool {
        let hooks: Vec<Hook<T>> = read(&self.inner.hooks)
            .values()
            .filter_map(|h| h.downcast_ref::<Hook<T>>().cloned())
            .collect();

        let mut detached = false;
        for hook in hooks {
            if hook.detach(callback) {
                detached = true;
            }
        }
        detached
    }

    pub fn contains(&self, name: &str) -> bool {
        read(&self.inner.hooks).contains_key(name)
    }

    /// Names of all hooks in this scope, sorted
    pub fn hook_names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.inner.hooks).keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for HooksScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HooksScope")
            .field("name", &self.inner.name)
            .field("hooks", &self.hook_names())
            .finish()
    }
}
