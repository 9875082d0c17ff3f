//! Process-wide registry of hook scopes
//!
//! [`Hooksie::instance`] is created on first access and lives for the rest of
//! the process. Its default scope backs the free functions in this module,
//! so top-level code can create hooks and fasten callbacks without passing
//! a scope around.

use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::config::HooksConfig;
use crate::hooks::{Callback, FailureReporter, Hook, HookError, HookHandle, HooksScope, lock};

static INSTANCE: OnceCell<Hooksie> = OnceCell::new();

/// Registry of every scope created through it, plus one default scope
pub struct Hooksie {
    scopes: Mutex<Vec<HooksScope>>,
    default_scope: HooksScope,
    reporter: Arc<dyn FailureReporter>,
}

impl Hooksie {
    /// Build an isolated registry; most callers want [`Hooksie::instance`]
    pub fn new(config: &HooksConfig) -> Self {
        let reporter = config.reporter();
        let default_scope =
            HooksScope::with_reporter(Some(&config.default_scope), Arc::clone(&reporter));
        Self {
            scopes: Mutex::new(vec![default_scope.clone()]),
            default_scope,
            reporter,
        }
    }

    /// Configure the global registry before its first use.
    ///
    /// Returns false if it already exists; the existing one is kept.
    pub fn init(config: &HooksConfig) -> bool {
        let mut created = false;
        INSTANCE.get_or_init(|| {
            created = true;
            Hooksie::new(config)
        });
        created
    }

    pub fn instance() -> &'static Hooksie {
        INSTANCE.get_or_init(|| Hooksie::new(&HooksConfig::default()))
    }

    pub fn default_scope(&self) -> &HooksScope {
        &self.default_scope
    }

    /// Create and register a new scope
    pub fn scope(&self, name: Option<&str>) -> HooksScope {
        let scope = HooksScope::with_reporter(name, Arc::clone(&self.reporter));
        lock(&self.scopes).push(scope.clone());
        debug!("Created hooks scope {:?}", name);
        scope
    }

    /// Every scope created so far, the default scope first
    pub fn scopes(&self) -> Vec<HooksScope> {
        lock(&self.scopes).clone()
    }

    pub fn hook<T: 'static>(&self, name: &str) -> Result<Hook<T>, HookError> {
        self.default_scope.hook(name)
    }

    pub fn fasten<T: 'static>(
        &self,
        hook_name: &str,
        callback: Callback<T>,
        order: Option<i64>,
    ) -> Result<HookHandle<T>, HookError> {
        self.default_scope.fasten(hook_name, callback, order)
    }

    pub fn detach_from_hook<T: 'static>(
        &self,
        hook_name: &str,
        callback: &Callback<T>,
    ) -> Result<bool, HookError> {
        self.default_scope.detach_from_hook(hook_name, callback)
    }

    pub fn detach_from_all<T: 'static>(&self, callback: &Callback<T>) -> bool {
        self.default_scope.detach_from_all(callback)
    }
}

/// Create a scope in the global registry
pub fn scope(name: Option<&str>) -> HooksScope {
    Hooksie::instance().scope(name)
}

/// Create a hook in the global default scope
pub fn hook<T: 'static>(name: &str) -> Result<Hook<T>, HookError> {
    Hooksie::instance().hook(name)
}

/// Attach a callback to a hook of the global default scope
pub fn fasten<T: 'static>(
    hook_name: &str,
    callback: Callback<T>,
    order: Option<i64>,
) -> Result<HookHandle<T>, HookError> {
    Hooksie::instance().fasten(hook_name, callback, order)
}

pub fn detach_from_hook<T: 'static>(
    hook_name: &str,
    callback: &Callback<T>,
) -> Result<bool, HookError> {
    Hooksie::instance().detach_from_hook(hook_name, callback)
}

pub fn detach_from_all<T: 'static>(callback: &Callback<T>) -> bool {
    Hooksie::instance().detach_from_all(callback)
}
