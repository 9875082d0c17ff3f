//! Failure reporting sink for hook invocations

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::error::CallbackFailure;

/// Receives the failures collected by one invocation of a hook.
///
/// `report` is called once per failed callback, then `summarize` once.
/// Nothing is called when every callback succeeds.
#[cfg_attr(test, mockall::automock)]
pub trait FailureReporter: Send + Sync {
    fn report(&self, failure: &CallbackFailure);

    fn summarize(&self, hook: &str, failed: usize, total: usize);
}

/// Level at which the tracing reporter emits failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLevel {
    #[default]
    Error,
    Warn,
    /// Failures are still reflected in the invocation result
    Off,
}

/// Default reporter: writes to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter {
    level: ReportLevel,
}

impl TracingReporter {
    pub fn new(level: ReportLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> ReportLevel {
        self.level
    }
}

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &CallbackFailure) {
        match self.level {
            ReportLevel::Error => error!(
                hook = %failure.hook,
                handle_id = failure.handle_id,
                "Hook callback failed: {}",
                failure.reason
            ),
            ReportLevel::Warn => warn!(
                hook = %failure.hook,
                handle_id = failure.handle_id,
                "Hook callback failed: {}",
                failure.reason
            ),
            ReportLevel::Off => {}
        }
    }

    fn summarize(&self, hook: &str, failed: usize, total: usize) {
        match self.level {
            ReportLevel::Error => error!(
                "{} of {} callback(s) failed while invoking hook '{}'",
                failed, total, hook
            ),
            ReportLevel::Warn => warn!(
                "{} of {} callback(s) failed while invoking hook '{}'",
                failed, total, hook
            ),
            ReportLevel::Off => {}
        }
    }
}
