//! Error Handling
//!
//! Two kinds of failure exist in the binder:
//!
//! - [`BinderError`]: misuse of the binder itself (nested passes, missing
//!   runtime, bad configuration, global instance problems). Returned as
//!   `Result` errors.
//!
//! - [`BindingError`]: a caller-supplied callback panicked while a binding
//!   was being reconciled. These never escape a pass. They are caught at the
//!   per-binding boundary and handed to an [`ErrorReporter`], so one broken
//!   binding cannot stall the others or stop the frame loop.

use std::any::Any;
use std::fmt;

use serde::Serialize;

use crate::binding::BindingId;

/// Errors returned by binder operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BinderError {
    #[error("a reconciliation pass is already running")]
    PassInProgress,

    #[error("no tokio runtime is available to drive frames")]
    NoRuntime,

    #[error("a global binder is already installed")]
    GlobalAlreadyInstalled,

    #[error("no global binder has been installed")]
    NoGlobalBinder,

    #[error("invalid binder configuration: {0}")]
    Config(String),
}

/// Convenience Result type with BinderError.
pub type Result<T> = std::result::Result<T, BinderError>;

/// The callback that was running when a binding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    ShouldRemove,
    Evaluate,
    Compare,
    Update,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ShouldRemove => "should_remove",
            Phase::Evaluate => "evaluate",
            Phase::Compare => "compare",
            Phase::Update => "update",
        };
        f.write_str(name)
    }
}

/// A binding whose callback panicked during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{id} failed during {phase}: {message}")]
pub struct BindingError {
    pub id: BindingId,
    pub phase: Phase,
    pub message: String,
}

impl BindingError {
    /// Build an error from a caught panic payload.
    pub(crate) fn from_panic(id: BindingId, phase: Phase, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self { id, phase, message }
    }
}

/// Receives binding failures caught by the scheduler.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &BindingError);
}

/// Default reporter: logs each failure through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &BindingError) {
        tracing::error!(
            binding = %error.id,
            phase = %error.phase,
            message = %error.message,
            "binding failed during reconciliation"
        );
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&BindingError) + Send + Sync,
{
    fn report(&self, error: &BindingError) {
        self(error)
    }
}
