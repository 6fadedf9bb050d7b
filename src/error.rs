//! Error types used by the roomvisor runtime and its collaborators.
//!
//! This module defines three enums:
//!
//! - [`QueueError`]: the boot queue rejected a task (configuration bug).
//! - [`HookError`]: a collaborator hook or init action failed; always contained.
//! - [`RuntimeError`]: errors raised by the orchestration runtime itself.
//!
//! All of them provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the boot task queue.
///
/// Overflowing the queue means the deployment asked for more init steps than the
/// controller was configured for. It is surfaced synchronously to the enqueuing
/// caller and never masked.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue already holds `capacity` tasks.
    #[error("task queue full (capacity {capacity})")]
    Full {
        /// Configured capacity of the queue.
        capacity: usize,
    },
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Full { .. } => "queue_full",
        }
    }
}

/// # Errors produced by collaborator hooks and init actions.
///
/// The core never propagates these to unrelated callers: a failed boot step or
/// room lifecycle step is logged and the sequence moves on.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The hook ran and reported a failure.
    #[error("hook failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The hook panicked; the panic was caught at the failure boundary.
    #[error("hook panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text, when it was a string.
        info: String,
    },

    /// The device or service behind the hook is not reachable.
    #[error("unavailable: {what}")]
    Unavailable {
        /// What was unavailable.
        what: String,
    },
}

impl HookError {
    /// Convenience constructor for [`HookError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        HookError::Failed {
            error: error.into(),
        }
    }

    /// Builds a [`HookError::Panicked`] from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        HookError::Panicked { info }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Failed { .. } => "hook_failed",
            HookError::Panicked { .. } => "hook_panicked",
            HookError::Unavailable { .. } => "hook_unavailable",
        }
    }
}

/// # Errors produced by the roomvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some workers did not stop in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the workers that were still running.
        stuck: Vec<String>,
    },

    /// [`Runtime::run`](crate::Runtime::run) was called twice.
    #[error("runtime already running")]
    AlreadyRunning,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use roomvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::AlreadyRunning => "runtime_already_running",
        }
    }
}
