//! # Boot initialization task.
//!
//! An [`InitTask`] is one deferred initialization step: an async action, a
//! description for progress reporting, a delay to wait before running it and an
//! optional completion predicate polled after the action returns.
//!
//! Tasks are assembled with builder methods and become immutable once handed to
//! the [`TaskQueue`](crate::TaskQueue); the sequencer consumes each task exactly once.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//! use roomvisor::{HookError, InitTask};
//!
//! let online = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&online);
//!
//! let task = InitTask::new("connect projector", move || async move {
//!     flag.store(true, Ordering::SeqCst);
//!     Ok::<_, HookError>(())
//! })
//! .with_delay(Duration::from_millis(200))
//! .with_completion(move || online.load(Ordering::SeqCst));
//!
//! assert_eq!(task.description(), "connect projector");
//! assert!(task.has_completion_check());
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::HookError;

/// Boxed future returned by an init action.
pub type BoxInitFuture = Pin<Box<dyn Future<Output = Result<(), HookError>> + Send + 'static>>;

pub(crate) type InitAction = Box<dyn FnOnce() -> BoxInitFuture + Send + 'static>;
pub(crate) type CompletionCheck = Arc<dyn Fn() -> bool + Send + Sync + 'static>;

/// One boot step.
pub struct InitTask {
    description: Arc<str>,
    delay_before_run: Duration,
    action: InitAction,
    is_complete: Option<CompletionCheck>,
}

impl InitTask {
    /// Creates a task with no delay and no completion predicate.
    pub fn new<F, Fut>(description: impl Into<Arc<str>>, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        Self {
            description: description.into(),
            delay_before_run: Duration::ZERO,
            action: Box::new(move || Box::pin(action())),
            is_complete: None,
        }
    }

    /// Waits `delay` before running the action.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_before_run = delay;
        self
    }

    /// After the action, polls `check` until it returns true (bounded).
    #[must_use]
    pub fn with_completion<P>(mut self, check: P) -> Self
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        self.is_complete = Some(Arc::new(check));
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn delay_before_run(&self) -> Duration {
        self.delay_before_run
    }

    pub fn has_completion_check(&self) -> bool {
        self.is_complete.is_some()
    }

    pub(crate) fn into_parts(self) -> (Arc<str>, Duration, InitAction, Option<CompletionCheck>) {
        (
            self.description,
            self.delay_before_run,
            self.action,
            self.is_complete,
        )
    }
}

impl fmt::Debug for InitTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitTask")
            .field("description", &self.description)
            .field("delay_before_run", &self.delay_before_run)
            .field("has_completion_check", &self.is_complete.is_some())
            .finish()
    }
}
