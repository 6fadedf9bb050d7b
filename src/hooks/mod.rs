//! # Collaborator contracts.
//!
//! The orchestration core never talks to hardware, renders UI or restarts the
//! process itself. Deployments plug those layers in through three traits:
//!
//! - [`System`]: boot assembly and the room lifecycle hooks (async, may do I/O)
//! - [`UiSurface`]: one touch panel / web UI; must not block
//! - [`Restarter`]: executes the watchdog's forced restart
//!
//! [`Surfaces`] is the shared, dynamically extendable list of registered UI surfaces.
//!
//! ## Failure boundaries
//! Every call into a collaborator goes through [`contain`] (async) or
//! [`contain_sync`], which turn both `Err` and panics into a [`HookError`]
//! for the caller to log. Nothing a collaborator does can unwind into the core.

mod surfaces;
mod system;

pub use surfaces::{Surfaces, UiSurface};
pub use system::{ExitRestarter, PowerEvent, Restarter, System};

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::HookError;

/// Runs a collaborator future, converting panics into [`HookError::Panicked`].
pub(crate) async fn contain<F>(fut: F) -> Result<(), HookError>
where
    F: Future<Output = Result<(), HookError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(HookError::from_panic(payload)),
    }
}

/// Synchronous counterpart of [`contain`] for non-async surface calls.
pub(crate) fn contain_sync<R>(f: impl FnOnce() -> R) -> Result<R, HookError> {
    std::panic::catch_unwind(AssertUnwindSafe(f)).map_err(HookError::from_panic)
}
