//! Boot: the initialization queue and the sequencer that drains it.
//!
//! - [`InitTask`] one deferred step (action, description, delay, completion check)
//! - [`TaskQueue`] bounded, thread-safe FIFO of steps
//! - [`BootSequencer`] drains the queue on a dedicated worker and publishes progress

mod queue;
mod sequencer;
mod task;

pub use queue::{DEFAULT_QUEUE_CAPACITY, TaskQueue};
pub use sequencer::{BootOutcome, BootSequencer};
pub use task::{BoxInitFuture, InitTask};
