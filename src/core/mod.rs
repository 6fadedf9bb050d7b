//! Runtime core: configuration, lifecycle and the shared monitor loop.
//!
//! The public API of this module is [`Runtime`], built with [`RuntimeBuilder`]
//! from a [`Config`].
//!
//! Internal modules:
//! - [`runtime`]: owns the workers, handles OS signals and graceful shutdown;
//! - [`builder`]: assembles bus, subscribers, arbiter, rooms and the boot queue;
//! - [`monitor`]: watchdog check and prompt arbitration on one loop;
//! - [`shutdown`]: cross-platform termination signal handling.

mod builder;
mod config;
mod monitor;
mod runtime;
mod shutdown;

pub use builder::RuntimeBuilder;
pub use config::Config;
pub use runtime::Runtime;
