//! # Overlap policy for room jobs.
//!
//! A room may be asked to change source while its previous change is still
//! being applied. The data-model step (current source, room counts) always
//! runs synchronously in call order; the policy only decides how the slow
//! background jobs relate to each other.
//!
//! ## Variants
//! - `Serialize`: jobs of one room run one at a time, in request order.
//! - `Concurrent`: every job starts immediately; jobs of one room may overlap.
//!
//! Jobs of different rooms are never ordered with respect to each other.

/// How overlapping source-change jobs on the same room are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Per-room FIFO; a new job waits for the running one.
    ///
    /// Use when the devices behind a room cannot take interleaved commands.
    #[default]
    Serialize,

    /// Start every job at once; the last request wins on the current source.
    ///
    /// Use when device commands are idempotent and latency matters more.
    Concurrent,
}
