//! # Rooms, sources and the per-room source-change jobs.
//!
//! - [`Room`] / [`Source`]: the data model; written only by the controller
//! - [`RoomJobController`]: `request_source_change`, power off, the job driver
//! - [`OverlapPolicy`]: how overlapping jobs on one room are scheduled
//! - [`SourceChange`] / [`JobHandle`] / [`JobReport`]: what callers get back

mod controller;
mod job;
mod policy;
mod room;

pub use controller::RoomJobController;
pub use job::{JobHandle, JobReport, JobStep, SourceChange};
pub use policy::OverlapPolicy;
pub use room::{Room, Source};
