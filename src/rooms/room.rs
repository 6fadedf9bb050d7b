//! # Rooms and sources.
//!
//! A [`Source`] can be live in several rooms at once; its room count is the
//! number of rooms whose current source it is. A [`Room`] holds at most one
//! current source.
//!
//! Both are read freely, but only the [`RoomJobController`](crate::RoomJobController)
//! writes them: the current source and the room counts move together inside one
//! controller-wide critical section, so counts always match the rooms.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::ids::{RoomId, SourceId};

/// A selectable input (laptop, media player, camera, ...).
pub struct Source {
    id: SourceId,
    name: Arc<str>,
    room_count: AtomicUsize,
}

impl Source {
    pub fn new(id: SourceId, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
            room_count: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rooms currently holding this source live.
    pub fn room_count(&self) -> usize {
        self.room_count.load(Ordering::Acquire)
    }

    /// Adds a room; true on the 0 → 1 transition.
    pub(crate) fn acquire(&self) -> bool {
        self.room_count.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Removes a room; true on the transition to 0. Never goes below zero.
    pub(crate) fn release(&self) -> bool {
        self.room_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok_and(|prev| prev == 1)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("room_count", &self.room_count())
            .finish()
    }
}

#[derive(Default)]
pub(crate) struct RoomState {
    pub(crate) current: Option<Arc<Source>>,
    /// Jobs scheduled and not yet finished (queued or running).
    pub(crate) jobs: usize,
}

/// A controlled space with its own panels and current source.
pub struct Room {
    id: RoomId,
    name: Arc<str>,
    pub(crate) state: Mutex<RoomState>,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
            state: Mutex::new(RoomState::default()),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_source(&self) -> Option<Arc<Source>> {
        self.state.lock().current.clone()
    }

    /// True while a source-change job for this room is queued or running.
    pub fn is_source_change_busy(&self) -> bool {
        self.state.lock().jobs > 0
    }

    pub(crate) fn job_done(&self) {
        let mut st = self.state.lock();
        st.jobs = st.jobs.saturating_sub(1);
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.lock();
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("current", &st.current.as_ref().map(|s| s.id()))
            .field("jobs", &st.jobs)
            .finish()
    }
}
