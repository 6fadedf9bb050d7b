//! # Identity allocation for rooms, sources and prompts.
//!
//! Entities need process-unique, stable, monotonically increasing identifiers.
//! [`IdAllocator`] is an injected atomic counter: the [`Runtime`](crate::Runtime)
//! owns one and hands clones to whoever creates entities. There is no hidden
//! process-wide static, so two runtimes in the same process (tests!) never
//! share a sequence.
//!
//! ## Rules
//! - Identifiers start at 1 and only ever increase.
//! - One allocator serves every entity kind; a room and a prompt never share a number.
//! - Cloning an allocator shares the counter.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared monotonic id counter.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    /// Creates a fresh allocator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn bump(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Allocates a room identifier.
    pub fn room(&self) -> RoomId {
        RoomId(self.bump())
    }

    /// Allocates a source identifier.
    pub fn source(&self) -> SourceId {
        SourceId(self.bump())
    }

    /// Allocates a prompt identifier.
    pub fn prompt(&self) -> PromptId {
        PromptId(self.bump())
    }
}

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Raw numeric value.
            #[inline]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a [`Room`](crate::Room).
    RoomId,
    "room"
);
id_type!(
    /// Identifier of a [`Source`](crate::Source).
    SourceId,
    "source"
);
id_type!(
    /// Identifier of a [`Prompt`](crate::Prompt). Ordering follows enqueue order.
    PromptId,
    "prompt"
);
