//! # UI surfaces.
//!
//! A [`UiSurface`] is one panel (touch panel, web UI, ...). It belongs to at
//! most one room; surfaces without a room only receive system-scoped prompts.
//!
//! ## Rules
//! - Calls into a surface must return promptly; the core does not time them out.
//! - Surfaces may call back into the runtime (e.g. `PromptArbiter::respond`)
//!   from inside these methods; the core never holds its own locks while
//!   calling a surface.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::hooks::PowerEvent;
use crate::ids::{PromptId, RoomId};
use crate::prompts::Prompt;

/// One user-facing panel.
pub trait UiSurface: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Room this surface controls, if any.
    fn room(&self) -> Option<RoomId>;

    /// True while the panel is online.
    fn is_connected(&self) -> bool;

    /// Boot waits (bounded) for these panels to come online before running tasks.
    fn requires_connection_before_boot(&self) -> bool {
        false
    }

    /// Display a prompt.
    fn show_prompt(&self, prompt: &Prompt);

    /// Take a prompt off the screen (demoted or resolved).
    fn retract_prompt(&self, _id: PromptId) {}

    /// Show the default content (after boot, or to re-show the current source).
    fn show_main_view(&self);

    /// Show the home page after the room powered off.
    fn show_home_page(&self, event: PowerEvent);
}

/// Shared registry of UI surfaces.
#[derive(Default)]
pub struct Surfaces {
    list: RwLock<Vec<Arc<dyn UiSurface>>>,
}

impl Surfaces {
    #[must_use]
    pub fn new(list: Vec<Arc<dyn UiSurface>>) -> Self {
        Self {
            list: RwLock::new(list),
        }
    }

    /// Registers another surface.
    pub fn register(&self, surface: Arc<dyn UiSurface>) {
        self.list.write().push(surface);
    }

    /// Every registered surface.
    pub fn all(&self) -> Vec<Arc<dyn UiSurface>> {
        self.list.read().clone()
    }

    /// Connected surfaces, any room.
    pub fn connected(&self) -> Vec<Arc<dyn UiSurface>> {
        self.filtered(|s| s.is_connected())
    }

    /// Connected surfaces of one room.
    pub fn connected_in(&self, room: RoomId) -> Vec<Arc<dyn UiSurface>> {
        self.filtered(|s| s.room() == Some(room) && s.is_connected())
    }

    /// Surfaces of one room regardless of connection.
    pub fn in_room(&self, room: RoomId) -> Vec<Arc<dyn UiSurface>> {
        self.filtered(|s| s.room() == Some(room))
    }

    /// Names of boot-gating surfaces that are still offline.
    pub fn pending_boot_connections(&self) -> Vec<String> {
        self.list
            .read()
            .iter()
            .filter(|s| s.requires_connection_before_boot() && !s.is_connected())
            .map(|s| s.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.list.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.read().is_empty()
    }

    fn filtered(&self, f: impl Fn(&Arc<dyn UiSurface>) -> bool) -> Vec<Arc<dyn UiSurface>> {
        self.list.read().iter().filter(|s| f(s)).cloned().collect()
    }
}
