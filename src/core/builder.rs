use std::sync::Arc;

use super::runtime::{Runtime, RuntimeParts};
use crate::{
    boot::{BootSequencer, TaskQueue},
    core::Config,
    error::QueueError,
    events::Bus,
    hooks::{ExitRestarter, Restarter, Surfaces, System, UiSurface},
    ids::IdAllocator,
    prompts::PromptArbiter,
    rooms::RoomJobController,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Runtime`] over one deployment's [`System`].
pub struct RuntimeBuilder {
    cfg: Config,
    system: Arc<dyn System>,
    surfaces: Vec<Arc<dyn UiSurface>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    restarter: Option<Arc<dyn Restarter>>,
    ids: Option<IdAllocator>,
}

impl RuntimeBuilder {
    /// Creates a new builder with the given configuration and system.
    pub fn new(cfg: Config, system: Arc<dyn System>) -> Self {
        Self {
            cfg,
            system,
            surfaces: Vec::new(),
            subscribers: Vec::new(),
            restarter: None,
            ids: None,
        }
    }

    /// Registers the UI surfaces known at startup. More can be added later
    /// through [`Runtime::surfaces`].
    pub fn with_surfaces(mut self, surfaces: Vec<Arc<dyn UiSurface>>) -> Self {
        self.surfaces.extend(surfaces);
        self
    }

    /// Registers one UI surface.
    pub fn with_surface(mut self, surface: Arc<dyn UiSurface>) -> Self {
        self.surfaces.push(surface);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive runtime events (boot progress, prompts, room jobs, ...)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Overrides the watchdog's restart executor (default: [`ExitRestarter`]).
    pub fn with_restarter(mut self, restarter: Arc<dyn Restarter>) -> Self {
        self.restarter = Some(restarter);
        self
    }

    /// Shares an existing id allocator instead of starting a new sequence.
    pub fn with_ids(mut self, ids: IdAllocator) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Builds the runtime and assembles the boot queue.
    ///
    /// Calls [`System::items_to_initialize`] once. Fails if the system returned
    /// more tasks than `task_queue_capacity`. Must be called inside a tokio
    /// runtime (subscriber workers are spawned here).
    pub fn build(self) -> Result<Arc<Runtime>, QueueError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let ids = self.ids.unwrap_or_default();
        let surfaces = Arc::new(Surfaces::new(self.surfaces));

        let queue = TaskQueue::new(self.cfg.task_queue_capacity);
        queue.enqueue_all(self.system.items_to_initialize())?;

        let arbiter = Arc::new(PromptArbiter::new(
            ids.clone(),
            Arc::clone(&surfaces),
            bus.clone(),
            self.cfg.demote_grace,
        ));
        let rooms = RoomJobController::new(
            Arc::clone(&self.system),
            Arc::clone(&surfaces),
            bus.clone(),
            ids.clone(),
            self.cfg.overlap_policy,
        );
        let boot = BootSequencer::new(
            queue,
            self.cfg.clone(),
            bus.clone(),
            Arc::clone(&surfaces),
            Arc::clone(&self.system),
        );
        let restarter = self
            .restarter
            .unwrap_or_else(|| Arc::new(ExitRestarter::default()));

        Ok(Arc::new(Runtime::new_internal(RuntimeParts {
            cfg: self.cfg,
            bus,
            ids,
            subs,
            surfaces,
            restarter,
            arbiter,
            rooms,
            boot,
        })))
    }
}
