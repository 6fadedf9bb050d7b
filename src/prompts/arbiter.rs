//! # PromptArbiter: one shown prompt per scope, system before room.
//!
//! The arbiter owns every prompt from `request` until it reaches a terminal
//! state. The registry is a `Vec` in enqueue order behind one mutex; that order
//! is the FIFO tie-break within a scope.
//!
//! ## Arbitration cycle
//! ```text
//! arbitrate()
//!   ├─► expire shown prompts whose countdown reached zero      → TimedOut
//!   ├─► system prompt queued and none shown?
//!   │     ├─ yes ─► demote every shown room prompt → Queued (retract on panels)
//!   │     │         pause demote_grace
//!   │     │         show oldest queued system prompt on every connected panel
//!   │     └─ no  ─► no system prompt shown or queued?
//!   │                 └─ for each room without a shown prompt:
//!   │                      show its oldest queued prompt on that room's panels
//!   ├─► drop terminal entries
//!   └─► return earliest countdown deadline (monitor loop sleeps until then)
//! ```
//!
//! ## Rules
//! - `respond` is accepted only while `Shown`; `cancel` while `Queued` or `Shown`.
//!   Anything else is a logged no-op.
//! - The terminal transition, the removal from the registry and taking the
//!   callback happen under the registry lock, so the callback runs exactly once
//!   whatever races between respond, cancel and timeout.
//! - Callbacks and surface calls run with the lock released; both may re-enter
//!   the arbiter.
//! - Countdown only runs while shown. A demoted prompt keeps its remaining time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{self, Instant};

use super::prompt::{
    Prompt, PromptAction, PromptCallback, PromptHandle, PromptRequest, PromptResponse,
    PromptScope, PromptState,
};
use crate::events::{Bus, Event, EventKind};
use crate::hooks::{Surfaces, UiSurface, contain_sync};
use crate::ids::{IdAllocator, PromptId, RoomId};

struct Entry {
    prompt: Prompt,
    /// Countdown left while not shown; `None` = no countdown.
    remaining: Option<Duration>,
    /// Countdown end while shown.
    deadline: Option<Instant>,
    callback: Option<PromptCallback>,
}

impl Entry {
    fn is(&self, state: PromptState) -> bool {
        self.prompt.state == state
    }

    fn remaining_at(&self, now: Instant) -> Option<Duration> {
        match self.deadline {
            Some(d) => Some(d.saturating_duration_since(now)),
            None => self.remaining,
        }
    }

    fn snapshot(&self, now: Instant) -> Prompt {
        let mut p = self.prompt.clone();
        p.remaining_seconds = self
            .remaining_at(now)
            .map(|r| r.as_secs() + u64::from(r.subsec_nanos() > 0));
        p
    }

    fn show(&mut self, now: Instant) {
        self.prompt.state = PromptState::Shown;
        self.deadline = self.remaining.map(|r| now + r);
    }

    fn demote(&mut self, now: Instant) {
        self.remaining = self.remaining_at(now);
        self.deadline = None;
        self.prompt.state = PromptState::Queued;
    }
}

/// Shared registry of pending and shown prompts.
pub struct PromptArbiter {
    registry: Mutex<Vec<Entry>>,
    wake: Notify,
    ids: IdAllocator,
    surfaces: Arc<Surfaces>,
    bus: Bus,
    demote_grace: Duration,
}

impl PromptArbiter {
    pub fn new(
        ids: IdAllocator,
        surfaces: Arc<Surfaces>,
        bus: Bus,
        demote_grace: Duration,
    ) -> Self {
        Self {
            registry: Mutex::new(Vec::new()),
            wake: Notify::new(),
            ids,
            surfaces,
            bus,
            demote_grace,
        }
    }

    /// Queues a prompt and wakes the arbitration loop. Never blocks on the loop.
    pub fn request<F>(&self, req: PromptRequest, callback: F) -> PromptHandle
    where
        F: FnOnce(PromptResponse) + Send + 'static,
    {
        let id = self.ids.prompt();
        let scope = req.scope;
        let title = Arc::clone(&req.title);
        let entry = Entry {
            prompt: Prompt {
                id,
                scope,
                title: req.title,
                subtitle: req.subtitle,
                actions: req.actions,
                timeout_seconds: req.timeout.as_secs(),
                state: PromptState::Queued,
                remaining_seconds: None,
                user_context: req.user_context,
            },
            remaining: (!req.timeout.is_zero()).then_some(req.timeout),
            deadline: None,
            callback: Some(Box::new(callback)),
        };
        self.registry.lock().push(entry);

        self.bus.publish(
            Event::new(EventKind::PromptQueued)
                .with_prompt(id)
                .with_room_opt(scope.room())
                .with_task(title),
        );
        self.wake.notify_one();
        PromptHandle { id, scope }
    }

    /// Answers a shown prompt with the named action.
    pub fn respond(&self, id: PromptId, action: &str) {
        self.resolve(id, PromptState::Actioned, Some(action));
    }

    /// Cancels a queued or shown prompt; the callback sees `responded = false`.
    pub fn cancel(&self, id: PromptId) {
        self.resolve(id, PromptState::Cancelled, None);
    }

    /// Current snapshot of a prompt still owned by the arbiter.
    pub fn snapshot(&self, id: PromptId) -> Option<Prompt> {
        let now = Instant::now();
        self.registry
            .lock()
            .iter()
            .find(|e| e.prompt.id == id)
            .map(|e| e.snapshot(now))
    }

    /// Snapshots of every prompt in enqueue order.
    pub fn pending(&self) -> Vec<Prompt> {
        let now = Instant::now();
        self.registry.lock().iter().map(|e| e.snapshot(now)).collect()
    }

    /// The prompt currently shown in `scope`, if any.
    pub fn shown_in(&self, scope: PromptScope) -> Option<PromptId> {
        self.registry
            .lock()
            .iter()
            .find(|e| e.prompt.scope == scope && e.is(PromptState::Shown))
            .map(|e| e.prompt.id)
    }

    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    /// Wake signal: new prompt, terminal transition or explicit [`wake`](Self::wake).
    pub fn notified(&self) -> tokio::sync::futures::Notified<'_> {
        self.wake.notified()
    }

    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Runs one arbitration cycle. Returns the earliest countdown deadline.
    pub async fn arbitrate(&self) -> Option<Instant> {
        self.expire(Instant::now());

        let demoted = self.demote_for_system(Instant::now());
        match demoted {
            Some(demoted) => {
                for p in &demoted {
                    self.retract(p.id, p.scope);
                    self.bus.publish(
                        Event::new(EventKind::PromptDemoted)
                            .with_prompt(p.id)
                            .with_room_opt(p.scope.room()),
                    );
                }
                if !demoted.is_empty() && !self.demote_grace.is_zero() {
                    time::sleep(self.demote_grace).await;
                }
                if let Some(p) = self.show_next_system(Instant::now()) {
                    self.display(&p, self.surfaces.connected());
                }
            }
            None => {
                for p in self.show_next_per_room(Instant::now()) {
                    if let PromptScope::Room(room) = p.scope {
                        self.display(&p, self.surfaces.connected_in(room));
                    }
                }
            }
        }

        let mut reg = self.registry.lock();
        reg.retain(|e| !e.prompt.state.is_terminal());
        reg.iter().filter_map(|e| e.deadline).min()
    }

    /// Times out every shown prompt whose deadline is at or before `now`.
    pub fn expire(&self, now: Instant) {
        let due: Vec<PromptId> = self
            .registry
            .lock()
            .iter()
            .filter(|e| e.is(PromptState::Shown) && e.deadline.is_some_and(|d| d <= now))
            .map(|e| e.prompt.id)
            .collect();
        for id in due {
            self.resolve(id, PromptState::TimedOut, None);
        }
    }

    /// If a system prompt waits and none is shown, demotes shown room prompts.
    ///
    /// `None` means the system path does not apply this cycle.
    fn demote_for_system(&self, now: Instant) -> Option<Vec<Prompt>> {
        let mut reg = self.registry.lock();
        let system_shown = reg
            .iter()
            .any(|e| e.prompt.scope.is_system() && e.is(PromptState::Shown));
        let system_queued = reg
            .iter()
            .any(|e| e.prompt.scope.is_system() && e.is(PromptState::Queued));
        if !system_queued || system_shown {
            return None;
        }

        let demoted = reg
            .iter_mut()
            .filter(|e| !e.prompt.scope.is_system() && e.is(PromptState::Shown))
            .map(|e| {
                e.demote(now);
                e.snapshot(now)
            })
            .collect();
        Some(demoted)
    }

    fn show_next_system(&self, now: Instant) -> Option<Prompt> {
        let mut reg = self.registry.lock();
        if reg
            .iter()
            .any(|e| e.prompt.scope.is_system() && e.is(PromptState::Shown))
        {
            return None;
        }
        let entry = reg
            .iter_mut()
            .find(|e| e.prompt.scope.is_system() && e.is(PromptState::Queued))?;
        entry.show(now);
        Some(entry.snapshot(now))
    }

    fn show_next_per_room(&self, now: Instant) -> Vec<Prompt> {
        let mut reg = self.registry.lock();
        let system_active = reg.iter().any(|e| {
            e.prompt.scope.is_system() && (e.is(PromptState::Shown) || e.is(PromptState::Queued))
        });
        if system_active {
            return Vec::new();
        }

        let mut busy: HashSet<RoomId> = reg
            .iter()
            .filter(|e| e.is(PromptState::Shown))
            .filter_map(|e| e.prompt.scope.room())
            .collect();

        let mut shown = Vec::new();
        for entry in reg.iter_mut() {
            let Some(room) = entry.prompt.scope.room() else {
                continue;
            };
            if entry.is(PromptState::Queued) && busy.insert(room) {
                entry.show(now);
                shown.push(entry.snapshot(now));
            }
        }
        shown
    }

    fn display(&self, prompt: &Prompt, targets: Vec<Arc<dyn UiSurface>>) {
        let count = targets.len();
        for surface in targets {
            if let Err(e) = contain_sync(|| surface.show_prompt(prompt)) {
                tracing::warn!(
                    surface = surface.name(),
                    prompt = %prompt.id,
                    error = %e,
                    "show_prompt failed"
                );
            }
        }
        self.bus.publish(
            Event::new(EventKind::PromptShown)
                .with_prompt(prompt.id)
                .with_room_opt(prompt.scope.room())
                .with_surfaces(count),
        );
    }

    fn retract(&self, id: PromptId, scope: PromptScope) {
        let targets = match scope {
            PromptScope::System => self.surfaces.all(),
            PromptScope::Room(room) => self.surfaces.in_room(room),
        };
        for surface in targets {
            if let Err(e) = contain_sync(|| surface.retract_prompt(id)) {
                tracing::warn!(
                    surface = surface.name(),
                    prompt = %id,
                    error = %e,
                    "retract_prompt failed"
                );
            }
        }
    }

    /// Moves a prompt into a terminal state and fires its callback.
    fn resolve(&self, id: PromptId, state: PromptState, action: Option<&str>) {
        let (entry, was_shown, chosen) = {
            let mut reg = self.registry.lock();
            let Some(pos) = reg.iter().position(|e| e.prompt.id == id) else {
                tracing::debug!(prompt = %id, ?state, "prompt not pending, ignoring");
                return;
            };
            let current = reg[pos].prompt.state;
            let allowed = match state {
                PromptState::Actioned | PromptState::TimedOut => current == PromptState::Shown,
                PromptState::Cancelled => !current.is_terminal(),
                PromptState::Queued | PromptState::Shown => false,
            };
            if !allowed {
                tracing::debug!(
                    prompt = %id,
                    ?current,
                    ?state,
                    "invalid prompt transition, ignoring"
                );
                return;
            }
            let chosen: Option<PromptAction> = match action {
                Some(name) => match reg[pos].prompt.action(name) {
                    Some(a) => Some(a.clone()),
                    None => {
                        tracing::debug!(prompt = %id, action = name, "unknown action, ignoring");
                        return;
                    }
                },
                None => None,
            };
            let mut entry = reg.remove(pos);
            entry.prompt.state = state;
            entry.deadline = None;
            (entry, current == PromptState::Shown, chosen)
        };

        let Entry {
            prompt, callback, ..
        } = entry;
        if was_shown {
            self.retract(id, prompt.scope);
        }

        let kind = match state {
            PromptState::Actioned => EventKind::PromptActioned,
            PromptState::TimedOut => EventKind::PromptTimedOut,
            _ => EventKind::PromptCancelled,
        };
        let mut ev = Event::new(kind)
            .with_prompt(id)
            .with_room_opt(prompt.scope.room());
        if let Some(a) = &chosen {
            ev = ev.with_reason(Arc::clone(&a.name));
        }
        self.bus.publish(ev);

        if let Some(cb) = callback {
            let response = PromptResponse {
                id,
                scope: prompt.scope,
                state,
                responded: state == PromptState::Actioned,
                action: chosen,
                user_context: prompt.user_context,
            };
            if let Err(e) = contain_sync(move || cb(response)) {
                tracing::warn!(prompt = %id, error = %e, "prompt callback panicked");
            }
        }
        self.wake.notify_one();
    }
}
