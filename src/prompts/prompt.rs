//! # Prompt data model.
//!
//! A [`Prompt`] asks users for input on the panels of one [`PromptScope`].
//! Callers describe it with a [`PromptRequest`], hand it to the
//! [`PromptArbiter`](crate::PromptArbiter) together with a callback, and get a
//! [`PromptHandle`] back.
//!
//! ## Lifecycle
//! ```text
//! Queued ──► Shown ──► Actioned | TimedOut | Cancelled
//!   ▲          │
//!   └─demoted──┘   (system prompt preempts a room prompt)
//! Queued ──────────────────────► Cancelled
//! ```
//! Terminal states are final; the callback fires exactly once, on entering one.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::ids::{PromptId, RoomId};

/// Blast radius of a prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromptScope {
    /// Every connected panel; preempts room prompts.
    System,
    /// Only the panels of one room.
    Room(RoomId),
}

impl PromptScope {
    pub fn room(&self) -> Option<RoomId> {
        match self {
            PromptScope::System => None,
            PromptScope::Room(r) => Some(*r),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, PromptScope::System)
    }
}

/// Semantic type of an action button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionType {
    Acknowledge,
    Cancel,
    Answer,
    Reject,
}

impl ActionType {
    /// True for actions that confirm what the prompt asked.
    pub fn is_affirmative(&self) -> bool {
        matches!(self, ActionType::Acknowledge | ActionType::Answer)
    }
}

/// One button on a prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptAction {
    pub name: Arc<str>,
    pub icon: Option<Arc<str>>,
    pub kind: ActionType,
}

impl PromptAction {
    pub fn new(name: impl Into<Arc<str>>, kind: ActionType) -> Self {
        Self {
            name: name.into(),
            icon: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<Arc<str>>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Prompt state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromptState {
    Queued,
    Shown,
    Actioned,
    TimedOut,
    Cancelled,
}

impl PromptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PromptState::Actioned | PromptState::TimedOut | PromptState::Cancelled
        )
    }
}

/// Opaque caller value carried through to the callback.
pub type UserContext = Arc<dyn Any + Send + Sync>;

/// Outcome delivered to the prompt callback.
#[derive(Clone)]
pub struct PromptResponse {
    pub id: PromptId,
    pub scope: PromptScope,
    /// Terminal state the prompt ended in.
    pub state: PromptState,
    /// True only for `Actioned`.
    pub responded: bool,
    pub action: Option<PromptAction>,
    pub user_context: Option<UserContext>,
}

impl fmt::Debug for PromptResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptResponse")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("state", &self.state)
            .field("responded", &self.responded)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

/// Callback invoked once when a prompt reaches a terminal state.
pub type PromptCallback = Box<dyn FnOnce(PromptResponse) + Send + 'static>;

/// Description of a prompt to raise.
#[derive(Clone)]
pub struct PromptRequest {
    pub scope: PromptScope,
    pub title: Arc<str>,
    pub subtitle: Arc<str>,
    /// Countdown while shown. Zero means no countdown.
    pub timeout: Duration,
    pub actions: Vec<PromptAction>,
    pub user_context: Option<UserContext>,
}

impl PromptRequest {
    pub fn new(scope: PromptScope, title: impl Into<Arc<str>>) -> Self {
        Self {
            scope,
            title: title.into(),
            subtitle: Arc::from(""),
            timeout: Duration::ZERO,
            actions: Vec::new(),
            user_context: None,
        }
    }

    /// Shorthand for a system-scoped request.
    pub fn system(title: impl Into<Arc<str>>) -> Self {
        Self::new(PromptScope::System, title)
    }

    /// Shorthand for a room-scoped request.
    pub fn room(room: RoomId, title: impl Into<Arc<str>>) -> Self {
        Self::new(PromptScope::Room(room), title)
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<Arc<str>>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    #[must_use]
    pub fn action(mut self, action: PromptAction) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn context(mut self, ctx: UserContext) -> Self {
        self.user_context = Some(ctx);
        self
    }
}

impl fmt::Debug for PromptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptRequest")
            .field("scope", &self.scope)
            .field("title", &self.title)
            .field("timeout", &self.timeout)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Snapshot of a prompt, as handed to surfaces and returned by queries.
#[derive(Clone)]
pub struct Prompt {
    pub id: PromptId,
    pub scope: PromptScope,
    pub title: Arc<str>,
    pub subtitle: Arc<str>,
    pub actions: Vec<PromptAction>,
    pub timeout_seconds: u64,
    pub state: PromptState,
    /// Seconds left on the countdown (rounded up); `None` without a countdown.
    pub remaining_seconds: Option<u64>,
    pub user_context: Option<UserContext>,
}

impl Prompt {
    pub fn action(&self, name: &str) -> Option<&PromptAction> {
        self.actions.iter().find(|a| &*a.name == name)
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prompt")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("title", &self.title)
            .field("state", &self.state)
            .field("remaining_seconds", &self.remaining_seconds)
            .finish_non_exhaustive()
    }
}

/// Returned by [`PromptArbiter::request`](crate::PromptArbiter::request).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PromptHandle {
    pub id: PromptId,
    pub scope: PromptScope,
}
