//! # User prompts and their arbitration.
//!
//! - [`PromptRequest`] / [`PromptHandle`]: what callers create and get back
//! - [`Prompt`]: snapshot handed to [`UiSurface::show_prompt`](crate::UiSurface::show_prompt)
//! - [`PromptArbiter`]: decides which prompt each panel shows

mod arbiter;
mod prompt;

pub use arbiter::PromptArbiter;
pub use prompt::{
    ActionType, Prompt, PromptAction, PromptCallback, PromptHandle, PromptRequest, PromptResponse,
    PromptScope, PromptState, UserContext,
};
