use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    device::accessor::Window, explorer::dispatcher::Interaction,
    screen::screen_model::ElementKind, state::identity::ElementSignature,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Failed,
    Drifted,
}

/// One interaction attempt, written as a JSON line.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub depth: usize,
    pub scroll_attempt: usize,

    pub signature: String,
    pub kind: Option<ElementKind>,
    pub interaction: Option<String>,

    pub outcome: Option<Outcome>,
    pub window_before: Option<String>,
    pub window_after: Option<String>,
    pub error: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, depth: usize, scroll_attempt: usize, signature: &ElementSignature) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            step,
            depth,
            scroll_attempt,
            signature: signature.to_string(),
            kind: None,
            interaction: None,
            outcome: None,
            window_before: None,
            window_after: None,
            error: None,
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_interaction(mut self, interaction: &Interaction) -> Self {
        self.interaction = Some(interaction.to_string());
        self
    }

    pub fn with_windows(mut self, before: Option<&Window>, after: Option<&Window>) -> Self {
        self.window_before = before.map(ToString::to_string);
        self.window_after = after.map(ToString::to_string);
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}
