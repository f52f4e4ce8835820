use serde::{Deserialize, Serialize};

use crate::device::accessor::Window;
use crate::state::identity::ElementSignature;

/// Summary of one traversal run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraversalReport {
    pub app_identifier: String,
    pub max_depth: usize,

    /// Signatures in the order they were first attempted
    pub visited: Vec<ElementSignature>,

    /// Number of `handle_level` invocations
    pub levels_entered: usize,

    /// Deepest level reached
    pub deepest_level: usize,

    pub interactions_attempted: usize,
    pub interactions_failed: usize,

    /// Back presses that did not restore the window
    pub drifts: usize,
    pub recoveries: usize,

    /// Window the device was left on
    pub final_window: Option<Window>,
}

impl TraversalReport {
    pub fn new(app_identifier: &str, max_depth: usize) -> Self {
        Self {
            app_identifier: app_identifier.to_string(),
            max_depth,
            ..Self::default()
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Visited {} elements across {} levels (deepest {}): {} interactions, {} failed, {} drifts, {} recoveries",
            self.visited.len(),
            self.levels_entered,
            self.deepest_level,
            self.interactions_attempted,
            self.interactions_failed,
            self.drifts,
            self.recoveries
        )
    }
}
