use std::collections::HashSet;

use crate::device::accessor::Window;
use crate::state::identity::ElementSignature;

/// Signatures attempted during one run. Append-only: entries are never
/// removed, so an element is attempted at most once per run.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<ElementSignature>,
    order: Vec<ElementSignature>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the signature was already present.
    pub fn insert(&mut self, signature: ElementSignature) -> bool {
        if !self.seen.insert(signature.clone()) {
            return false;
        }
        self.order.push(signature);
        true
    }

    pub fn contains(&self, signature: &ElementSignature) -> bool {
        self.seen.contains(signature)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Signatures in the order they were first visited.
    pub fn iter(&self) -> impl Iterator<Item = &ElementSignature> {
        self.order.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalPhase {
    Idle,
    AtLevel(usize),
    Exhausted,
}

/// Per-level bookkeeping of `handle_level`.
#[derive(Debug, Clone)]
pub struct LevelState {
    pub depth: usize,
    pub scroll_attempts: usize,
    /// Window recorded right before the interaction in progress.
    pub window_before: Option<Window>,
}

impl LevelState {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            scroll_attempts: 0,
            window_before: None,
        }
    }
}
