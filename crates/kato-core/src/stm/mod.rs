//! Short-term memory buffer and the emotive/metadata aggregator.

mod aggregator;

pub use aggregator::Aggregator;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::pattern::Event;

/// STM transition policy applied after a learn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StmMode {
    /// Learn empties the STM.
    #[default]
    Clear,
    /// Learn evicts only the oldest event, keeping a sliding window.
    Rolling,
}

/// Ordered sequence of events awaiting learn, owned exclusively by one
/// session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stm {
    events: VecDeque<Event>,
}

impl Stm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a normalized event. Returns the new STM length.
    pub fn push(&mut self, event: Event) -> usize {
        self.events.push_back(event);
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of strings across all events (the quantity the
    /// "2 strings total" thresholds are measured against).
    pub fn total_symbols(&self) -> usize {
        self.events.iter().map(|e| e.len()).sum()
    }

    pub fn events(&self) -> &VecDeque<Event> {
        &self.events
    }

    pub fn as_vec(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    /// Whether auto-learn should fire after the most recent push, given
    /// `max_pattern_length` (0 disables auto-learn).
    pub fn should_auto_learn(&self, max_pattern_length: u32) -> bool {
        max_pattern_length > 0 && self.events.len() as u32 >= max_pattern_length
    }

    /// Apply the post-learn transition for `mode`.
    pub fn transition(&mut self, mode: StmMode) {
        match mode {
            StmMode::Clear => self.events.clear(),
            StmMode::Rolling => {
                self.events.pop_front();
            }
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
