//! Short-lived highlight feedback for lines picked up by a stroke.
//!
//! Each element owns its own deadline, so flashing a line again only restarts
//! that line's timer and a new stroke never cancels an older flash.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::annotate::hit_test::ElementId;
use crate::constants::HIGHLIGHT_DURATION;

#[derive(Debug, Clone)]
pub struct HighlightTracker {
    deadlines: HashMap<ElementId, Instant>,
    duration: Duration,
}

impl Default for HighlightTracker {
    fn default() -> Self {
        Self::new(HIGHLIGHT_DURATION)
    }
}

impl HighlightTracker {
    pub fn new(duration: Duration) -> Self {
        Self {
            deadlines: HashMap::new(),
            duration,
        }
    }

    pub fn flash<'a>(&mut self, ids: impl IntoIterator<Item = &'a ElementId>, now: Instant) {
        let until = now + self.duration;
        for id in ids {
            self.deadlines.insert(*id, until);
        }
    }

    pub fn is_lit(&self, id: &ElementId, now: Instant) -> bool {
        self.deadlines.get(id).is_some_and(|until| now < *until)
    }

    /// Forget expired highlights. Returns true when anything reverted.
    pub fn sweep(&mut self, now: Instant) -> bool {
        let before = self.deadlines.len();
        self.deadlines.retain(|_, until| now < *until);
        before != self.deadlines.len()
    }

    pub fn lit_count(&self, now: Instant) -> usize {
        self.deadlines.values().filter(|until| now < **until).count()
    }

    /// Drop highlights belonging to a message that is no longer rendered.
    pub fn forget_message(&mut self, message: u64) {
        self.deadlines.retain(|id, _| id.message != message);
    }
}
