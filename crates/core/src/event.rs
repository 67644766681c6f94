//! Engine events — a bounded record of recent curation activity.
//!
//! Events are appended as the knowledge set changes so callers can see what
//! curation and refinement did without diffing snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Everything the engine records about changes to the knowledge set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Items were added directly (baseline seeding, restore from records).
    Seeded { added: usize },

    /// A curator's result replaced the knowledge set.
    Curated {
        curator: String,
        before: usize,
        after: usize,
        added: usize,
        updated: usize,
        dropped: usize,
    },

    /// A curator dropped existing ids; the engine kept its result anyway.
    CurationAnomaly {
        curator: String,
        dropped_ids: Vec<String>,
        looks_like_rewrite: bool,
    },

    /// Grow-and-refine discarded the lowest-ranked items.
    Refined {
        before: usize,
        after: usize,
        removed_ids: Vec<String>,
    },

    /// An item was deleted on request.
    Removed { id: String },
}

/// An event stamped with when it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Reflection cycles completed when the event was recorded.
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: EngineEvent,
}

/// A ring buffer of recent events. The oldest entry is evicted when full.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LoggedEvent>,
    capacity: usize,
}

impl EventLog {
    /// Create a log holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, cycle: u64, event: EngineEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LoggedEvent {
            cycle,
            timestamp: Utc::now(),
            event,
        });
    }

    /// The most recent `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LoggedEvent> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoggedEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_evicts_oldest_when_full() {
        let mut log = EventLog::new(2);
        log.push(0, EngineEvent::Seeded { added: 1 });
        log.push(1, EngineEvent::Removed { id: "a".into() });
        log.push(2, EngineEvent::Removed { id: "b".into() });

        assert_eq!(log.len(), 2);
        let recent = log.recent(10);
        assert_eq!(recent[0].cycle, 1);
        assert_eq!(recent[1].event, EngineEvent::Removed { id: "b".into() });
    }

    #[test]
    fn recent_returns_tail_oldest_first() {
        let mut log = EventLog::new(10);
        for i in 0..5 {
            log.push(i, EngineEvent::Seeded { added: i as usize });
        }
        let tail = log.recent(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].cycle, 3);
        assert_eq!(tail[1].cycle, 4);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut log = EventLog::new(0);
        log.push(0, EngineEvent::Seeded { added: 1 });
        log.push(0, EngineEvent::Seeded { added: 2 });
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn logged_event_serializes_flat_with_kind_tag() {
        let mut log = EventLog::new(4);
        log.push(
            3,
            EngineEvent::Refined {
                before: 21,
                after: 10,
                removed_ids: vec!["x".into()],
            },
        );
        let json = serde_json::to_value(&log.recent(1)[0]).unwrap();
        assert_eq!(json["kind"], "refined");
        assert_eq!(json["cycle"], 3);
        assert_eq!(json["after"], 10);
    }
}
