//! Read-only state summaries for dashboards and logs.

use std::collections::BTreeMap;

use ace_core::{KnowledgeItem, LoggedEvent};
use serde::{Deserialize, Serialize};

/// Aggregate view of an engine's knowledge set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub total_items: usize,
    /// Item count per category name.
    pub by_category: BTreeMap<String, usize>,
    /// Mean effectiveness; `None` when the set is empty.
    pub mean_effectiveness: Option<f64>,
    /// Reflection cycles completed.
    pub total_cycles: u64,
    /// Most recent event-log entries, oldest first.
    pub recent_events: Vec<LoggedEvent>,
}

impl StateSummary {
    pub(crate) fn build(items: &[KnowledgeItem], total_cycles: u64, recent_events: Vec<LoggedEvent>) -> Self {
        let mut by_category = BTreeMap::new();
        for item in items {
            *by_category.entry(item.category().to_string()).or_insert(0) += 1;
        }

        let mean_effectiveness = if items.is_empty() {
            None
        } else {
            let total: f64 = items.iter().map(KnowledgeItem::effectiveness).sum();
            Some(total / items.len() as f64)
        };

        Self {
            total_items: items.len(),
            by_category,
            mean_effectiveness,
            total_cycles,
            recent_events,
        }
    }
}
