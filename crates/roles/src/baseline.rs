//! A small seed set for demos and the replay harness.

use ace_core::{Category, KnowledgeItem};

use crate::delta::SOURCE_KEY;

/// Four starting lessons for match-outcome prediction.
pub fn baseline_items() -> Vec<KnowledgeItem> {
    [
        (
            "baseline-1",
            "Home advantage typically provides a 3-5% win probability increase",
            Category::Pattern,
            0.9,
            0.85,
        ),
        (
            "baseline-2",
            "Recent form (last 5 matches) is highly predictive of the next outcome",
            Category::Pattern,
            0.9,
            0.82,
        ),
        (
            "baseline-3",
            "Team strength ratings should be normalized by the opponents faced",
            Category::Strategy,
            0.8,
            0.78,
        ),
        (
            "baseline-4",
            "Injuries to key players significantly change the expected outcome",
            Category::Pattern,
            0.85,
            0.80,
        ),
    ]
    .into_iter()
    .map(|(id, content, category, priority, effectiveness)| {
        KnowledgeItem::with_id(id, content, category)
            .with_priority(priority)
            .with_effectiveness(effectiveness)
            .with_metadata(SOURCE_KEY, "baseline")
    })
    .collect()
}
