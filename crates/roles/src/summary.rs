//! Text rendering of the knowledge set for prompts.

use ace_core::{Category, KnowledgeItem};

/// Shown instead of a summary when there is nothing to summarize.
pub const COLD_START: &str = "No prior knowledge available. Starting fresh.";

/// Items listed per category.
pub const PER_CATEGORY: usize = 5;

/// Group items by category (first-seen order) and list the best
/// [`PER_CATEGORY`] of each by score.
pub fn context_summary(items: &[KnowledgeItem]) -> String {
    if items.is_empty() {
        return COLD_START.to_string();
    }

    let mut groups: Vec<(&Category, Vec<&KnowledgeItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(c, _)| *c == item.category()) {
            Some((_, members)) => members.push(item),
            None => groups.push((item.category(), vec![item])),
        }
    }

    let mut out = String::from("Previous learnings:\n");
    for (category, mut members) in groups {
        members.sort_by(|a, b| b.score().total_cmp(&a.score()));
        out.push_str(&format!("\n{}:\n", category.as_str().to_uppercase()));
        for item in members.into_iter().take(PER_CATEGORY) {
            out.push_str(&format!(
                "  - {} (effectiveness {:.2})\n",
                item.content(),
                item.effectiveness()
            ));
        }
    }
    out
}
