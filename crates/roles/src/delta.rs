//! Rule-based curator that applies reflections as delta updates.
//!
//! Every existing item is carried over. Each reflection line either
//! reinforces an item that already says the same thing or is appended as a
//! new item. Reported failures take a small amount of effectiveness off the
//! items that were in play.

use std::collections::HashMap;

use ace_config::CuratorConfig;
use ace_core::{Category, Curator, KnowledgeItem, ReflectionResult, RoleError};
use async_trait::async_trait;
use tracing::debug;

/// Metadata key recording which curator created an item.
pub const SOURCE_KEY: &str = "source";

pub struct DeltaCurator {
    config: CuratorConfig,
}

impl DeltaCurator {
    pub fn new(config: CuratorConfig) -> Self {
        Self { config }
    }
}

impl Default for DeltaCurator {
    fn default() -> Self {
        Self::new(CuratorConfig::default())
    }
}

/// Lowercase, collapse whitespace, strip trailing punctuation.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .trim_end_matches(['.', '!', ';', ','])
        .to_string()
}

struct Delta {
    items: Vec<KnowledgeItem>,
    by_content: HashMap<String, usize>,
    added: usize,
    reinforced: usize,
}

impl Delta {
    fn new(current: &[KnowledgeItem]) -> Self {
        let mut by_content = HashMap::with_capacity(current.len());
        for (i, item) in current.iter().enumerate() {
            by_content.entry(normalize(item.content())).or_insert(i);
        }
        Self {
            items: current.to_vec(),
            by_content,
            added: 0,
            reinforced: 0,
        }
    }

    fn apply(&mut self, lines: &[String], category: Category, priority: f64, step: f64) {
        for line in lines {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            let key = normalize(text);
            if let Some(&i) = self.by_content.get(&key) {
                let item = &mut self.items[i];
                // The new priority is finite and positive, so this cannot fail.
                if item.set_priority(item.priority() + step).is_ok() {
                    self.reinforced += 1;
                }
                continue;
            }
            let item = KnowledgeItem::new(text, category.clone())
                .with_priority(priority)
                .with_metadata(SOURCE_KEY, "delta_curator");
            self.by_content.insert(key, self.items.len());
            self.items.push(item);
            self.added += 1;
        }
    }
}

#[async_trait]
impl Curator for DeltaCurator {
    fn name(&self) -> &str {
        "delta"
    }

    async fn curate(
        &self,
        current: &[KnowledgeItem],
        reflection: &ReflectionResult,
    ) -> Result<Vec<KnowledgeItem>, RoleError> {
        let mut delta = Delta::new(current);

        if !reflection.failures().is_empty() {
            for item in delta.items.iter_mut() {
                item.adjust_effectiveness(-self.config.failure_penalty);
            }
        }

        let step = self.config.reinforce_step;
        delta.apply(reflection.insights(), Category::Insight, self.config.insight_priority, step);
        delta.apply(reflection.patterns(), Category::Pattern, self.config.pattern_priority, step);
        delta.apply(
            reflection.recommendations(),
            Category::Strategy,
            self.config.strategy_priority,
            step,
        );
        delta.apply(reflection.failures(), Category::Failure, self.config.failure_priority, step);

        debug!(
            added = delta.added,
            reinforced = delta.reinforced,
            penalized = !reflection.failures().is_empty(),
            "Delta curation"
        );
        Ok(delta.items)
    }
}
