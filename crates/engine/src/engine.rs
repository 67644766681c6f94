//! The context engine — owns the knowledge set and drives the
//! generate → reflect → curate → refine cycle.
//!
//! One engine instance has exactly one logical owner: mutating operations
//! take `&mut self`, nothing is locked, nothing runs in the background.
//! Role calls are the only awaits; the engine adds no timeout of its own
//! (wrap roles in `ace_roles::Retrying` for that).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ace_config::EngineConfig;
use ace_core::{
    Analyst, Category, Curator, EngineEvent, Error, EventLog, ExecutionTrace, KnowledgeItem,
    KnowledgeRecord, Metadata, ReflectionRecord, ReflectionResult, Result, RoleError, Strategist,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::refine::{self, RefineReport};
use crate::summary::StateSummary;

/// A partial edit applied to one item by [`ContextEngine::update_item`].
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub content: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<f64>,
    /// Entries inserted (or overwritten) in the item's metadata.
    pub metadata: Metadata,
}

/// What a curate call changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationReport {
    pub curator: String,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    /// Existing ids the curator left out (a contract anomaly when non-empty).
    pub dropped: Vec<String>,
    pub refine: RefineReport,
}

/// Outcome of [`ContextEngine::learn`]: one reflect plus one curate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub reflection: ReflectionRecord,
    pub curation: CurationReport,
}

/// Orchestrates the three roles over an owned, ordered knowledge set.
pub struct ContextEngine {
    strategist: Arc<dyn Strategist>,
    analyst: Arc<dyn Analyst>,
    curator: Arc<dyn Curator>,
    config: EngineConfig,
    /// Insertion order; ranking happens only inside refine.
    items: Vec<KnowledgeItem>,
    cycles: u64,
    events: EventLog,
    /// Set by generate, cleared by reflect.
    generated_this_cycle: bool,
}

impl ContextEngine {
    /// Create an engine with the default policy.
    pub fn new(
        strategist: Arc<dyn Strategist>,
        analyst: Arc<dyn Analyst>,
        curator: Arc<dyn Curator>,
    ) -> Self {
        let config = EngineConfig::default();
        Self {
            strategist,
            analyst,
            curator,
            events: EventLog::new(config.event_log_capacity),
            config,
            items: Vec::new(),
            cycles: 0,
            generated_this_cycle: false,
        }
    }

    /// Rebuild an engine from previously exported plain records.
    pub fn from_records(
        strategist: Arc<dyn Strategist>,
        analyst: Arc<dyn Analyst>,
        curator: Arc<dyn Curator>,
        records: impl IntoIterator<Item = KnowledgeRecord>,
    ) -> Result<Self> {
        let mut engine = Self::new(strategist, analyst, curator);
        engine.import_records(records)?;
        Ok(engine)
    }

    /// Replace the policy. Rejects invalid settings; resets the event log
    /// to the new capacity.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        self.events = EventLog::new(config.event_log_capacity);
        self.config = config;
        Ok(self)
    }

    // ── Read access ──

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current items in insertion order.
    pub fn items(&self) -> &[KnowledgeItem] {
        &self.items
    }

    pub fn get_item(&self, id: &str) -> Option<&KnowledgeItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn items_by_category(&self, category: &Category) -> Vec<&KnowledgeItem> {
        self.items.iter().filter(|i| i.category() == category).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reflection cycles completed.
    pub fn total_cycles(&self) -> u64 {
        self.cycles
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Counts by category, mean effectiveness, cycles and the most recent
    /// `summary_events` log entries. No side effects.
    pub fn get_state_summary(&self) -> StateSummary {
        self.state_summary_with(self.config.summary_events)
    }

    /// Same as [`get_state_summary`](Self::get_state_summary) with an explicit event count.
    pub fn state_summary_with(&self, recent_events: usize) -> StateSummary {
        StateSummary::build(&self.items, self.cycles, self.events.recent(recent_events))
    }

    /// Plain records of every item, in set order.
    pub fn export_records(&self) -> Vec<KnowledgeRecord> {
        self.items.iter().map(KnowledgeItem::to_plain_record).collect()
    }

    // ── Seeding and explicit edits ──

    /// Add one item (baseline seeding). Fails on a duplicate id or an
    /// invalid item.
    pub fn add_item(&mut self, item: KnowledgeItem) -> Result<()> {
        self.seed(std::iter::once(item)).map(|_| ())
    }

    /// Add several items at once. Either all are added or none are.
    pub fn seed(&mut self, items: impl IntoIterator<Item = KnowledgeItem>) -> Result<usize> {
        let mut incoming: Vec<KnowledgeItem> = items.into_iter().collect();
        let mut ids: HashSet<String> = self.items.iter().map(|i| i.id().to_string()).collect();
        for item in &mut incoming {
            item.validate()?;
            if !ids.insert(item.id().to_string()) {
                return Err(Error::Validation(format!(
                    "knowledge item '{}' already exists",
                    item.id()
                )));
            }
            item.normalize();
        }

        let added = incoming.len();
        if added > 0 {
            self.items.extend(incoming);
            self.events.push(self.cycles, EngineEvent::Seeded { added });
            debug!(added, total = self.items.len(), "Seeded knowledge items");
        }
        Ok(added)
    }

    /// Rebuild items from plain records and add them. Either all are added
    /// or none are.
    pub fn import_records(&mut self, records: impl IntoIterator<Item = KnowledgeRecord>) -> Result<usize> {
        let items = records
            .into_iter()
            .map(KnowledgeItem::from_plain_record)
            .collect::<Result<Vec<_>>>()?;
        self.seed(items)
    }

    /// Edit one item in place.
    pub fn update_item(&mut self, id: &str, patch: ItemPatch) -> Result<&KnowledgeItem> {
        let position = self.position(id)?;
        if let Some((key, _)) = patch
            .metadata
            .iter()
            .find(|(_, v)| v.is_array() || v.is_object())
        {
            return Err(Error::Validation(format!(
                "metadata '{}' on item '{}' must be a scalar",
                key, id
            )));
        }

        let item = &mut self.items[position];
        // Priority first: it is the only field that can be rejected.
        if let Some(priority) = patch.priority {
            item.set_priority(priority)?;
        }
        if let Some(content) = patch.content {
            item.set_content(content);
        }
        if let Some(category) = patch.category {
            item.set_category(category);
        }
        for (key, value) in patch.metadata {
            item.insert_metadata(key, value);
        }
        debug!(id, "Updated knowledge item");
        Ok(&self.items[position])
    }

    /// Delete one item.
    pub fn remove_item(&mut self, id: &str) -> Result<KnowledgeItem> {
        let position = self.position(id)?;
        let item = self.items.remove(position);
        self.events.push(
            self.cycles,
            EngineEvent::Removed {
                id: item.id().to_string(),
            },
        );
        info!(id, "Removed knowledge item");
        Ok(item)
    }

    // ── The cycle ──

    /// Ask the strategist for strategies. Every item passed as context has
    /// its usage count bumped once the strategist succeeds.
    pub async fn generate_strategies(&mut self, task: &str) -> Result<Vec<String>> {
        let positions = self.context_positions();
        let context: Vec<KnowledgeItem> = positions.iter().map(|&i| self.items[i].clone()).collect();

        debug!(
            strategist = self.strategist.name(),
            context_items = context.len(),
            "Generating strategies"
        );

        let mut strategies = self.strategist.generate(task, &context).await?;
        if strategies.len() > self.config.max_strategies {
            debug!(
                returned = strategies.len(),
                limit = self.config.max_strategies,
                "Truncating strategies"
            );
            strategies.truncate(self.config.max_strategies);
        }

        for &i in &positions {
            self.items[i].record_usage();
        }
        self.generated_this_cycle = true;

        info!(
            strategist = self.strategist.name(),
            task,
            strategies = strategies.len(),
            context_items = positions.len(),
            "Generated strategies"
        );
        Ok(strategies)
    }

    /// Analyze an execution trace. A trace the analyst cannot use surfaces
    /// as [`Error::Validation`]; other role failures propagate unchanged.
    pub async fn reflect(&mut self, trace: &ExecutionTrace) -> Result<ReflectionResult> {
        if !self.generated_this_cycle {
            warn!(
                cycle = self.cycles,
                "Reflecting without a preceding generate_strategies in this cycle"
            );
        }

        let reflection = self
            .analyst
            .reflect(trace, &self.items)
            .await
            .map_err(|e| match e {
                RoleError::Analysis(message) => Error::Validation(message),
                other => Error::Role(other),
            })?;

        self.cycles += 1;
        self.generated_this_cycle = false;

        info!(
            analyst = self.analyst.name(),
            cycle = self.cycles,
            insights = reflection.insights().len(),
            failures = reflection.failures().len(),
            recommendations = reflection.recommendations().len(),
            "Reflection complete"
        );
        Ok(reflection)
    }

    /// Merge a reflection through the curator, then refine.
    ///
    /// The curator's set replaces the current one only if every item is
    /// valid and ids are unique; otherwise the previous set stays in place.
    pub async fn curate(&mut self, reflection: ReflectionResult) -> Result<CurationReport> {
        let curator = self.curator.name().to_string();
        let mut proposed = self.curator.curate(&self.items, &reflection).await?;

        let mut proposed_ids: HashSet<String> = HashSet::with_capacity(proposed.len());
        for item in &mut proposed {
            item.validate().map_err(|e| {
                Error::Curation(format!("curator '{}' returned an invalid item: {}", curator, e))
            })?;
            if !proposed_ids.insert(item.id().to_string()) {
                return Err(Error::Curation(format!(
                    "curator '{}' returned duplicate id '{}'",
                    curator,
                    item.id()
                )));
            }
            item.normalize();
        }

        let (added, updated, dropped) = {
            let previous: HashMap<&str, &KnowledgeItem> =
                self.items.iter().map(|i| (i.id(), i)).collect();
            let mut added = Vec::new();
            let mut updated = Vec::new();
            for item in &proposed {
                match previous.get(item.id()) {
                    None => added.push(item.id().to_string()),
                    Some(old) if **old != *item => updated.push(item.id().to_string()),
                    Some(_) => {}
                }
            }
            let dropped: Vec<String> = self
                .items
                .iter()
                .filter(|i| !proposed_ids.contains(i.id()))
                .map(|i| i.id().to_string())
                .collect();
            (added, updated, dropped)
        };

        let before = self.items.len();
        if !dropped.is_empty() {
            let looks_like_rewrite =
                dropped.len() as f64 >= self.config.rewrite_ratio * before as f64;
            warn!(
                curator = %curator,
                dropped = dropped.len(),
                previous = before,
                looks_like_rewrite,
                "Curator dropped existing items; keeping its result"
            );
            self.events.push(
                self.cycles,
                EngineEvent::CurationAnomaly {
                    curator: curator.clone(),
                    dropped_ids: dropped.clone(),
                    looks_like_rewrite,
                },
            );
        }

        self.items = proposed;
        self.events.push(
            self.cycles,
            EngineEvent::Curated {
                curator: curator.clone(),
                before,
                after: self.items.len(),
                added: added.len(),
                updated: updated.len(),
                dropped: dropped.len(),
            },
        );

        let refine = self.refine();

        info!(
            curator = %curator,
            added = added.len(),
            updated = updated.len(),
            total = self.items.len(),
            "Curation applied"
        );

        Ok(CurationReport {
            curator,
            added,
            updated,
            dropped,
            refine,
        })
    }

    /// Reflect on a trace and curate the result in one step.
    pub async fn learn(&mut self, trace: &ExecutionTrace) -> Result<CycleReport> {
        let reflection = self.reflect(trace).await?;
        let record = reflection.to_plain_record();
        let curation = self.curate(reflection).await?;
        Ok(CycleReport {
            reflection: record,
            curation,
        })
    }

    /// Grow-and-refine. Runs after every curate; safe to call any time.
    pub fn refine(&mut self) -> RefineReport {
        let report = refine::refine_items(
            &mut self.items,
            self.config.refine_threshold,
            self.config.refine_floor,
        );
        if report.is_noop() {
            debug!(items = report.after, "Refine: nothing to prune");
        } else {
            info!(
                before = report.before,
                after = report.after,
                threshold = self.config.refine_threshold,
                "Refine pruned knowledge set"
            );
            self.events.push(
                self.cycles,
                EngineEvent::Refined {
                    before: report.before,
                    after: report.after,
                    removed_ids: report.removed_ids.clone(),
                },
            );
        }
        report
    }

    // ── Feedback ──

    /// Move an item's effectiveness towards 1.0 (success) or 0.0 (failure)
    /// by the configured learning rate. Returns the new value.
    pub fn record_feedback(&mut self, item_id: &str, success: bool) -> Result<f64> {
        let alpha = self.config.learning_rate;
        let position = self.position(item_id)?;
        let item = &mut self.items[position];
        let before = item.effectiveness();
        let signal = if success { 1.0 } else { 0.0 };
        let after = item.apply_feedback(signal, alpha);
        debug!(id = item_id, success, before, after, "Recorded feedback");
        Ok(after)
    }

    /// Apply the same feedback to several items. Fails without changing
    /// anything if any id is unknown.
    ///
    /// Each distinct id is updated once; the returned values follow the
    /// order in which ids first appear.
    pub fn record_outcome<S: AsRef<str>>(&mut self, item_ids: &[S], success: bool) -> Result<Vec<f64>> {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = item_ids
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| seen.insert(*id))
            .collect();
        for id in &distinct {
            self.position(id)?;
        }
        distinct
            .into_iter()
            .map(|id| self.record_feedback(id, success))
            .collect()
    }

    // ── Internals ──

    fn position(&self, id: &str) -> Result<usize> {
        self.items
            .iter()
            .position(|i| i.id() == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Positions passed to the strategist, in set order.
    fn context_positions(&self) -> Vec<usize> {
        match self.config.context_limit {
            Some(limit) if limit < self.items.len() => {
                let mut top: Vec<usize> = refine::rank(&self.items).into_iter().take(limit).collect();
                top.sort_unstable();
                top
            }
            _ => (0..self.items.len()).collect(),
        }
    }
}
