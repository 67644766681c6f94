//! Knowledge items — the unit of learned context.
//!
//! A [`KnowledgeItem`] is a single lesson with scoring metadata. Items are
//! created by a curator (or by seeding), edited in place by id, rescored by
//! feedback, and deleted only by the engine's refine pass or an explicit
//! removal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::record::KnowledgeRecord;

/// Caller-specific annotations on an item. Values must be JSON scalars.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Default relative importance of a new item.
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// Default effectiveness of a new item (no evidence either way).
pub const DEFAULT_EFFECTIVENESS: f64 = 0.5;

/// Kind of knowledge an item holds.
///
/// The first four are the built-in tags; any other string is carried as
/// [`Category::Other`] so callers can extend the set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Strategy,
    Insight,
    Pattern,
    Failure,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Strategy => "strategy",
            Category::Insight => "insight",
            Category::Pattern => "pattern",
            Category::Failure => "failure",
            Category::Other(s) => s,
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        // Built-in tags match in any case; custom tags are kept as written.
        let tag = s.trim();
        [
            Category::Strategy,
            Category::Insight,
            Category::Pattern,
            Category::Failure,
        ]
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(tag))
        .unwrap_or_else(|| Category::Other(tag.to_string()))
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::from(s.as_str())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single versioned unit of learned knowledge.
///
/// Fields are private so the invariants hold by construction:
/// `id` never changes, `effectiveness` stays in `[0, 1]`, and every mutation
/// moves `updated_at` forward (never before `created_at`).
///
/// Serde goes through [`KnowledgeRecord`], so deserializing applies the same
/// checks as [`KnowledgeItem::from_plain_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KnowledgeRecord", into = "KnowledgeRecord")]
pub struct KnowledgeItem {
    id: String,
    content: String,
    category: Category,
    priority: f64,
    effectiveness: f64,
    usage_count: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    metadata: Metadata,
}

impl KnowledgeItem {
    /// Create an item with a generated id of the form `<category>-<uuid>`.
    pub fn new(content: impl Into<String>, category: impl Into<Category>) -> Self {
        let category = category.into();
        let id = format!("{}-{}", category, Uuid::new_v4());
        Self::with_id(id, content, category)
    }

    /// Create an item with a caller-chosen id (baseline seeding, tests).
    pub fn with_id(
        id: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<Category>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            content: content.into(),
            category: category.into(),
            priority: DEFAULT_PRIORITY,
            effectiveness: DEFAULT_EFFECTIVENESS,
            usage_count: 0,
            created_at: now,
            updated_at: now,
            metadata: Metadata::new(),
        }
    }

    /// Builder: set the priority. Checked by [`KnowledgeItem::validate`].
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: set the effectiveness, clamped to `[0, 1]`.
    pub fn with_effectiveness(mut self, effectiveness: f64) -> Self {
        self.effectiveness = clamp_unit(effectiveness);
        self
    }

    /// Builder: attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    // ── Accessors ──

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn effectiveness(&self) -> f64 {
        self.effectiveness
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The value used to rank items during refine.
    pub fn score(&self) -> f64 {
        self.effectiveness * self.priority
    }

    // ── Mutators (each one touches `updated_at`) ──

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.touch();
    }

    pub fn set_category(&mut self, category: impl Into<Category>) {
        self.category = category.into();
        self.touch();
    }

    /// Set the priority. Rejects non-finite or non-positive values.
    pub fn set_priority(&mut self, priority: f64) -> Result<()> {
        check_priority(&self.id, priority)?;
        self.priority = priority;
        self.touch();
        Ok(())
    }

    /// Set the effectiveness, clamped to `[0, 1]`.
    pub fn set_effectiveness(&mut self, effectiveness: f64) {
        self.effectiveness = clamp_unit(effectiveness);
        self.touch();
    }

    /// Move effectiveness by `delta`, clamped to `[0, 1]`.
    pub fn adjust_effectiveness(&mut self, delta: f64) {
        self.set_effectiveness(self.effectiveness + delta);
    }

    /// Exponential-moving-average update towards `signal` with rate `alpha`.
    ///
    /// Returns the new effectiveness.
    pub fn apply_feedback(&mut self, signal: f64, alpha: f64) -> f64 {
        let next = self.effectiveness + alpha * (signal - self.effectiveness);
        self.set_effectiveness(next);
        self.effectiveness
    }

    /// Count one more read/citation of this item.
    pub fn record_usage(&mut self) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.touch();
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
        self.touch();
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<serde_json::Value> {
        let removed = self.metadata.remove(key);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Check the invariants that cannot be enforced by the builders alone.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("knowledge item id must not be empty".into()));
        }
        check_priority(&self.id, self.priority)?;
        if let Some((key, _)) = self
            .metadata
            .iter()
            .find(|(_, v)| v.is_array() || v.is_object())
        {
            return Err(Error::Validation(format!(
                "metadata '{}' on item '{}' must be a scalar",
                key, self.id
            )));
        }
        Ok(())
    }

    /// Repair values an external producer may have left out of range:
    /// effectiveness is clamped and `updated_at` is raised to `created_at`.
    pub fn normalize(&mut self) {
        self.effectiveness = clamp_unit(self.effectiveness);
        if self.updated_at < self.created_at {
            self.updated_at = self.created_at;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    /// Reassemble an item from already-parsed parts. Used by record decoding.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: String,
        content: String,
        category: Category,
        priority: f64,
        effectiveness: f64,
        usage_count: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        metadata: Metadata,
    ) -> Self {
        let mut item = Self {
            id,
            content,
            category,
            priority,
            effectiveness,
            usage_count,
            created_at,
            updated_at,
            metadata,
        };
        item.normalize();
        item
    }
}

/// Clamp to `[0, 1]`; NaN collapses to the neutral default.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_EFFECTIVENESS
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn check_priority(id: &str, priority: f64) -> Result<()> {
    if !priority.is_finite() || priority <= 0.0 {
        return Err(Error::Validation(format!(
            "priority of item '{}' must be a positive number, got {}",
            id, priority
        )));
    }
    Ok(())
}
