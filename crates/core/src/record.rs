//! Plain records — the serializable shape handed to UI and export layers.
//!
//! Records use only strings, numbers and maps, with timestamps rendered as
//! RFC 3339 strings, so nothing engine-internal crosses the boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::item::{Category, KnowledgeItem, Metadata};
use crate::reflection::ReflectionResult;

/// Plain form of a [`KnowledgeItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub id: String,
    pub content: String,
    pub category: String,
    pub priority: f64,
    pub effectiveness: f64,
    pub usage_count: u64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Plain form of a [`ReflectionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionRecord {
    pub insights: Vec<String>,
    pub patterns: Vec<String>,
    pub failures: Vec<String>,
    pub recommendations: Vec<String>,
    pub context_gaps: Vec<String>,
}

impl KnowledgeItem {
    pub fn to_plain_record(&self) -> KnowledgeRecord {
        KnowledgeRecord {
            id: self.id().to_string(),
            content: self.content().to_string(),
            category: self.category().to_string(),
            priority: self.priority(),
            effectiveness: self.effectiveness(),
            usage_count: self.usage_count(),
            created_at: format_timestamp(self.created_at()),
            updated_at: format_timestamp(self.updated_at()),
            metadata: self.metadata().clone(),
        }
    }

    /// Rebuild an item from its record. Fails on unparsable timestamps or
    /// values that break the item invariants.
    pub fn from_plain_record(record: KnowledgeRecord) -> Result<Self> {
        let created_at = parse_timestamp(&record.id, "created_at", &record.created_at)?;
        let updated_at = parse_timestamp(&record.id, "updated_at", &record.updated_at)?;
        let item = KnowledgeItem::from_parts(
            record.id,
            record.content,
            Category::from(record.category),
            record.priority,
            record.effectiveness,
            record.usage_count,
            created_at,
            updated_at,
            record.metadata,
        );
        item.validate()?;
        Ok(item)
    }
}

impl TryFrom<KnowledgeRecord> for KnowledgeItem {
    type Error = Error;

    fn try_from(record: KnowledgeRecord) -> Result<Self> {
        KnowledgeItem::from_plain_record(record)
    }
}

impl From<KnowledgeItem> for KnowledgeRecord {
    fn from(item: KnowledgeItem) -> Self {
        item.to_plain_record()
    }
}

impl ReflectionResult {
    pub fn to_plain_record(&self) -> ReflectionRecord {
        ReflectionRecord {
            insights: self.insights().to_vec(),
            patterns: self.patterns().to_vec(),
            failures: self.failures().to_vec(),
            recommendations: self.recommendations().to_vec(),
            context_gaps: self.context_gaps().to_vec(),
        }
    }
}

impl From<ReflectionRecord> for ReflectionResult {
    fn from(record: ReflectionRecord) -> Self {
        ReflectionResult::new(
            record.insights,
            record.patterns,
            record.failures,
            record.recommendations,
            record.context_gaps,
        )
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(id: &str, field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            Error::Validation(format!(
                "item '{}' has an invalid {} '{}': {}",
                id, field, raw, e
            ))
        })
}
