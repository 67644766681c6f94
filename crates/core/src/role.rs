//! Role traits — the three pluggable capabilities the engine delegates to.
//!
//! - [`Strategist`] proposes strategies for a task.
//! - [`Analyst`] reflects on an execution trace.
//! - [`Curator`] merges a reflection into the knowledge set.
//!
//! All three receive the current items as a read-only slice, so none of them
//! can mutate engine state. Implementations may call out to an LLM, run
//! rules, or replay scripted answers in tests; the engine only sees the
//! trait.

use async_trait::async_trait;

use crate::error::RoleError;
use crate::item::KnowledgeItem;
use crate::reflection::{ExecutionTrace, ReflectionResult};

/// Generates candidate strategies for a task.
///
/// An empty `context` is valid (cold start) and must still produce output.
#[async_trait]
pub trait Strategist: Send + Sync {
    /// A human-readable name for logs (e.g., "ranked", "llm").
    fn name(&self) -> &str;

    async fn generate(
        &self,
        task: &str,
        context: &[KnowledgeItem],
    ) -> std::result::Result<Vec<String>, RoleError>;
}

/// Turns one execution trace into findings.
///
/// Must fail with [`RoleError::Analysis`] when the trace lacks the fields it
/// needs, rather than guessing.
#[async_trait]
pub trait Analyst: Send + Sync {
    fn name(&self) -> &str;

    async fn reflect(
        &self,
        trace: &ExecutionTrace,
        context: &[KnowledgeItem],
    ) -> std::result::Result<ReflectionResult, RoleError>;
}

/// Merges a reflection into the knowledge set by delta update.
///
/// The returned set must contain every id of `current` (edited in place or
/// untouched) plus any new items. Dropping ids is the engine's job; a curator
/// that drops them is reported as a contract anomaly.
#[async_trait]
pub trait Curator: Send + Sync {
    fn name(&self) -> &str;

    async fn curate(
        &self,
        current: &[KnowledgeItem],
        reflection: &ReflectionResult,
    ) -> std::result::Result<Vec<KnowledgeItem>, RoleError>;
}
