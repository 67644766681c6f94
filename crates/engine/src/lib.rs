//! The context engine for ACE.
//!
//! [`ContextEngine`] owns an ordered set of knowledge items and runs the
//! learning cycle over three injected roles:
//!
//! 1. **Generate** — the strategist proposes strategies from current context
//! 2. **Reflect** — the analyst turns an execution trace into a reflection
//! 3. **Curate** — the curator merges the reflection into a new item set
//! 4. **Refine** — the engine prunes the set back under its threshold
//!
//! Feedback on individual items nudges their effectiveness between cycles.

pub mod engine;
pub mod refine;
pub mod summary;

#[cfg(test)]
mod test_helpers;

pub use engine::{ContextEngine, CurationReport, CycleReport, ItemPatch};
pub use refine::RefineReport;
pub use summary::StateSummary;
