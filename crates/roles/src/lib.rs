//! Role implementations for the ACE context engine.
//!
//! - [`DeltaCurator`] — rule-based incremental curator
//! - [`RankedStrategist`] / [`OutcomeAnalyst`] — deterministic offline roles
//! - [`LlmStrategist`] / [`LlmAnalyst`] — prompt any [`ace_core::Provider`]
//! - [`Retrying`] — per-attempt timeout and bounded retry around any role

pub mod baseline;
pub mod delta;
pub mod heuristic;
pub mod llm;
pub mod parse;
pub mod retry;
pub mod summary;

#[cfg(test)]
mod test_helpers;

pub use baseline::baseline_items;
pub use delta::DeltaCurator;
pub use heuristic::{OutcomeAnalyst, RankedStrategist};
pub use llm::{LlmAnalyst, LlmStrategist};
pub use retry::{RetryPolicy, Retrying};
pub use summary::context_summary;
