//! # ACE Core
//!
//! Domain types, role traits, and error definitions for the ACE context
//! engine. This crate defines the model every other crate builds on:
//!
//! - [`KnowledgeItem`] — a scored unit of learned context
//! - [`ReflectionResult`] / [`ExecutionTrace`] — reflection output and input
//! - [`Strategist`], [`Analyst`], [`Curator`] — the pluggable roles
//! - [`Provider`] — the LLM backend seam used by prompted roles
//!
//! Implementations live in their respective crates; tests use stub roles.

pub mod error;
pub mod event;
pub mod item;
pub mod message;
pub mod provider;
pub mod record;
pub mod reflection;
pub mod role;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, RoleError};
pub use event::{EngineEvent, EventLog, LoggedEvent};
pub use item::{Category, KnowledgeItem, Metadata};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use record::{KnowledgeRecord, ReflectionRecord};
pub use reflection::{ExecutionTrace, ReflectionResult};
pub use role::{Analyst, Curator, Strategist};
