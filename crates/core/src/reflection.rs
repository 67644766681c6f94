//! Reflection inputs and outputs.
//!
//! An [`ExecutionTrace`] is what the caller observed after acting on the
//! generated strategies. An analyst turns it into a [`ReflectionResult`],
//! which the engine hands to the curator exactly once.

use serde::{Deserialize, Serialize};

use crate::error::RoleError;

/// Trace key holding the task description.
pub const TASK_KEY: &str = "task";
/// Trace key holding the prediction or answer that was acted on.
pub const PREDICTION_KEY: &str = "prediction";
/// Trace key holding the strategies that were used.
pub const STRATEGIES_KEY: &str = "strategies";
/// Trace key holding the observed outcome.
pub const OUTCOME_KEY: &str = "outcome";

// Older producers name these fields differently.
const TASK_ALIASES: &[&str] = &[TASK_KEY, "match"];
const OUTCOME_ALIASES: &[&str] = &[OUTCOME_KEY, "actual_outcome"];

/// Caller-supplied record of one execution.
///
/// The engine treats it as an opaque mapping and passes it through; typed
/// accessors exist for analysts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionTrace(serde_json::Map<String, serde_json::Value>);

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the three fields every analyst needs.
    pub fn basic(
        task: impl Into<String>,
        prediction: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        Self::new()
            .with(TASK_KEY, task.into())
            .with(PREDICTION_KEY, prediction.into())
            .with(OUTCOME_KEY, outcome.into())
    }

    /// Builder: set a field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// A field as text; numbers and booleans are rendered, other shapes are not.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn task(&self) -> Option<String> {
        TASK_ALIASES.iter().find_map(|k| self.get_str(k))
    }

    pub fn prediction(&self) -> Option<String> {
        self.get_str(PREDICTION_KEY)
    }

    /// Strategies used, from either an array of strings or a single string.
    pub fn strategies(&self) -> Vec<String> {
        match self.0.get(STRATEGIES_KEY) {
            Some(serde_json::Value::Array(values)) => values
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn outcome(&self) -> Option<String> {
        OUTCOME_ALIASES.iter().find_map(|k| self.get_str(k))
    }

    /// Whether the trace marks the attempt as correct, if it says so.
    pub fn succeeded(&self) -> Option<bool> {
        self.0
            .get("correct")
            .or_else(|| self.0.get("success"))
            .and_then(|v| v.as_bool())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.0
    }

    /// Fail with [`RoleError::Analysis`] naming every listed key that is absent.
    pub fn require(&self, keys: &[&str]) -> Result<(), RoleError> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|k| self.0.get(*k).is_none_or(|v| v.is_null()))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RoleError::Analysis(format!(
                "execution trace is missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Check the minimum shape: a task, what was used (prediction or
    /// strategies), and the observed outcome.
    pub fn require_core(&self) -> Result<(), RoleError> {
        let mut missing = Vec::new();
        if self.task().is_none() {
            missing.push(TASK_KEY);
        }
        if self.prediction().is_none() && self.strategies().is_empty() {
            missing.push("prediction|strategies");
        }
        if self.outcome().is_none() {
            missing.push(OUTCOME_KEY);
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RoleError::Analysis(format!(
                "execution trace is missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ExecutionTrace {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<serde_json::Value> for ExecutionTrace {
    type Error = RoleError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Object(map) => Ok(Self(map)),
            other => Err(RoleError::Analysis(format!(
                "execution trace must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Findings from analyzing one execution. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionResult {
    #[serde(default)]
    insights: Vec<String>,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    failures: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    context_gaps: Vec<String>,
}

impl ReflectionResult {
    pub fn new(
        insights: Vec<String>,
        patterns: Vec<String>,
        failures: Vec<String>,
        recommendations: Vec<String>,
        context_gaps: Vec<String>,
    ) -> Self {
        Self {
            insights,
            patterns,
            failures,
            recommendations,
            context_gaps,
        }
    }

    pub fn with_insights<S: Into<String>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.insights = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_patterns<S: Into<String>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.patterns = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_failures<S: Into<String>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.failures = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recommendations<S: Into<String>>(
        mut self,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        self.recommendations = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context_gaps<S: Into<String>>(mut self, items: impl IntoIterator<Item = S>) -> Self {
        self.context_gaps = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn insights(&self) -> &[String] {
        &self.insights
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn context_gaps(&self) -> &[String] {
        &self.context_gaps
    }

    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
            && self.patterns.is_empty()
            && self.failures.is_empty()
            && self.recommendations.is_empty()
            && self.context_gaps.is_empty()
    }
}
