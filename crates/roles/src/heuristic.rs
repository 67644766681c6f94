//! Deterministic roles that need no model: useful offline, in the replay
//! harness, and as a baseline to compare prompted roles against.

use ace_core::{
    Analyst, Category, ExecutionTrace, KnowledgeItem, ReflectionResult, RoleError, Strategist,
};
use async_trait::async_trait;
use tracing::debug;

/// Turns the highest-scoring items into strategy lines.
pub struct RankedStrategist {
    max_strategies: usize,
}

impl RankedStrategist {
    pub fn new(max_strategies: usize) -> Self {
        Self {
            max_strategies: max_strategies.max(1),
        }
    }
}

impl Default for RankedStrategist {
    fn default() -> Self {
        Self::new(5)
    }
}

fn strategy_line(item: &KnowledgeItem) -> String {
    match item.category() {
        Category::Strategy => format!("Apply: {}", item.content()),
        Category::Pattern => format!("Account for: {}", item.content()),
        Category::Insight => format!("Build on: {}", item.content()),
        Category::Failure => format!("Avoid: {}", item.content()),
        Category::Other(_) => item.content().to_string(),
    }
}

#[async_trait]
impl Strategist for RankedStrategist {
    fn name(&self) -> &str {
        "ranked"
    }

    async fn generate(&self, task: &str, context: &[KnowledgeItem]) -> Result<Vec<String>, RoleError> {
        if context.is_empty() {
            return Ok(vec![
                format!("Establish a baseline approach for: {task}"),
                "Record the prediction and the observed outcome for later reflection".to_string(),
            ]);
        }

        let mut ranked: Vec<&KnowledgeItem> = context.iter().collect();
        ranked.sort_by(|a, b| b.score().total_cmp(&a.score()));
        let strategies: Vec<String> = ranked
            .into_iter()
            .take(self.max_strategies)
            .map(strategy_line)
            .collect();
        debug!(count = strategies.len(), "Ranked strategies");
        Ok(strategies)
    }
}

/// Compares prediction with outcome and reports what that implies.
#[derive(Default)]
pub struct OutcomeAnalyst;

/// Whether the attempt succeeded: an explicit `correct`/`success` flag
/// wins, otherwise prediction and outcome are compared.
fn judge(trace: &ExecutionTrace) -> Option<bool> {
    trace.succeeded().or_else(|| {
        let prediction = trace.prediction()?;
        let outcome = trace.outcome()?;
        Some(prediction.trim().eq_ignore_ascii_case(outcome.trim()))
    })
}

#[async_trait]
impl Analyst for OutcomeAnalyst {
    fn name(&self) -> &str {
        "outcome"
    }

    async fn reflect(
        &self,
        trace: &ExecutionTrace,
        context: &[KnowledgeItem],
    ) -> Result<ReflectionResult, RoleError> {
        trace.require_core()?;

        // require_core guarantees both are present.
        let task = trace.task().unwrap_or_default();
        let outcome = trace.outcome().unwrap_or_default();
        let used = match trace.prediction() {
            Some(prediction) => prediction,
            None => trace.strategies().join("; "),
        };

        let mut insights = Vec::new();
        let mut patterns = Vec::new();
        let mut failures = Vec::new();
        let mut recommendations = Vec::new();
        let mut context_gaps = Vec::new();

        match judge(trace) {
            Some(true) => {
                insights.push(format!("'{used}' was right for '{task}'"));
                patterns.extend(
                    trace
                        .strategies()
                        .into_iter()
                        .map(|s| format!("Strategy held up: {s}")),
                );
            }
            Some(false) => {
                failures.push(format!("Expected '{used}' for '{task}' but observed '{outcome}'"));
                recommendations.push(format!(
                    "Revisit the assumptions behind '{used}' before similar tasks"
                ));
            }
            None => insights.push(format!("Observed '{outcome}' for '{task}'")),
        }

        if context.is_empty() {
            context_gaps.push(format!("No prior knowledge covered '{task}'"));
        }

        Ok(ReflectionResult::new(
            insights,
            patterns,
            failures,
            recommendations,
            context_gaps,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cold_start_strategies() {
        let strategies = RankedStrategist::default().generate("task A", &[]).await.unwrap();
        assert_eq!(strategies.len(), 2);
        assert!(strategies[0].contains("task A"));
    }

    #[tokio::test]
    async fn strategies_follow_score() {
        let context = vec![
            KnowledgeItem::with_id("low", "low one", "insight").with_effectiveness(0.1),
            KnowledgeItem::with_id("top", "top one", "strategy").with_effectiveness(0.9),
            KnowledgeItem::with_id("mid", "mid one", "failure").with_effectiveness(0.5),
        ];
        let strategies = RankedStrategist::new(2).generate("t", &context).await.unwrap();
        assert_eq!(strategies, vec!["Apply: top one", "Avoid: mid one"]);
    }

    #[tokio::test]
    async fn analyst_rejects_incomplete_trace() {
        let trace = ExecutionTrace::new().with("task", "t");
        let err = OutcomeAnalyst.reflect(&trace, &[]).await.unwrap_err();
        match err {
            RoleError::Analysis(msg) => {
                assert!(msg.contains("outcome"));
                assert!(msg.contains("prediction|strategies"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn wrong_prediction_yields_failure_and_recommendation() {
        let trace = ExecutionTrace::basic("A vs B", "Home Win", "Draw");
        let reflection = OutcomeAnalyst.reflect(&trace, &[]).await.unwrap();
        assert_eq!(reflection.failures().len(), 1);
        assert_eq!(reflection.recommendations().len(), 1);
        assert!(reflection.insights().is_empty());
        assert_eq!(reflection.context_gaps().len(), 1);
    }

    #[tokio::test]
    async fn explicit_flag_overrides_comparison() {
        let trace = ExecutionTrace::basic("A vs B", "Home Win", "home win").with("correct", false);
        let reflection = OutcomeAnalyst.reflect(&trace, &[]).await.unwrap();
        assert_eq!(reflection.failures().len(), 1);
    }

    #[tokio::test]
    async fn correct_prediction_credits_strategies() {
        let context = vec![KnowledgeItem::with_id("k", "x", "pattern")];
        let trace = ExecutionTrace::new()
            .with("match", "A vs B")
            .with("prediction", "Draw")
            .with("actual_outcome", "draw")
            .with("strategies", serde_json::json!(["weigh form"]));
        let reflection = OutcomeAnalyst.reflect(&trace, &context).await.unwrap();
        assert_eq!(reflection.insights().len(), 1);
        assert_eq!(reflection.patterns(), ["Strategy held up: weigh form"]);
        assert!(reflection.context_gaps().is_empty());
    }
}
