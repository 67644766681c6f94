//! End-to-end integration tests for the ACE learning loop.
//!
//! These tests exercise the full pipeline from task to refined knowledge:
//! prompted roles over a scripted provider, the delta curator, feedback,
//! refine, and persistence through plain records.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ace_config::{EngineConfig, RolesConfig};
use ace_core::error::ProviderError;
use ace_core::message::Message;
use ace_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use ace_core::{Category, EngineEvent, Error, ExecutionTrace, KnowledgeRecord, RoleError};
use ace_engine::ContextEngine;
use ace_roles::{
    baseline_items, DeltaCurator, LlmAnalyst, LlmStrategist, OutcomeAnalyst, RankedStrategist,
    RetryPolicy, Retrying,
};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: Mutex<Vec<Result<String, ProviderError>>>,
    call_count: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        }
    }

    fn texts(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let scripted = responses
            .get(*count)
            .cloned()
            .unwrap_or_else(|| panic!("ScriptedProvider: no response for call #{}", *count));
        // Errors consume their slot too, so a retry sees the next response.
        *count += 1;
        let reply = scripted?;

        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: Some(Usage {
                prompt_tokens: 100,
                completion_tokens: 40,
            }),
            model: request.model,
        })
    }
}

fn llm_engine(provider: Arc<ScriptedProvider>) -> ContextEngine {
    let roles = RolesConfig::default();
    let policy = RetryPolicy::new(3, Duration::from_secs(5), Duration::from_millis(1));
    ContextEngine::new(
        Arc::new(Retrying::new(
            LlmStrategist::new(provider.clone(), &roles, 5),
            policy.clone(),
        )),
        Arc::new(Retrying::new(LlmAnalyst::new(provider, &roles), policy)),
        Arc::new(DeltaCurator::default()),
    )
}

fn rule_engine(config: EngineConfig) -> ContextEngine {
    ContextEngine::new(
        Arc::new(RankedStrategist::default()),
        Arc::new(OutcomeAnalyst),
        Arc::new(DeltaCurator::default()),
    )
    .with_config(config)
    .unwrap()
}

// ── Full cycle ───────────────────────────────────────────────────────────

#[tokio::test]
async fn full_cycle_with_prompted_roles() {
    let provider = Arc::new(ScriptedProvider::texts(&[
        r#"Here are the strategies:
           [{"name": "Form", "description": "weight the last five results"},
            {"name": "Injuries", "description": "discount teams missing key players"}]"#,
        r#"{"insights": ["Recent form outweighed home advantage"],
            "patterns": ["Favourites with injured strikers underperform"],
            "failures": ["Overrated home advantage"],
            "recommendations": ["Cap the home advantage adjustment at 3%"],
            "context_gaps": ["No data on travel fatigue"]}"#,
    ]));
    let mut engine = llm_engine(provider.clone());
    engine.seed(baseline_items()).unwrap();

    let strategies = engine.generate_strategies("Predict: A vs B").await.unwrap();
    assert_eq!(
        strategies,
        vec![
            "Form: weight the last five results",
            "Injuries: discount teams missing key players"
        ]
    );
    assert!(engine.items().iter().all(|i| i.usage_count() == 1));

    let trace = ExecutionTrace::basic("A vs B", "Home Win", "Away Win")
        .with("correct", false)
        .with("strategies", strategies.clone());
    let report = engine.learn(&trace).await.unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(engine.total_cycles(), 1);
    assert_eq!(report.curation.added.len(), 4);
    assert!(report.curation.dropped.is_empty());
    assert_eq!(report.reflection.context_gaps, vec!["No data on travel fatigue"]);

    // Every baseline item took the failure penalty.
    let baseline = engine.get_item("baseline-1").unwrap();
    assert!((baseline.effectiveness() - 0.825).abs() < 1e-9);

    let summary = engine.get_state_summary();
    assert_eq!(summary.total_items, 8);
    assert_eq!(summary.by_category["pattern"], 4);
    assert_eq!(summary.by_category["insight"], 1);
    assert_eq!(summary.by_category["strategy"], 2);
    assert_eq!(summary.by_category["failure"], 1);
    assert_eq!(summary.total_cycles, 1);
}

#[tokio::test(start_paused = true)]
async fn transient_provider_failure_is_retried_inside_a_cycle() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::Timeout("slow upstream".into())),
        Ok(r#"["retry worked"]"#.into()),
    ]));
    let mut engine = llm_engine(provider.clone());

    let strategies = engine.generate_strategies("task").await.unwrap();

    assert_eq!(strategies, vec!["retry worked"]);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn malformed_trace_is_a_validation_error() {
    let provider = Arc::new(ScriptedProvider::texts(&[]));
    let mut engine = llm_engine(provider.clone());
    engine.seed(baseline_items()).unwrap();
    let before = engine.items().to_vec();

    let err = engine
        .reflect(&ExecutionTrace::new().with("prediction", "Draw"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(provider.calls(), 0);
    assert_eq!(engine.items(), before.as_slice());
    assert_eq!(engine.total_cycles(), 0);
}

#[tokio::test]
async fn exhausted_retries_surface_the_role_error() {
    let provider = Arc::new(ScriptedProvider::texts(&["nope", "still nope", "no json"]));
    let mut engine = llm_engine(provider.clone());

    let err = engine.generate_strategies("task").await.unwrap_err();

    assert!(matches!(err, Error::Role(RoleError::MalformedResponse(_))));
    assert_eq!(provider.calls(), 3);
}

// ── Long-running behaviour ───────────────────────────────────────────────

#[tokio::test]
async fn many_cycles_stay_bounded_and_keep_the_best() {
    let mut engine = rule_engine(EngineConfig::default());
    engine.seed(baseline_items()).unwrap();

    for round in 0..30 {
        let task = format!("match {round}");
        let strategies = engine.generate_strategies(&task).await.unwrap();
        let outcome = if round % 3 == 0 { "Draw" } else { "Home Win" };
        let trace = ExecutionTrace::basic(&task, "Home Win", outcome).with("strategies", strategies);
        engine.learn(&trace).await.unwrap();
        assert!(engine.len() <= 20, "round {round}: {} items", engine.len());
    }

    assert_eq!(engine.total_cycles(), 30);
    let refined = engine
        .events()
        .iter()
        .filter(|e| matches!(e.event, EngineEvent::Refined { .. }))
        .count();
    assert!(refined > 0);
    assert!(engine.items().iter().all(|i| (0.0..=1.0).contains(&i.effectiveness())));
}

#[tokio::test]
async fn feedback_changes_what_survives_refine() {
    let mut engine = rule_engine(EngineConfig {
        refine_threshold: 4,
        refine_floor: 2,
        ..EngineConfig::default()
    });
    engine.seed(baseline_items()).unwrap();

    // Push the weakest baseline item to the top.
    for _ in 0..10 {
        engine.record_feedback("baseline-3", true).unwrap();
    }
    for id in ["baseline-1", "baseline-2", "baseline-4"] {
        for _ in 0..10 {
            engine.record_feedback(id, false).unwrap();
        }
    }

    engine
        .learn(&ExecutionTrace::basic("t", "Home Win", "Home Win"))
        .await
        .unwrap();

    assert!(engine.len() <= 4);
    assert!(engine.get_item("baseline-3").is_some());
    assert_eq!(
        engine.get_item("baseline-3").unwrap().category(),
        &Category::Strategy
    );
}

// ── Persistence through plain records ────────────────────────────────────

#[tokio::test]
async fn state_survives_export_and_rebuild() {
    let mut engine = rule_engine(EngineConfig::default());
    engine.seed(baseline_items()).unwrap();
    engine
        .learn(&ExecutionTrace::basic("t", "Draw", "Home Win"))
        .await
        .unwrap();
    engine.record_feedback("baseline-2", true).unwrap();

    let json = serde_json::to_string(&engine.export_records()).unwrap();
    let records: Vec<KnowledgeRecord> = serde_json::from_str(&json).unwrap();

    let rebuilt = ContextEngine::from_records(
        Arc::new(RankedStrategist::default()),
        Arc::new(OutcomeAnalyst),
        Arc::new(DeltaCurator::default()),
        records,
    )
    .unwrap();

    assert_eq!(rebuilt.items(), engine.items());
    assert_eq!(rebuilt.total_cycles(), 0);
}
