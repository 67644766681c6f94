//! `ace replay` — Run recorded execution traces through the engine with
//! the rule-based roles and print what was learned.
//!
//! Each trace drives one full cycle: generate → reflect → curate → refine.
//! A trace may carry a `credit` array of item ids; when it also says
//! whether the attempt succeeded, those items get feedback first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ace_config::AceConfig;
use ace_core::reflection::STRATEGIES_KEY;
use ace_core::{ExecutionTrace, KnowledgeItem, KnowledgeRecord};
use ace_engine::{ContextEngine, StateSummary};
use ace_roles::{
    baseline_items, DeltaCurator, OutcomeAnalyst, RankedStrategist, RetryPolicy, Retrying,
};
use serde::Serialize;
use tracing::info;

/// Trace key listing item ids to credit with the outcome.
const CREDIT_KEY: &str = "credit";

pub struct ReplayArgs {
    pub config: Option<PathBuf>,
    pub traces: PathBuf,
    pub seed: Option<PathBuf>,
    pub baseline: bool,
    pub export: Option<PathBuf>,
}

/// One replayed cycle.
#[derive(Debug, Serialize)]
pub struct CycleLine {
    pub cycle: u64,
    pub task: String,
    pub strategies: Vec<String>,
    pub added: usize,
    pub updated: usize,
    pub dropped: usize,
    pub pruned: usize,
}

#[derive(Debug, Serialize)]
pub struct ReplayOutput {
    pub cycles: Vec<CycleLine>,
    pub summary: StateSummary,
}

pub async fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.config.unwrap_or_else(AceConfig::config_path);
    let config = AceConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}"))?;

    let traces = read_traces(&args.traces)?;
    let seed = match args.seed {
        Some(seed_path) => read_records(&seed_path)?
            .into_iter()
            .map(KnowledgeItem::from_plain_record)
            .collect::<ace_core::Result<Vec<_>>>()?,
        None if args.baseline => baseline_items(),
        None => Vec::new(),
    };

    let mut engine = build_engine(&config)?;
    engine.seed(seed)?;

    let cycles = replay(&mut engine, traces).await?;
    let output = ReplayOutput {
        cycles,
        summary: engine.get_state_summary(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(export) = args.export {
        std::fs::write(&export, serde_json::to_string_pretty(&engine.export_records())?)?;
        info!(path = %export.display(), items = engine.len(), "Exported knowledge records");
    }

    Ok(())
}

/// An engine over the rule-based roles, each wrapped in the configured
/// retry policy.
pub fn build_engine(config: &AceConfig) -> ace_core::Result<ContextEngine> {
    let policy = RetryPolicy::from_config(&config.roles);
    ContextEngine::new(
        Arc::new(Retrying::new(
            RankedStrategist::new(config.engine.max_strategies),
            policy.clone(),
        )),
        Arc::new(Retrying::new(OutcomeAnalyst, policy.clone())),
        Arc::new(Retrying::new(
            DeltaCurator::new(config.roles.curator.clone()),
            policy,
        )),
    )
    .with_config(config.engine.clone())
}

pub async fn replay(
    engine: &mut ContextEngine,
    traces: Vec<ExecutionTrace>,
) -> ace_core::Result<Vec<CycleLine>> {
    let mut lines = Vec::with_capacity(traces.len());

    for mut trace in traces {
        let task = trace.task().unwrap_or_else(|| "replay".to_string());
        let strategies = engine.generate_strategies(&task).await?;
        if trace.strategies().is_empty() {
            trace.insert(STRATEGIES_KEY, strategies.clone());
        }

        if let Some(success) = trace.succeeded() {
            let credited = credited_ids(&trace);
            if !credited.is_empty() {
                engine.record_outcome(&credited, success)?;
            }
        }

        let report = engine.learn(&trace).await?;
        lines.push(CycleLine {
            cycle: engine.total_cycles(),
            task,
            strategies,
            added: report.curation.added.len(),
            updated: report.curation.updated.len(),
            dropped: report.curation.dropped.len(),
            pruned: report.curation.refine.removed_ids.len(),
        });
    }

    Ok(lines)
}

fn credited_ids(trace: &ExecutionTrace) -> Vec<String> {
    trace
        .get(CREDIT_KEY)
        .and_then(|v| v.as_array())
        .map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn read_traces(path: &Path) -> Result<Vec<ExecutionTrace>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read traces from {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&content)
        .map_err(|e| format!("Invalid traces file {}: {e}", path.display()))?)
}

fn read_records(path: &Path) -> Result<Vec<KnowledgeRecord>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read records from {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&content)
        .map_err(|e| format!("Invalid records file {}: {e}", path.display()))?)
}
