//! Roles that prompt an LLM through the [`Provider`] trait.
//!
//! Both roles send a single user message and parse JSON out of the reply.
//! Prompts stay domain-neutral; callers frame the domain through the task
//! text and the trace fields.

use std::sync::Arc;

use ace_config::RolesConfig;
use ace_core::{
    Analyst, ExecutionTrace, KnowledgeItem, Message, Provider, ProviderRequest, ReflectionResult,
    RoleError, Strategist,
};
use async_trait::async_trait;
use tracing::debug;

use crate::parse::{parse_reflection, parse_strategies};
use crate::summary::context_summary;

/// Model settings for one prompted role.
#[derive(Debug, Clone)]
struct Sampling {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Sampling {
    fn request(&self, prompt: String) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }
}

async fn ask(provider: &dyn Provider, sampling: &Sampling, prompt: String) -> Result<String, RoleError> {
    let response = provider.complete(sampling.request(prompt)).await?;
    if let Some(usage) = &response.usage {
        debug!(
            provider = provider.name(),
            model = %response.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Provider call complete"
        );
    }
    Ok(response.message.content)
}

/// Asks the model for strategies as a JSON array.
pub struct LlmStrategist {
    provider: Arc<dyn Provider>,
    sampling: Sampling,
    max_strategies: usize,
}

impl LlmStrategist {
    pub fn new(provider: Arc<dyn Provider>, config: &RolesConfig, max_strategies: usize) -> Self {
        Self {
            provider,
            sampling: Sampling {
                model: config.model.clone(),
                temperature: config.generate_temperature,
                max_tokens: config.max_tokens,
            },
            max_strategies: max_strategies.max(1),
        }
    }

    fn prompt(&self, task: &str, context: &[KnowledgeItem]) -> String {
        format!(
            "You are a strategist that improves by learning from past outcomes.\n\n\
             Current knowledge:\n{summary}\n\n\
             Task: {task}\n\n\
             Using the knowledge above, propose {n} specific, actionable strategies for this task. \
             Prefer strategies that build on effective learnings and address recorded failures.\n\n\
             Respond with a JSON array of objects with \"name\" and \"description\" fields.",
            summary = context_summary(context),
            n = self.max_strategies,
        )
    }
}

#[async_trait]
impl Strategist for LlmStrategist {
    fn name(&self) -> &str {
        "llm"
    }

    async fn generate(&self, task: &str, context: &[KnowledgeItem]) -> Result<Vec<String>, RoleError> {
        let reply = ask(self.provider.as_ref(), &self.sampling, self.prompt(task, context)).await?;
        let mut strategies = parse_strategies(&reply)?;
        strategies.truncate(self.max_strategies);
        Ok(strategies)
    }
}

/// Asks the model to analyze a trace and answer with a JSON object.
pub struct LlmAnalyst {
    provider: Arc<dyn Provider>,
    sampling: Sampling,
}

impl LlmAnalyst {
    pub fn new(provider: Arc<dyn Provider>, config: &RolesConfig) -> Self {
        Self {
            provider,
            sampling: Sampling {
                model: config.model.clone(),
                temperature: config.reflect_temperature,
                max_tokens: config.max_tokens,
            },
        }
    }

    fn prompt(trace: &ExecutionTrace, context: &[KnowledgeItem]) -> String {
        let mut fields = String::new();
        for (key, value) in trace.as_map() {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            fields.push_str(&format!("{key}: {rendered}\n"));
        }

        format!(
            "You analyze how a decision turned out so future decisions improve.\n\n\
             Execution trace:\n{fields}\n\
             Current knowledge:\n{summary}\n\n\
             Provide:\n\
             1. insights: what worked and what did not\n\
             2. patterns: recurring themes\n\
             3. failures: what went wrong\n\
             4. recommendations: how to improve\n\
             5. context_gaps: knowledge that was missing\n\n\
             Respond with a JSON object with keys insights, patterns, failures, \
             recommendations, context_gaps; each an array of strings.",
            summary = context_summary(context),
        )
    }
}

#[async_trait]
impl Analyst for LlmAnalyst {
    fn name(&self) -> &str {
        "llm"
    }

    async fn reflect(
        &self,
        trace: &ExecutionTrace,
        context: &[KnowledgeItem],
    ) -> Result<ReflectionResult, RoleError> {
        trace.require_core()?;
        let reply = ask(self.provider.as_ref(), &self.sampling, Self::prompt(trace, context)).await?;
        parse_reflection(&reply)
    }
}
