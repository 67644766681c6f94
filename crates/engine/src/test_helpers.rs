//! Stub roles for engine tests.

use std::sync::Mutex;

use ace_core::{
    Analyst, Curator, ExecutionTrace, KnowledgeItem, ReflectionResult, RoleError, Strategist,
};

/// Returns fixed strategies and records the ids it was shown.
pub struct StubStrategist {
    strategies: Vec<String>,
    fail: bool,
    seen: Mutex<Vec<Vec<String>>>,
}

impl StubStrategist {
    pub fn new(strategies: &[&str]) -> Self {
        Self {
            strategies: strategies.iter().map(|s| s.to_string()).collect(),
            fail: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn seen_contexts(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Strategist for StubStrategist {
    fn name(&self) -> &str {
        "stub_strategist"
    }

    async fn generate(&self, _task: &str, context: &[KnowledgeItem]) -> Result<Vec<String>, RoleError> {
        if self.fail {
            return Err(RoleError::Generation("scripted failure".into()));
        }
        self.seen
            .lock()
            .unwrap()
            .push(context.iter().map(|i| i.id().to_string()).collect());
        Ok(self.strategies.clone())
    }
}

/// Returns a fixed reflection, optionally checking the trace first.
pub struct StubAnalyst {
    reflection: ReflectionResult,
    require_core: bool,
}

impl StubAnalyst {
    pub fn insights(insights: &[&str]) -> Self {
        Self {
            reflection: ReflectionResult::default().with_insights(insights.iter().copied()),
            require_core: false,
        }
    }

    pub fn requiring_core() -> Self {
        Self {
            require_core: true,
            ..Self::insights(&[])
        }
    }
}

#[async_trait::async_trait]
impl Analyst for StubAnalyst {
    fn name(&self) -> &str {
        "stub_analyst"
    }

    async fn reflect(
        &self,
        trace: &ExecutionTrace,
        _context: &[KnowledgeItem],
    ) -> Result<ReflectionResult, RoleError> {
        if self.require_core {
            trace.require_core()?;
        }
        Ok(self.reflection.clone())
    }
}

/// Keeps every item and appends one insight item per reflection insight.
pub struct AppendCurator;

#[async_trait::async_trait]
impl Curator for AppendCurator {
    fn name(&self) -> &str {
        "append"
    }

    async fn curate(
        &self,
        current: &[KnowledgeItem],
        reflection: &ReflectionResult,
    ) -> Result<Vec<KnowledgeItem>, RoleError> {
        let mut next = current.to_vec();
        next.extend(
            reflection
                .insights()
                .iter()
                .map(|text| KnowledgeItem::new(text.clone(), "insight")),
        );
        Ok(next)
    }
}

/// Returns an empty set.
pub struct DroppingCurator;

#[async_trait::async_trait]
impl Curator for DroppingCurator {
    fn name(&self) -> &str {
        "dropping"
    }

    async fn curate(
        &self,
        _current: &[KnowledgeItem],
        _reflection: &ReflectionResult,
    ) -> Result<Vec<KnowledgeItem>, RoleError> {
        Ok(Vec::new())
    }
}

/// Returns the current set without its first item.
pub struct SkipFirstCurator;

#[async_trait::async_trait]
impl Curator for SkipFirstCurator {
    fn name(&self) -> &str {
        "skip_first"
    }

    async fn curate(
        &self,
        current: &[KnowledgeItem],
        _reflection: &ReflectionResult,
    ) -> Result<Vec<KnowledgeItem>, RoleError> {
        Ok(current.iter().skip(1).cloned().collect())
    }
}

/// Returns the current set with its first item repeated.
pub struct DuplicatingCurator;

#[async_trait::async_trait]
impl Curator for DuplicatingCurator {
    fn name(&self) -> &str {
        "duplicating"
    }

    async fn curate(
        &self,
        current: &[KnowledgeItem],
        _reflection: &ReflectionResult,
    ) -> Result<Vec<KnowledgeItem>, RoleError> {
        let mut next = current.to_vec();
        if let Some(first) = current.first() {
            next.push(first.clone());
        }
        Ok(next)
    }
}

pub struct FailingCurator;

#[async_trait::async_trait]
impl Curator for FailingCurator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn curate(
        &self,
        _current: &[KnowledgeItem],
        _reflection: &ReflectionResult,
    ) -> Result<Vec<KnowledgeItem>, RoleError> {
        Err(RoleError::Curation("scripted failure".into()))
    }
}
