//! Retrying — per-attempt timeout and bounded retries around any role.
//!
//! The engine never retries on its own; wrap a role in [`Retrying`] to get
//! caller-side retry. Only errors that report [`RoleError::is_retryable`]
//! (timeouts, malformed replies, transient provider failures) are retried.
//! The delay between attempts starts at `backoff` and doubles each time.

use std::future::Future;
use std::time::Duration;

use ace_config::RolesConfig;
use ace_core::{
    Analyst, Curator, ExecutionTrace, KnowledgeItem, ReflectionResult, RoleError, Strategist,
};
use async_trait::async_trait;
use tracing::{info, warn};

/// Attempt budget for a wrapped role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first; at least 1.
    pub max_attempts: u32,
    pub timeout: Duration,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, timeout: Duration, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            timeout,
            backoff,
        }
    }

    pub fn from_config(config: &RolesConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.timeout_secs),
            Duration::from_millis(config.backoff_ms),
        )
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        // attempt is the 1-based attempt that just failed
        self.backoff.saturating_mul(1u32 << (attempt - 1).min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RolesConfig::default())
    }
}

/// A role wrapped with a [`RetryPolicy`].
pub struct Retrying<R> {
    inner: R,
    policy: RetryPolicy,
}

impl<R> Retrying<R> {
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn run<T, F, Fut>(&self, role: &str, mut call: F) -> Result<T, RoleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RoleError>>,
    {
        let max = self.policy.max_attempts;
        let mut attempt = 1;
        loop {
            let error = match tokio::time::timeout(self.policy.timeout, call()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        info!(role, attempt, "Role call succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => e,
                Err(_) => RoleError::Timeout {
                    role: role.to_string(),
                    timeout_secs: self.policy.timeout.as_secs(),
                },
            };

            if attempt >= max || !error.is_retryable() {
                return Err(error);
            }

            let delay = self.policy.delay_before(attempt);
            warn!(
                role,
                attempt,
                max_attempts = max,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Role call failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl<R: Strategist> Strategist for Retrying<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, task: &str, context: &[KnowledgeItem]) -> Result<Vec<String>, RoleError> {
        self.run(self.inner.name(), || self.inner.generate(task, context))
            .await
    }
}

#[async_trait]
impl<R: Analyst> Analyst for Retrying<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn reflect(
        &self,
        trace: &ExecutionTrace,
        context: &[KnowledgeItem],
    ) -> Result<ReflectionResult, RoleError> {
        self.run(self.inner.name(), || self.inner.reflect(trace, context))
            .await
    }
}

#[async_trait]
impl<R: Curator> Curator for Retrying<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn curate(
        &self,
        current: &[KnowledgeItem],
        reflection: &ReflectionResult,
    ) -> Result<Vec<KnowledgeItem>, RoleError> {
        self.run(self.inner.name(), || self.inner.curate(current, reflection))
            .await
    }
}
