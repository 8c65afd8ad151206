use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::{ChatRequest, LlmService, ModelReply};
use crate::domain::DomainError;

/// Bounds every model call; an expired call fails with `Timeout` and is not retried.
pub struct TimeoutLlm {
    inner: Arc<dyn LlmService>,
    timeout: Duration,
}

impl TimeoutLlm {
    pub fn new(inner: Arc<dyn LlmService>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl LlmService for TimeoutLlm {
    async fn generate(&self, request: ChatRequest) -> Result<ModelReply, DomainError> {
        tokio::time::timeout(self.timeout, self.inner.generate(request))
            .await
            .map_err(|_| {
                DomainError::timeout(format!(
                    "model call exceeded {}s",
                    self.timeout.as_secs_f64()
                ))
            })?
    }
}
