use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{ChatRequest, LlmService, ModelReply};
use crate::domain::DomainError;

/// Replays a fixed list of replies and records every request it receives. Once the
/// script runs out every call fails with `ExternalService`.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<ModelReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| ModelReply::Text(t.into())).collect())
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn generate(&self, request: ChatRequest) -> Result<ModelReply, DomainError> {
        self.requests
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .push(request);

        self.replies
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .pop_front()
            .ok_or_else(|| DomainError::external("scripted model has no replies left"))
    }
}
