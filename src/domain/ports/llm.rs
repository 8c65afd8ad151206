use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::{AgentStep, Message, ToolCall, ToolSpec};

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Tool calls already made during this request, replayed after `messages`.
    pub steps: Vec<AgentStep>,
    pub tools: Vec<ToolSpec>,
    pub temperature: Option<f64>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_steps(mut self, steps: Vec<AgentStep>) -> Self {
        self.steps = steps;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    ToolCall(ToolCall),
}

impl ModelReply {
    pub fn into_text(self) -> Result<String, DomainError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::ToolCall(call) => Err(DomainError::output_parse(format!(
                "expected text but the model requested tool `{}`",
                call.name
            ))),
        }
    }
}

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn generate(&self, request: ChatRequest) -> Result<ModelReply, DomainError>;

    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.generate(ChatRequest::new(vec![Message::user(prompt)]))
            .await?
            .into_text()
    }
}
