use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::{AssistantContent, CompletionModel, ToolDefinition};
use rig::message::{Message as RigMessage, ToolResultContent, UserContent};
use rig::providers::gemini;
use rig::OneOrMany;
use tracing::{debug, instrument};

use crate::domain::ports::{ChatRequest, LlmService, ModelReply};
use crate::domain::{AgentStep, DomainError, MessageRole, ToolCall};
use crate::infrastructure::config::LlmConfig;

/// Chat model backed by Google Gemini. Reads `GEMINI_API_KEY` from the environment.
pub struct GeminiLlm {
    client: gemini::Client,
    model: String,
    temperature: Option<f64>,
}

impl GeminiLlm {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: gemini::Client::from_env(),
            model: model.into(),
            temperature: None,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.model.clone()).with_temperature(config.temperature)
    }

    pub fn default_model() -> Self {
        Self::new("gemini-1.5-flash")
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn to_rig_messages(request: &ChatRequest) -> (Option<String>, Vec<RigMessage>) {
    let system: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let preamble = (!system.is_empty()).then(|| system.join("\n\n"));

    let mut messages: Vec<RigMessage> = request
        .messages
        .iter()
        .filter_map(|m| match m.role {
            MessageRole::System => None,
            MessageRole::User => Some(RigMessage::user(m.content.clone())),
            MessageRole::Assistant => Some(RigMessage::assistant(m.content.clone())),
        })
        .collect();

    for step in &request.steps {
        messages.extend(step_messages(step));
    }

    (preamble, messages)
}

fn step_messages(step: &AgentStep) -> [RigMessage; 2] {
    let call = RigMessage::Assistant {
        id: None,
        content: OneOrMany::one(AssistantContent::tool_call(
            step.call.id.clone(),
            step.call.name.clone(),
            step.call.arguments.clone(),
        )),
    };
    let result = RigMessage::User {
        content: OneOrMany::one(UserContent::tool_result(
            step.call.id.clone(),
            OneOrMany::one(ToolResultContent::text(step.observation.clone())),
        )),
    };
    [call, result]
}

fn tool_definitions(request: &ChatRequest) -> Vec<ToolDefinition> {
    request
        .tools
        .iter()
        .map(|t| ToolDefinition {
            name: t.name.clone(),
            description: t.description.clone(),
            parameters: t.parameters.clone(),
        })
        .collect()
}

#[async_trait]
impl LlmService for GeminiLlm {
    #[instrument(skip_all, fields(model = %self.model, messages = request.messages.len(), steps = request.steps.len()))]
    async fn generate(&self, request: ChatRequest) -> Result<ModelReply, DomainError> {
        let (preamble, mut messages) = to_rig_messages(&request);
        let prompt = messages
            .pop()
            .ok_or_else(|| DomainError::validation("chat request has no user or assistant message"))?;

        let model = self.client.completion_model(&self.model);
        let mut builder = model
            .completion_request(prompt)
            .messages(messages)
            .tools(tool_definitions(&request));
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature.or(self.temperature) {
            builder = builder.temperature(temperature);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::external(format!("Gemini request failed: {e}")))?;

        let mut text = String::new();
        for content in response.choice.into_iter() {
            match content {
                AssistantContent::ToolCall(call) => {
                    debug!(tool = %call.function.name, "model requested tool");
                    return Ok(ModelReply::ToolCall(ToolCall::new(
                        call.id,
                        call.function.name,
                        call.function.arguments,
                    )));
                }
                AssistantContent::Text(part) => text.push_str(&part.text),
                _ => {}
            }
        }

        Ok(ModelReply::Text(text))
    }
}
