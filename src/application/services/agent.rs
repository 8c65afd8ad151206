use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::ports::{ChatRequest, LlmService, ModelReply, Tool};
use crate::domain::{
    AgentStep, ChatPromptTemplate, Conversation, DomainError, Message, PromptValues, ToolCall,
    ToolSpec,
};

pub const DEFAULT_MAX_ITERATIONS: usize = 15;

#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub output: String,
    pub steps: Vec<AgentStep>,
}

pub struct AgentExecutor {
    llm: Arc<dyn LlmService>,
    tools: ToolSet,
    prompt: ChatPromptTemplate,
    max_iterations: usize,
    temperature: Option<f64>,
}

impl AgentExecutor {
    /// `system_prompt` is used verbatim; braces in it are not placeholders.
    pub fn new(
        llm: Arc<dyn LlmService>,
        tools: ToolSet,
        system_prompt: &str,
    ) -> Result<Self, DomainError> {
        let escaped = system_prompt.replace('{', "{{").replace('}', "}}");
        let prompt = ChatPromptTemplate::builder()
            .system(escaped)
            .placeholder("chat_history")
            .user("{input}")
            .build()?;
        Ok(Self::with_prompt(llm, tools, prompt))
    }

    /// `prompt` must accept `chat_history` and `input`.
    pub fn with_prompt(llm: Arc<dyn LlmService>, tools: ToolSet, prompt: ChatPromptTemplate) -> Self {
        Self {
            llm,
            tools,
            prompt,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    #[instrument(skip(self, history), fields(history = history.len(), tools = self.tools.len()))]
    pub async fn run(&self, input: &str, history: &[Message]) -> Result<AgentOutcome, DomainError> {
        let values = PromptValues::new()
            .with("input", input)
            .with_messages("chat_history", history.to_vec());
        let messages = self.prompt.render(&values)?;
        let specs = self.tools.specs();
        let mut steps: Vec<AgentStep> = Vec::new();

        for iteration in 1..=self.max_iterations {
            let mut request = ChatRequest::new(messages.clone())
                .with_tools(specs.clone())
                .with_steps(steps.clone());
            request.temperature = self.temperature;

            match self.llm.generate(request).await? {
                ModelReply::Text(output) => {
                    info!(iteration, steps = steps.len(), "agent finished");
                    return Ok(AgentOutcome { output, steps });
                }
                ModelReply::ToolCall(call) => {
                    debug!(iteration, tool = %call.name, "tool requested");
                    steps.push(self.dispatch(call).await);
                }
            }
        }

        warn!(max_iterations = self.max_iterations, "agent hit iteration cap");
        Err(DomainError::AgentExhausted(self.max_iterations))
    }

    async fn dispatch(&self, call: ToolCall) -> AgentStep {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "unknown tool requested");
            let observation = format!(
                "Error: tool `{}` is not available. Available tools: {}",
                call.name,
                self.tools.names().join(", ")
            );
            return AgentStep {
                call,
                observation,
                failed: true,
            };
        };

        match tool.call(call.arguments.clone()).await {
            Ok(observation) => AgentStep {
                call,
                observation,
                failed: false,
            },
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool failed");
                AgentStep {
                    call,
                    observation: format!("Error: {e}"),
                    failed: true,
                }
            }
        }
    }
}

pub struct ChatSession {
    executor: AgentExecutor,
}

impl ChatSession {
    pub fn new(executor: AgentExecutor) -> Self {
        Self { executor }
    }

    /// Answers `input` in the context of `conversation`. The exchange is appended only
    /// when the agent produces an answer.
    pub async fn respond(
        &self,
        conversation: &mut Conversation,
        input: &str,
    ) -> Result<String, DomainError> {
        let outcome = self.executor.run(input, &conversation.messages).await?;
        conversation.record_turn(input, outcome.output.clone());
        Ok(outcome.output)
    }
}
