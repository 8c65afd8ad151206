use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::application::pipeline::runnable::Runnable;
use crate::domain::ports::{ChatRequest, LlmService};
use crate::domain::{ChatPromptTemplate, DomainError, Message, PromptValues};

#[async_trait]
impl Runnable<PromptValues> for ChatPromptTemplate {
    type Output = Vec<Message>;

    async fn invoke(&self, input: PromptValues) -> Result<Vec<Message>, DomainError> {
        self.render(&input)
    }
}

#[derive(Clone)]
pub struct ModelStep {
    llm: Arc<dyn LlmService>,
    temperature: Option<f64>,
}

impl ModelStep {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl Runnable<Vec<Message>> for ModelStep {
    type Output = String;

    #[instrument(skip_all, fields(messages = input.len()))]
    async fn invoke(&self, input: Vec<Message>) -> Result<String, DomainError> {
        let mut request = ChatRequest::new(input);
        request.temperature = self.temperature;
        self.llm.generate(request).await?.into_text()
    }
}
