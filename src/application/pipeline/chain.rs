use std::sync::Arc;

use crate::application::pipeline::model::ModelStep;
use crate::application::pipeline::parsers::StringOutputParser;
use crate::application::pipeline::runnable::{Pipe, Runnable, RunnableExt};
use crate::domain::ports::LlmService;
use crate::domain::{ChatPromptTemplate, DomainError, PromptValues};

/// prompt → model → parser.
pub type LlmChain<P> = Pipe<Pipe<ChatPromptTemplate, ModelStep>, P>;

pub fn llm_chain<P>(prompt: ChatPromptTemplate, model: ModelStep, parser: P) -> LlmChain<P>
where
    P: Runnable<String>,
{
    prompt.pipe(model).pipe(parser)
}

pub const DEFAULT_DOCUMENT_SEPARATOR: &str = "\n\n";

pub struct StuffDocumentsChain {
    chain: LlmChain<StringOutputParser>,
    document_variable: String,
    separator: String,
}

impl StuffDocumentsChain {
    pub fn new(llm: Arc<dyn LlmService>, prompt: ChatPromptTemplate) -> Self {
        Self::with_model(ModelStep::new(llm), prompt)
    }

    pub fn with_model(model: ModelStep, prompt: ChatPromptTemplate) -> Self {
        Self {
            chain: llm_chain(prompt, model, StringOutputParser),
            document_variable: "context".to_string(),
            separator: DEFAULT_DOCUMENT_SEPARATOR.to_string(),
        }
    }

    pub fn with_document_variable(mut self, name: impl Into<String>) -> Self {
        self.document_variable = name.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn format_documents<S: AsRef<str>>(&self, documents: &[S]) -> String {
        documents
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    pub async fn invoke<S: AsRef<str>>(
        &self,
        mut values: PromptValues,
        documents: &[S],
    ) -> Result<String, DomainError> {
        values.insert(self.document_variable.clone(), self.format_documents(documents));
        self.chain.invoke(values).await
    }
}
