mod agent;
mod basics;
mod memory;
mod parse;
mod rag;
mod sql;

use std::sync::Arc;

use tracing::info;

pub use agent::run_chat_loop;
pub use parse::{Ingredient, Person, Recipe};
pub use sql::STUDENT_SCHEMA;

use crate::application::pipeline::ModelStep;
use crate::application::{DocumentService, RagService};
use crate::domain::ports::{DocumentSource, EmbeddingService, LlmService};
use crate::domain::{DomainError, Message};
use crate::infrastructure::{AppConfig, InMemoryVectorStore};

pub const INLINE_DOCUMENTS: [&str; 2] = [
    "LangChain Expression Language or LCEL is a declarative way to easily compose chains together. \
     Any chain constructed this way will automatically have full sync, async, and streaming support.",
    "The passphrase is \"LangChain is awesome\"!",
];

pub fn sample_history() -> Vec<Message> {
    vec![
        Message::user("Hello"),
        Message::assistant("Hi, how can I help you?"),
        Message::user("My name is Aaron. I have a male 3 year-old German Shepherd dog name Donny."),
        Message::assistant("Hi Aaron, how can I help you?"),
        Message::user("What is LCEL?"),
        Message::assistant("LCEL stands for LangChain Expression Language"),
    ]
}

pub struct Lessons {
    config: AppConfig,
    llm: Arc<dyn LlmService>,
    embedding: Arc<dyn EmbeddingService>,
}

impl Lessons {
    pub fn new(
        config: AppConfig,
        llm: Arc<dyn LlmService>,
        embedding: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            config,
            llm,
            embedding,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn model(&self) -> ModelStep {
        ModelStep::new(self.llm.clone()).with_temperature(self.config.config.llm.temperature)
    }

    async fn build_index(
        &self,
        source: &dyn DocumentSource,
        top_k: usize,
    ) -> Result<Arc<RagService>, DomainError> {
        let rag = Arc::new(RagService::new(
            self.embedding.clone(),
            Arc::new(InMemoryVectorStore::new()),
            top_k,
        ));
        let rag_config = &self.config.config.rag;
        let documents =
            DocumentService::with_chunk_size(rag.clone(), rag_config.chunk_size, rag_config.chunk_overlap)?;

        documents.ingest(source).await?;
        info!(chunks = rag.indexed_count().await?, top_k, "knowledge base ready");
        Ok(rag)
    }
}
