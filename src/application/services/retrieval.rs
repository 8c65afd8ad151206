use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::pipeline::{
    llm_chain, LlmChain, ModelStep, Runnable, StringOutputParser, StuffDocumentsChain,
};
use crate::application::services::rag::RagService;
use crate::domain::{ChatPromptTemplate, DomainError, Message, PromptValues, SearchResult};

pub const DEFAULT_REPHRASE_INSTRUCTION: &str = "Given the above conversation, generate a search query to look up in order to get information relevant to the conversation";

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(
        &self,
        input: &str,
        history: &[Message],
    ) -> Result<Vec<SearchResult>, DomainError>;
}

pub struct TopKRetriever {
    rag: Arc<RagService>,
    top_k: usize,
}

impl TopKRetriever {
    pub fn new(rag: Arc<RagService>, top_k: usize) -> Self {
        Self { rag, top_k }
    }
}

#[async_trait]
impl Retriever for TopKRetriever {
    async fn retrieve(
        &self,
        input: &str,
        _history: &[Message],
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.rag.retrieve_top_k(input, self.top_k).await
    }
}

pub struct HistoryAwareRetriever {
    inner: Arc<dyn Retriever>,
    rephrase: LlmChain<StringOutputParser>,
}

impl HistoryAwareRetriever {
    pub fn new(inner: Arc<dyn Retriever>, model: ModelStep) -> Result<Self, DomainError> {
        let prompt = ChatPromptTemplate::builder()
            .placeholder("chat_history")
            .user("{input}")
            .user(DEFAULT_REPHRASE_INSTRUCTION)
            .build()?;
        Ok(Self::with_prompt(inner, model, prompt))
    }

    /// `prompt` must accept `chat_history` and `input`.
    pub fn with_prompt(inner: Arc<dyn Retriever>, model: ModelStep, prompt: ChatPromptTemplate) -> Self {
        Self {
            inner,
            rephrase: llm_chain(prompt, model, StringOutputParser),
        }
    }
}

#[async_trait]
impl Retriever for HistoryAwareRetriever {
    #[instrument(skip(self, history), fields(history = history.len()))]
    async fn retrieve(
        &self,
        input: &str,
        history: &[Message],
    ) -> Result<Vec<SearchResult>, DomainError> {
        if history.is_empty() {
            return self.inner.retrieve(input, history).await;
        }

        let values = PromptValues::new()
            .with("input", input)
            .with_messages("chat_history", history.to_vec());
        let query = self.rephrase.invoke(values).await?;
        debug!(query = %query.trim(), "rephrased search query");

        self.inner.retrieve(query.trim(), history).await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalOutput {
    pub input: String,
    pub answer: String,
    pub context: Vec<SearchResult>,
}

/// The combine prompt receives `input`, `context` and, when given, `chat_history`.
pub struct RetrievalChain {
    retriever: Arc<dyn Retriever>,
    combine: StuffDocumentsChain,
}

impl RetrievalChain {
    pub fn new(retriever: Arc<dyn Retriever>, combine: StuffDocumentsChain) -> Self {
        Self { retriever, combine }
    }

    #[instrument(skip(self, history))]
    pub async fn invoke(
        &self,
        input: &str,
        history: &[Message],
    ) -> Result<RetrievalOutput, DomainError> {
        let context = self.retriever.retrieve(input, history).await?;
        let documents: Vec<&str> = context.iter().map(|r| r.chunk.content.as_str()).collect();

        let values = PromptValues::new()
            .with("input", input)
            .with_messages("chat_history", history.to_vec());
        let answer = self.combine.invoke(values, &documents).await?;

        Ok(RetrievalOutput {
            input: input.to_string(),
            answer,
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ModelReply;
    use crate::domain::DocumentChunk;
    use crate::infrastructure::{InMemoryVectorStore, KeywordEmbedding, ScriptedLlm};
    use uuid::Uuid;

    async fn seeded_rag() -> Arc<RagService> {
        let rag = Arc::new(RagService::new(
            Arc::new(KeywordEmbedding::default()),
            Arc::new(InMemoryVectorStore::new()),
            2,
        ));
        let doc_id = Uuid::new_v4();
        rag.index_chunks(&[
            DocumentChunk::new(doc_id, "LCEL is a declarative way to compose chains", 0),
            DocumentChunk::new(doc_id, "Donny is a three year old german shepherd", 1),
        ])
        .await
        .unwrap();
        rag
    }

    #[tokio::test]
    async fn test_history_aware_skips_rephrase_without_history() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let retriever = HistoryAwareRetriever::new(
            Arc::new(TopKRetriever::new(seeded_rag().await, 1)),
            ModelStep::new(llm.clone()),
        )
        .unwrap();

        let results = retriever.retrieve("what is LCEL", &[]).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.chunk_index, 0);
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_history_aware_uses_rephrased_query() {
        let llm = Arc::new(ScriptedLlm::new(vec![ModelReply::Text(
            "german shepherd Donny age".into(),
        )]));
        let retriever = HistoryAwareRetriever::new(
            Arc::new(TopKRetriever::new(seeded_rag().await, 1)),
            ModelStep::new(llm.clone()),
        )
        .unwrap();
        let history = vec![
            Message::user("I have a german shepherd named Donny."),
            Message::assistant("Nice!"),
        ];

        let results = retriever.retrieve("How old is it?", &history).await.unwrap();

        assert_eq!(results[0].chunk.chunk_index, 1);
        let request = &llm.requests()[0];
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[2], Message::user("How old is it?"));
        assert_eq!(
            request.messages[3],
            Message::user(DEFAULT_REPHRASE_INSTRUCTION)
        );
    }

    #[tokio::test]
    async fn test_retrieval_chain_answers_with_context() {
        let llm = Arc::new(ScriptedLlm::new(vec![ModelReply::Text(
            "LCEL composes chains.".into(),
        )]));
        let combine = StuffDocumentsChain::new(
            llm.clone(),
            ChatPromptTemplate::from_template("Context: {context}.\nQuestion: {input}.").unwrap(),
        );
        let chain = RetrievalChain::new(
            Arc::new(TopKRetriever::new(seeded_rag().await, 1)),
            combine,
        );

        let output = chain.invoke("What is LCEL", &[]).await.unwrap();

        assert_eq!(output.answer, "LCEL composes chains.");
        assert_eq!(output.context.len(), 1);
        assert_eq!(
            llm.requests()[0].messages[0].content,
            "Context: LCEL is a declarative way to compose chains.\nQuestion: What is LCEL."
        );
    }
}
