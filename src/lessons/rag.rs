use std::sync::Arc;

use tracing::instrument;

use crate::application::pipeline::{llm_chain, Runnable, StringOutputParser, StuffDocumentsChain};
use crate::application::services::RetrievalOutput;
use crate::application::{HistoryAwareRetriever, RetrievalChain, TopKRetriever};
use crate::domain::ports::DocumentSource;
use crate::domain::{ChatPromptTemplate, DomainError, Message, PromptValues};
use crate::lessons::{Lessons, INLINE_DOCUMENTS};

impl Lessons {
    #[instrument(skip(self))]
    pub async fn rag_bare(&self, question: &str) -> Result<String, DomainError> {
        let prompt = ChatPromptTemplate::from_template(self.config.prompts.bare_question.clone())?;
        let chain = llm_chain(prompt, self.model(), StringOutputParser);

        chain.invoke(PromptValues::new().with("input", question)).await
    }

    #[instrument(skip(self))]
    pub async fn rag_inline(&self, question: &str) -> Result<String, DomainError> {
        let chain = self.encyclopedia()?;

        chain
            .invoke(PromptValues::new().with("input", question), &INLINE_DOCUMENTS[..])
            .await
    }

    #[instrument(skip(self, source))]
    pub async fn rag_retrieval(
        &self,
        source: &dyn DocumentSource,
        question: &str,
    ) -> Result<RetrievalOutput, DomainError> {
        let top_k = self.config.config.rag.top_k;
        let rag = self.build_index(source, top_k).await?;
        let chain = RetrievalChain::new(Arc::new(TopKRetriever::new(rag, top_k)), self.encyclopedia()?);

        chain.invoke(question, &[]).await
    }

    #[instrument(skip(self, source, history), fields(history = history.len()))]
    pub async fn rag_history(
        &self,
        source: &dyn DocumentSource,
        question: &str,
        history: &[Message],
        top_k: usize,
    ) -> Result<RetrievalOutput, DomainError> {
        let rag = self.build_index(source, top_k).await?;
        let retriever = HistoryAwareRetriever::new(
            Arc::new(TopKRetriever::new(rag, top_k)),
            self.model(),
        )?;
        let prompt = ChatPromptTemplate::builder()
            .system(self.config.prompts.context_system.clone())
            .placeholder("chat_history")
            .user("{input}")
            .build()?;
        let chain = RetrievalChain::new(
            Arc::new(retriever),
            StuffDocumentsChain::with_model(self.model(), prompt),
        );

        chain.invoke(question, history).await
    }

    fn encyclopedia(&self) -> Result<StuffDocumentsChain, DomainError> {
        let prompt = ChatPromptTemplate::from_template(self.config.prompts.encyclopedia.clone())?;
        Ok(StuffDocumentsChain::with_model(self.model(), prompt))
    }
}
