use std::sync::Arc;
use tracing::{info, instrument};

use crate::application::services::rag::RagService;
use crate::domain::{ports::DocumentSource, Document, DocumentChunk, DomainError, TextSplitter};

pub struct DocumentService {
    rag: Arc<RagService>,
    splitter: TextSplitter,
}

impl DocumentService {
    pub fn new(rag: Arc<RagService>, splitter: TextSplitter) -> Self {
        Self { rag, splitter }
    }

    pub fn with_chunk_size(
        rag: Arc<RagService>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, DomainError> {
        Ok(Self::new(rag, TextSplitter::new(chunk_size, chunk_overlap)?))
    }

    pub fn splitter(&self) -> &TextSplitter {
        &self.splitter
    }

    #[instrument(skip(self, source))]
    pub async fn ingest(&self, source: &dyn DocumentSource) -> Result<Vec<DocumentChunk>, DomainError> {
        let documents = source.load().await?;
        self.ingest_documents(&documents).await
    }

    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn ingest_documents(
        &self,
        documents: &[Document],
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        let chunks = self.splitter.split_documents(documents);
        self.rag.index_chunks(&chunks).await?;

        info!(
            chunks = chunks.len(),
            chunk_size = self.splitter.chunk_size(),
            chunk_overlap = self.splitter.chunk_overlap(),
            "documents indexed"
        );
        Ok(chunks)
    }
}
