use crate::domain::{errors::DomainError, DocumentChunk, Embedding, SearchResult};
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Appends the chunk; the same chunk added twice is stored twice.
    async fn add(&self, chunk: &DocumentChunk, embedding: &Embedding) -> Result<(), DomainError>;

    /// The `top_k` most similar chunks, best first. Fails with `EmptyIndex` when nothing is stored.
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;

    async fn len(&self) -> Result<usize, DomainError>;
}
