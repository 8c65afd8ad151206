mod document_source;
mod embedding;
mod llm;
mod tool;
mod vector_store;

pub use document_source::DocumentSource;
pub use embedding::EmbeddingService;
pub use llm::{ChatRequest, LlmService, ModelReply};
pub use tool::Tool;
pub use vector_store::VectorStore;
