pub mod config;
pub mod embedding;
pub mod llm;
pub mod loaders;
pub mod logging;
pub mod tools;
pub mod vector_store;

pub use config::{
    AgentConfig, AppConfig, Config, EmbeddingConfig, KnowledgeBaseToolConfig, LlmConfig,
    PromptsConfig, RagConfig,
};
pub use embedding::{KeywordEmbedding, TextEmbedding};
pub use llm::{GeminiLlm, ScriptedLlm, TimeoutLlm};
pub use loaders::{FileSource, InlineSource};
pub use logging::init_tracing;
pub use tools::RetrieverTool;
pub use vector_store::InMemoryVectorStore;
