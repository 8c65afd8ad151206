mod conversation;
mod document;
mod embedding;
mod prompt;
mod schema;
mod tool;

pub use conversation::{buffer_string, Conversation, Message, MessageRole};
pub use document::{ChunkMetadata, Document, DocumentChunk, SearchResult, TextSplitter};
pub use embedding::Embedding;
pub use prompt::{ChatPromptBuilder, ChatPromptTemplate, PromptEntry, PromptTemplate, PromptValues};
pub use schema::ObjectSchema;
pub use tool::{AgentStep, ToolCall, ToolSpec};
