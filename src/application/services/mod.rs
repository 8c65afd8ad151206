mod agent;
mod document;
mod memory;
mod rag;
mod retrieval;

pub use agent::{AgentExecutor, AgentOutcome, ChatSession, ToolSet, DEFAULT_MAX_ITERATIONS};
pub use document::DocumentService;
pub use memory::{BufferMemory, ConversationChain};
pub use rag::RagService;
pub use retrieval::{
    HistoryAwareRetriever, RetrievalChain, RetrievalOutput, Retriever, TopKRetriever,
    DEFAULT_REPHRASE_INSTRUCTION,
};
