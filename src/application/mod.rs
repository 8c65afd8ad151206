pub mod pipeline;
pub mod services;

pub use services::{
    AgentExecutor, BufferMemory, ChatSession, ConversationChain, DocumentService,
    HistoryAwareRetriever, RagService, RetrievalChain, TopKRetriever, ToolSet,
};
