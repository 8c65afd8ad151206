mod chain;
mod model;
mod parsers;
mod runnable;

pub use chain::{llm_chain, LlmChain, StuffDocumentsChain, DEFAULT_DOCUMENT_SEPARATOR};
pub use model::ModelStep;
pub use parsers::{
    extract_json, CommaSeparatedListOutputParser, OutputParser, StringOutputParser,
    StructuredOutputParser,
};
pub use runnable::{Lambda, Pipe, Runnable, RunnableExt};
