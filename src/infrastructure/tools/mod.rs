mod retriever;

pub use retriever::{RetrieverArgs, RetrieverTool};
