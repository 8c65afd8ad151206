use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::application::RagService;
use crate::domain::{ports::Tool, DomainError};
use crate::infrastructure::config::KnowledgeBaseToolConfig;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RetrieverArgs {
    #[schemars(description = "The search query")]
    pub query: String,
}

pub struct RetrieverTool {
    rag: Arc<RagService>,
    top_k: usize,
    config: KnowledgeBaseToolConfig,
}

impl RetrieverTool {
    pub fn new(rag: Arc<RagService>, top_k: usize, config: KnowledgeBaseToolConfig) -> Self {
        Self { rag, top_k, config }
    }

    pub fn with_defaults(rag: Arc<RagService>) -> Self {
        let top_k = rag.default_top_k();
        Self::new(rag, top_k, KnowledgeBaseToolConfig::default())
    }
}

#[async_trait]
impl Tool for RetrieverTool {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    fn parameters(&self) -> Value {
        let mut schema = schemars::schema_for!(RetrieverArgs).to_value();
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }
        schema
    }

    #[instrument(skip(self, arguments), fields(tool = %self.config.name))]
    async fn call(&self, arguments: Value) -> Result<String, DomainError> {
        let args: RetrieverArgs = serde_json::from_value(arguments)
            .map_err(|e| DomainError::validation(format!("invalid tool arguments: {e}")))?;

        let results = match self.rag.retrieve_top_k(&args.query, self.top_k).await {
            Ok(results) => results,
            Err(DomainError::EmptyIndex) => Vec::new(),
            Err(e) => return Err(e),
        };

        let output = results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[{}] {}", i + 1, r.chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(if output.is_empty() {
            self.config.no_results_message.clone()
        } else {
            output
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentChunk;
    use crate::infrastructure::{InMemoryVectorStore, KeywordEmbedding};
    use serde_json::json;
    use uuid::Uuid;

    fn rag() -> Arc<RagService> {
        Arc::new(RagService::new(
            Arc::new(KeywordEmbedding::default()),
            Arc::new(InMemoryVectorStore::new()),
            1,
        ))
    }

    #[tokio::test]
    async fn test_numbers_retrieved_chunks() {
        let rag = rag();
        let doc_id = Uuid::new_v4();
        rag.index_chunks(&[
            DocumentChunk::new(doc_id, "LCEL composes chains", 0),
            DocumentChunk::new(doc_id, "Donny is a dog", 1),
        ])
        .await
        .unwrap();
        let tool = RetrieverTool::with_defaults(rag);

        let output = tool.call(json!({ "query": "LCEL chains" })).await.unwrap();

        assert_eq!(output, "[1] LCEL composes chains");
        assert_eq!(tool.spec().name, "lcel_search");
    }

    #[tokio::test]
    async fn test_empty_index_gives_no_results_message() {
        let tool = RetrieverTool::with_defaults(rag());

        let output = tool.call(json!({ "query": "anything" })).await.unwrap();

        assert_eq!(output, "No relevant documents found.");
    }

    #[tokio::test]
    async fn test_missing_query_is_rejected() {
        let tool = RetrieverTool::with_defaults(rag());

        let err = tool.call(json!({ "q": "LCEL" })).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_parameters_follow_argument_type() {
        let parameters = RetrieverTool::with_defaults(rag()).parameters();

        assert_eq!(parameters["type"], "object");
        assert_eq!(parameters["properties"]["query"]["type"], "string");
        assert_eq!(parameters["properties"]["query"]["description"], "The search query");
        assert_eq!(parameters["required"], json!(["query"]));
        assert!(parameters.get("$schema").is_none());
    }
}
