use std::time::Duration;

use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::gemini;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

pub struct TextEmbedding {
    client: gemini::Client,
    model: String,
    timeout: Duration,
}

impl TextEmbedding {
    pub fn new() -> Self {
        Self {
            client: gemini::Client::from_env(),
            model: "text-embedding-004".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new().with_model(config.model.clone())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for TextEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

fn to_embedding(vec: Vec<f64>) -> Embedding {
    Embedding::new(vec.into_iter().map(|x| x as f32).collect())
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.client.embedding_model(&self.model);
        let mut builder = EmbeddingsBuilder::new(model);
        for text in texts {
            builder = builder
                .document(text.to_string())
                .map_err(|e| DomainError::external(e.to_string()))?;
        }

        let embedded = tokio::time::timeout(self.timeout, builder.build())
            .await
            .map_err(|_| DomainError::timeout("embedding request timed out"))?
            .map_err(|e| DomainError::external(e.to_string()))?;

        // Results are matched back by text so the output follows input order.
        texts
            .iter()
            .map(|text| {
                embedded
                    .iter()
                    .find(|(doc, _)| doc.as_str() == *text)
                    .map(|(_, emb)| to_embedding(emb.first().vec))
                    .ok_or_else(|| DomainError::external("embedding provider skipped a document"))
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
