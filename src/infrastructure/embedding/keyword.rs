use async_trait::async_trait;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};

const DEFAULT_DIMENSION: usize = 2048;

/// Lowercased alphanumeric tokens are hashed (FNV-1a) into a fixed number of buckets, so
/// texts sharing words score a positive cosine similarity and unrelated texts score zero.
#[derive(Debug, Clone)]
pub struct KeywordEmbedding {
    dimension: usize,
}

impl KeywordEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let mut buckets = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            buckets[(fnv1a(&token) % self.dimension as u64) as usize] += 1.0;
        }
        Embedding::new(buckets)
    }
}

impl Default for KeywordEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingService for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn model_name(&self) -> &str {
        "keyword-hash"
    }
}
