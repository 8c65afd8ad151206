use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument};

use crate::domain::{ports::DocumentSource, Document, DomainError};

#[derive(Debug, Clone)]
pub struct FileSource {
    paths: Vec<PathBuf>,
}

impl FileSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self::new(vec![path.into()])
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    #[instrument(skip(self), fields(files = self.paths.len()))]
    async fn load(&self) -> Result<Vec<Document>, DomainError> {
        let mut documents = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                DomainError::external(format!("failed to read {}: {e}", path.display()))
            })?;
            debug!(path = %path.display(), chars = content.chars().count(), "document loaded");

            let source = path.display().to_string();
            documents.push(Document::new(source.clone(), content).with_metadata(json!({ "source": source })));
        }
        Ok(documents)
    }
}
