use async_trait::async_trait;

use crate::domain::{ports::DocumentSource, Document, DomainError};

#[derive(Debug, Clone, Default)]
pub struct InlineSource {
    documents: Vec<Document>,
}

impl InlineSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn from_texts<I, S>(source: &str, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            texts
                .into_iter()
                .map(|text| Document::new(source, text))
                .collect(),
        )
    }
}

#[async_trait]
impl DocumentSource for InlineSource {
    async fn load(&self) -> Result<Vec<Document>, DomainError> {
        Ok(self.documents.clone())
    }
}
