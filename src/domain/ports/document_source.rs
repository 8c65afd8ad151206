use async_trait::async_trait;

use crate::domain::{errors::DomainError, Document};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Document>, DomainError>;
}
