use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub source: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            content: content.into(),
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(document_id: Uuid, content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content: content.into(),
            chunk_index,
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ChunkMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: Option<String>,
    pub offset: usize,
    pub extra: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Splits text into fixed-size character windows that overlap by a fixed amount.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(DomainError::validation("chunk_size must be greater than zero"));
        }
        if chunk_overlap >= chunk_size {
            return Err(DomainError::validation(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut windows = Vec::new();

        let mut start = 0;
        while start < total {
            let end = (start + self.chunk_size).min(total);
            windows.push((start, chars[start..end].iter().collect()));
            if end == total {
                break;
            }
            start = end - self.chunk_overlap;
        }

        windows
    }

    pub fn split_document(&self, document: &Document) -> Vec<DocumentChunk> {
        let extra = match &document.metadata {
            serde_json::Value::Object(map) if map.is_empty() => None,
            serde_json::Value::Null => None,
            other => Some(other.clone()),
        };

        self.split_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(index, (offset, content))| {
                DocumentChunk::new(document.id, content, index).with_metadata(ChunkMetadata {
                    source: Some(document.source.clone()),
                    offset,
                    extra: extra.clone(),
                })
            })
            .collect()
    }

    pub fn split_documents(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(windows: Vec<(usize, String)>) -> Vec<String> {
        windows.into_iter().map(|(_, text)| text).collect()
    }

    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let last = chunks.len().saturating_sub(1);
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                if i == last {
                    chunk.clone()
                } else {
                    let keep = chunk.chars().count() - overlap;
                    chunk.chars().take(keep).collect()
                }
            })
            .collect()
    }

    #[test]
    fn test_split_alphabet() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        let chunks = contents(splitter.split_text("abcdefghijklmnopqrstuvwxyz"));

        assert_eq!(chunks, vec!["abcdefghij", "ijklmnopqr", "qrstuvwxyz"]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = TextSplitter::new(200, 20).unwrap();
        let chunks = contents(splitter.split_text("short"));

        assert_eq!(chunks, vec!["short"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        assert!(splitter.split_text("").is_empty());
    }

    #[test]
    fn test_reconstruction_across_sizes() {
        let text = "LangChain Expression Language is a declarative way to compose chains. \
                    Any chain built this way gets sync, async and streaming support: ünïcödé.";

        for size in 1..40 {
            for overlap in 0..size {
                let splitter = TextSplitter::new(size, overlap).unwrap();
                let chunks = contents(splitter.split_text(text));

                for chunk in &chunks[..chunks.len() - 1] {
                    assert_eq!(chunk.chars().count(), size);
                }
                assert!(chunks.last().unwrap().chars().count() <= size);
                assert_eq!(reconstruct(&chunks, overlap), text, "size={size} overlap={overlap}");
            }
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap_exactly() {
        let splitter = TextSplitter::new(7, 3).unwrap();
        let chunks = contents(splitter.split_text("the quick brown fox jumps"));

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(4).collect();
            let head: String = pair[1].chars().take(3).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            TextSplitter::new(0, 0),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            TextSplitter::new(10, 10),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_split_document_carries_metadata() {
        let doc = Document::new("notes.txt", "abcdefghijklmnopqrstuvwxyz")
            .with_metadata(serde_json::json!({ "lang": "en" }));
        let splitter = TextSplitter::new(10, 2).unwrap();
        let chunks = splitter.split_document(&doc);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[1].metadata.offset, 8);
        assert_eq!(chunks[2].metadata.source.as_deref(), Some("notes.txt"));
        assert_eq!(chunks[2].metadata.extra, Some(serde_json::json!({ "lang": "en" })));
        assert!(chunks.iter().all(|c| c.document_id == doc.id));
    }
}
