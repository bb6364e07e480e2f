use serde::{Deserialize, Serialize};

/// Request body for the chunking endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ChunkRequest<'a> {
    pub content: &'a str,
    pub filename: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    /// Processing time as formatted by the backend (`%Y-%m-%d %H:%M:%S`)
    pub datetime: String,
    pub title: String,
}

/// One section of a markdown document, as split by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub title: String,
    pub size: usize,
    pub index: usize,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn title_display(&self) -> &str {
        if self.title.is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}
