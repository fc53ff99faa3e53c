use serde::{Deserialize, Serialize};

/// Content-addressed document ID (blake3 hex hash of the uploaded bytes).
pub type DocId = String;

/// One retrieval unit: a word window of the document plus its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    /// Zero vector when the embedding call failed.
    #[serde(skip_serializing, default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn has_embedding(&self) -> bool {
        self.embedding.iter().any(|v| *v != 0.0)
    }
}

/// An uploaded PDF held in session memory.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub id: DocId,
    pub name: String,
    pub size: usize,
    pub text: String,
    pub chunks: Vec<Chunk>,
    pub top_keywords: Vec<(String, usize)>,
    pub ingested_at: i64,
}

impl PdfDocument {
    pub fn meta(&self, active: bool) -> DocMeta {
        DocMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            size: self.size,
            chars: self.text.chars().count(),
            chunk_count: self.chunks.len(),
            embedded_chunks: self.chunks.iter().filter(|c| c.has_embedding()).count(),
            top_keywords: self.top_keywords.clone(),
            ingested_at: self.ingested_at,
            active,
        }
    }
}

/// Summary of a document as shown in the source list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub id: DocId,
    pub name: String,
    pub size: usize,
    pub chars: usize,
    pub chunk_count: usize,
    pub embedded_chunks: usize,
    pub top_keywords: Vec<(String, usize)>,
    pub ingested_at: i64,
    pub active: bool,
}

/// A search result excerpt from a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocExcerpt {
    pub doc_id: DocId,
    pub offset: usize,
    pub content: String,
    pub match_count: usize,
}
