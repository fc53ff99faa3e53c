use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{info, warn};

use super::chunk::chunk_text;
use super::types::{Chunk, PdfDocument};
use crate::analysis::keyword_frequencies;
use crate::llm::LlmClient;
use crate::state::PipelineConfig;

const TOP_KEYWORDS: usize = 20;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not read PDF: {0}")]
    Unreadable(String),
    #[error("PDF contains no extractable text")]
    NoText,
}

/// Extract the text layer of a PDF held in memory.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String> {
    // pdf-extract is synchronous and CPU-bound
    match tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(IngestError::Unreadable(e.to_string()).into()),
        Err(e) if e.is_panic() => Err(IngestError::Unreadable("PDF parser panicked".to_string()).into()),
        Err(e) => Err(anyhow::Error::new(e).context("spawn_blocking join failed")),
    }
}

/// Turn uploaded PDF bytes into a chunked, embedded document.
pub async fn ingest_pdf(
    llm: &LlmClient,
    bytes: Vec<u8>,
    name: &str,
    config: &PipelineConfig,
) -> Result<PdfDocument> {
    let id = blake3::hash(&bytes).to_hex().to_string();
    let size = bytes.len();
    let text = extract_pdf_text(bytes).await?;
    ingest_text(llm, id, name, size, text, config).await
}

/// Chunk and embed already-extracted text.
pub async fn ingest_text(
    llm: &LlmClient,
    id: String,
    name: &str,
    size: usize,
    text: String,
    config: &PipelineConfig,
) -> Result<PdfDocument> {
    if text.trim().is_empty() {
        return Err(IngestError::NoText.into());
    }

    let pieces = chunk_text(&text, config.chunk_size, config.overlap)
        .context("Failed to chunk document text")?;
    let embeddings = llm.embed_texts(&pieces).await;
    if embeddings.len() != pieces.len() {
        warn!(
            chunks = pieces.len(),
            embeddings = embeddings.len(),
            "embedding count mismatch"
        );
    }

    let chunks: Vec<Chunk> = pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            index,
            text,
            embedding: embeddings.get(index).cloned().unwrap_or_default(),
        })
        .collect();

    let embedded = chunks.iter().filter(|c| c.has_embedding()).count();
    let top_keywords = keyword_frequencies(&text, TOP_KEYWORDS);

    info!(
        doc_id = %id,
        name,
        size,
        chunks = chunks.len(),
        embedded,
        "document ingested"
    );

    Ok(PdfDocument {
        id,
        name: name.to_string(),
        size,
        text,
        chunks,
        top_keywords,
        ingested_at: chrono::Utc::now().timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    const OWNERSHIP_PDF: &[u8] = include_bytes!("../../tests/fixtures/ownership.pdf");

    #[tokio::test]
    async fn text_is_read_from_a_real_pdf() {
        let text = extract_pdf_text(OWNERSHIP_PDF.to_vec()).await.unwrap();
        assert!(text.contains("ownership"), "{text:?}");
        assert!(text.contains("Borrowing"));
    }

    #[tokio::test]
    async fn pdf_ingestion_yields_chunks() {
        let llm = LlmClient::new(&Settings::default()).unwrap();
        let doc = ingest_pdf(&llm, OWNERSHIP_PDF.to_vec(), "ownership.pdf", &PipelineConfig::default())
            .await
            .unwrap();

        assert_eq!(doc.id, blake3::hash(OWNERSHIP_PDF).to_hex().to_string());
        assert_eq!(doc.size, OWNERSHIP_PDF.len());
        assert!(!doc.chunks.is_empty());
        assert!(doc.top_keywords.iter().any(|(word, _)| word == "ownership"));
    }

    #[tokio::test]
    async fn garbage_bytes_are_unreadable() {
        let err = extract_pdf_text(b"not a pdf at all".to_vec()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<IngestError>(), Some(IngestError::Unreadable(_))));
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let llm = LlmClient::new(&Settings::default()).unwrap();
        let err = ingest_text(&llm, "id".into(), "a.pdf", 3, "  \n ".into(), &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<IngestError>(), Some(IngestError::NoText)));
    }

    #[tokio::test]
    async fn text_is_chunked_and_paired_with_embeddings() {
        let llm = LlmClient::new(&Settings::default()).unwrap();
        let config = PipelineConfig {
            chunk_size: 100,
            overlap: 10,
            ..PipelineConfig::default()
        };
        let text = (0..250).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let doc = ingest_text(&llm, "abc".into(), "a.pdf", 10, text, &config)
            .await
            .unwrap();

        assert_eq!(doc.chunks.len(), 3);
        assert!(doc.chunks.iter().enumerate().all(|(i, c)| c.index == i));
        // no key configured: zero vectors, still paired one-to-one
        assert!(doc.chunks.iter().all(|c| c.embedding.len() == crate::llm::EMBEDDING_DIM));
        assert!(!doc.chunks[0].has_embedding());
    }
}
