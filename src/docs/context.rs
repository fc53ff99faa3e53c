use std::collections::HashSet;

use super::types::Chunk;

/// Only the leading chunks are scanned for overlap.
pub const SCAN_LIMIT: usize = 5;
/// At most this many overlapping chunks make it into the prompt.
pub const MAX_CONTEXT_CHUNKS: usize = 3;

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Pick prompt context for `question` by plain word overlap.
///
/// Chunks sharing at least one lowercase word with the question are kept,
/// in document order, and the first three are joined by blank lines. With
/// no overlap the first chunk is used as-is; with no chunks the context is
/// empty. Embeddings ride along on [`Chunk`] but do not affect the choice.
pub fn select_context(question: &str, chunks: &[Chunk]) -> String {
    let Some(first) = chunks.first() else {
        return String::new();
    };

    let question_words = word_set(question);
    let hits: Vec<&str> = chunks
        .iter()
        .take(SCAN_LIMIT)
        .filter(|chunk| !word_set(&chunk.text).is_disjoint(&question_words))
        .map(|chunk| chunk.text.as_str())
        .take(MAX_CONTEXT_CHUNKS)
        .collect();

    if hits.is_empty() {
        first.text.clone()
    } else {
        hits.join("\n\n")
    }
}
