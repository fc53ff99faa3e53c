pub mod chunk;
pub mod context;
pub mod ingest;
pub mod types;

use std::collections::HashSet;

use tracing::debug;

use types::{DocExcerpt, DocMeta, PdfDocument};

/// Characters of context kept on each side of a search hit.
const EXCERPT_WINDOW: usize = 300;

/// The PDFs uploaded during one session, newest last.
///
/// One document is active at a time and feeds retrieval; uploading makes the
/// new document active.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: Vec<PdfDocument>,
    active: Option<usize>,
}

impl DocumentStore {
    /// Store a document and make it active.
    /// Idempotent: re-uploading the same bytes replaces the earlier copy.
    pub fn add(&mut self, doc: PdfDocument) -> &PdfDocument {
        let idx = match self.docs.iter().position(|d| d.id == doc.id) {
            Some(idx) => {
                self.docs[idx] = doc;
                idx
            }
            None => {
                self.docs.push(doc);
                self.docs.len() - 1
            }
        };
        self.active = Some(idx);
        debug!(doc_id = %self.docs[idx].id, total = self.docs.len(), "document stored");
        &self.docs[idx]
    }

    pub fn get(&self, doc_id: &str) -> Option<&PdfDocument> {
        self.docs.iter().find(|d| d.id == doc_id)
    }

    pub fn active(&self) -> Option<&PdfDocument> {
        self.active.and_then(|idx| self.docs.get(idx))
    }

    pub fn activate(&mut self, doc_id: &str) -> Option<&PdfDocument> {
        let idx = self.docs.iter().position(|d| d.id == doc_id)?;
        self.active = Some(idx);
        self.docs.get(idx)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<DocMeta> {
        self.docs
            .iter()
            .enumerate()
            .rev()
            .map(|(idx, d)| d.meta(self.active == Some(idx)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Remove a document. If it was active, the newest remaining one takes over.
    pub fn remove(&mut self, doc_id: &str) -> Option<PdfDocument> {
        let idx = self.docs.iter().position(|d| d.id == doc_id)?;
        let removed = self.docs.remove(idx);
        self.active = match self.active {
            Some(a) if a == idx => self.docs.len().checked_sub(1),
            Some(a) if a > idx => Some(a - 1),
            other => other,
        };
        debug!(doc_id, "document removed");
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.docs.clear();
        self.active = None;
    }

    /// Keyword search within a document. Splits query into words, matches ANY word (OR logic).
    /// Returns excerpts with context window around each match, best-covered first.
    pub fn search(&self, doc_id: &str, query: &str, max_results: usize) -> Option<Vec<DocExcerpt>> {
        let doc = self.get(doc_id)?;
        let text_lower = doc.text.to_lowercase();

        let keywords: Vec<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| w.chars().count() >= 2)
            .collect();
        if keywords.is_empty() || max_results == 0 {
            return Some(vec![]);
        }

        // Excerpts come from the original text unless lowercasing changed its length.
        let original: Vec<char> = doc.text.chars().collect();
        let lowered: Vec<char> = text_lower.chars().collect();
        let chars = if original.len() == lowered.len() {
            &original
        } else {
            &lowered
        };

        let mut results = Vec::new();
        let mut seen_offsets: HashSet<usize> = HashSet::new();

        for keyword in &keywords {
            let keyword_chars = keyword.chars().count();
            // matches come in order, so char offsets advance incrementally
            let (mut last_byte, mut char_pos) = (0, 0);
            for (byte_pos, _) in text_lower.match_indices(keyword.as_str()) {
                if results.len() >= max_results * 2 {
                    break;
                }
                char_pos += text_lower[last_byte..byte_pos].chars().count();
                last_byte = byte_pos;

                // Skip if we already have a match near this offset
                if seen_offsets.iter().any(|&o| char_pos.abs_diff(o) < EXCERPT_WINDOW) {
                    continue;
                }
                seen_offsets.insert(char_pos);

                let start = char_pos.saturating_sub(EXCERPT_WINDOW);
                let end = (char_pos + keyword_chars + EXCERPT_WINDOW).min(chars.len());
                let content: String = chars[start..end].iter().collect();

                let excerpt_lower = content.to_lowercase();
                let match_count = keywords
                    .iter()
                    .filter(|k| excerpt_lower.contains(k.as_str()))
                    .count();

                results.push(DocExcerpt {
                    doc_id: doc.id.clone(),
                    offset: char_pos,
                    content,
                    match_count,
                });
            }
        }

        results.sort_by(|a, b| b.match_count.cmp(&a.match_count));
        results.truncate(max_results);
        Some(results)
    }
}
