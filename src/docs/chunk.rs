use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("invalid chunk window: chunk_size={chunk_size}, overlap={overlap} (need 0 <= overlap < chunk_size)")]
    InvalidWindow { chunk_size: usize, overlap: usize },
}

/// Split `text` into windows of `chunk_size` whitespace-separated words,
/// each window starting `chunk_size - overlap` words after the previous one.
///
/// The tail windows are emitted as the stride produces them, so with a
/// non-zero overlap the last few chunks can be shorter than `chunk_size`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(ChunkError::InvalidWindow {
            chunk_size,
            overlap,
        });
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let step = chunk_size - overlap;
    let mut chunks = Vec::with_capacity(words.len() / step + 1);

    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_without_overlap() {
        let chunks = chunk_text("a b c d e f", 2, 0).unwrap();
        assert_eq!(chunks, vec!["a b", "c d", "e f"]);
    }

    #[test]
    fn overlapping_windows_share_words() {
        let chunks = chunk_text("a b c d e f", 4, 2).unwrap();
        assert_eq!(chunks, vec!["a b c d", "c d e f", "e f"]);
    }

    #[test]
    fn collapses_irregular_whitespace() {
        let chunks = chunk_text("  one\ttwo\n\nthree   four ", 3, 1).unwrap();
        assert_eq!(chunks, vec!["one two three", "three four"]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 200, 50).unwrap().is_empty());
        assert!(chunk_text(" \n\t ", 200, 50).unwrap().is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("hello world", 200, 50).unwrap(), vec!["hello world"]);
    }

    #[test]
    fn rejects_windows_that_cannot_advance() {
        assert_eq!(
            chunk_text("a b c", 2, 2),
            Err(ChunkError::InvalidWindow {
                chunk_size: 2,
                overlap: 2
            })
        );
        assert!(chunk_text("a b c", 2, 5).is_err());
        assert!(chunk_text("a b c", 0, 0).is_err());
    }

    #[test]
    fn chunks_never_exceed_window() {
        let text = (0..1000).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let chunks = chunk_text(&text, 200, 50).unwrap();
        assert!(chunks.iter().all(|c| c.split_whitespace().count() <= 200));
        assert_eq!(chunks.first().unwrap().split_whitespace().next(), Some("w0"));
        assert!(chunks.last().unwrap().ends_with("w999"));
    }
}
