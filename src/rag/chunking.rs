//! Splitting documents into passages.

use text_splitter::{Characters, ChunkConfig, TextSplitter};

/// Splits text into passages of at most `size` characters, preferring
/// paragraph, then sentence, then word boundaries.
#[derive(Debug)]
pub struct Chunker {
    splitter: TextSplitter<Characters>,
}

impl Chunker {
    /// `size` must be positive.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let config = ChunkConfig::new(size)
            .with_sizer(Characters)
            .with_trim(true);
        Self {
            splitter: TextSplitter::new(config),
        }
    }

    /// Non-empty passages of `text`, in document order.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.splitter
            .chunks(text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_passage() {
        let chunker = Chunker::new(1000);
        let chunks = chunker.chunk("  A single short paragraph.  ");
        assert_eq!(chunks, vec!["A single short paragraph.".to_string()]);
    }

    #[test]
    fn test_respects_size_limit() {
        let text = "First paragraph about owls.\n\nSecond paragraph about cats.\n\nThird paragraph about dogs.";
        let chunker = Chunker::new(40);
        let chunks = chunker.chunk(text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert_eq!(chunks[1], "Second paragraph about cats.");
    }

    #[test]
    fn test_blank_text_has_no_passages() {
        assert!(Chunker::new(100).chunk(" \n\n \t").is_empty());
    }
}
