//! Recursive, overlapping text chunker.
//!
//! Splits normalized document text into chunks of at most `chunk_size`
//! characters, preferring the highest-priority separator that occurs in
//! the text (paragraph break, line break, sentence end) and falling back
//! to splitting between any two characters.
//!
//! # Algorithm
//!
//! 1. Pick the first separator present in the text; `""` always matches.
//! 2. Split on it, keeping the separator at the end of the preceding piece.
//! 3. Pieces shorter than `chunk_size` are merged greedily. When the next
//!    piece would overflow, the buffer is emitted and pieces are dropped
//!    from its front until at most `overlap` characters remain; those
//!    carry into the next chunk.
//! 4. Pieces of `chunk_size` or more recurse with the remaining separators.
//!    With `""` the text is split per character, so the result is exact
//!    `chunk_size` windows sharing exactly `overlap` characters.
//!
//! Lengths are counted in `char`s, never bytes, so multibyte text is never
//! split inside a character.
//!
//! # Example
//!
//! ```rust
//! use contract_review::chunk::TextSplitter;
//!
//! let splitter = TextSplitter::new(500, 50).unwrap();
//! let chunks = splitter.split("Hello world.\n\nSecond paragraph.");
//! assert_eq!(chunks.len(), 1);
//! ```

use sha2::{Digest, Sha256};
use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::error::{Result, ReviewError};

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Splitter with the default separators: `"\n\n"`, `"\n"`, `". "`, `""`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ReviewError::Config("chunk_size must be > 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(ReviewError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            separators: ChunkingConfig::default().separators,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Ok(Self::new(config.chunk_size, config.overlap)?.with_separators(config.separators.clone()))
    }

    /// Replace the separator priority list. An empty list means "split anywhere".
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = if separators.is_empty() {
            vec![String::new()]
        } else {
            separators
        };
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into ordered chunk texts.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces = split_keeping_separator(text, separator);

        let mut chunks = Vec::new();
        let mut short: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                short.push(piece);
                continue;
            }
            if !short.is_empty() {
                chunks.extend(self.merge(&short));
                short.clear();
            }
            if remaining.is_empty() {
                // No finer separator left: oversized atomic piece.
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !short.is_empty() {
            chunks.extend(self.merge(&short));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_window(&mut chunks, &window);
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
            window.push_back(piece);
            total += len;
        }
        push_window(&mut chunks, &window);
        chunks
    }
}

fn push_window(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    text.split_inclusive(separator)
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// SHA-256 hex digest of a chunk's text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = TextSplitter::new(500, 50).unwrap().split("Hello, world!");
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_multiple_paragraphs_under_limit() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = TextSplitter::new(500, 50).unwrap().split(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("First paragraph."));
        assert!(chunks[0].contains("Third paragraph."));
    }

    #[test]
    fn test_paragraphs_exceed_limit() {
        let text = "This is paragraph one.\n\nThis is paragraph two.\n\nThis is paragraph three.";
        let chunks = TextSplitter::new(30, 0).unwrap().split(text);
        assert_eq!(
            chunks,
            vec![
                "This is paragraph one.",
                "This is paragraph two.",
                "This is paragraph three."
            ]
        );
    }

    #[test]
    fn test_character_fallback_windows_share_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = TextSplitter::new(10, 3).unwrap().split(text);
        assert_eq!(
            chunks,
            vec!["abcdefghij", "hijklmnopq", "opqrstuvwx", "vwxyz"]
        );
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(pair[0].chars().count() - 3).collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn test_non_overlap_regions_reconstruct_text() {
        let text: String = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let overlap = 7;
        let chunks = TextSplitter::new(40, overlap).unwrap().split(&text);
        let mut rebuilt = chunks[0].clone();
        for c in &chunks[1..] {
            rebuilt.extend(c.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_chunk_size_bound() {
        let text = (0..80)
            .map(|i| format!("Clause {} binds the parties to the terms set out herein.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = TextSplitter::new(120, 20).unwrap().split(&text);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 120, "chunk too long: {}", c.len());
        }
    }

    #[test]
    fn test_atomic_piece_without_fallback_may_exceed() {
        let splitter = TextSplitter::new(10, 0)
            .unwrap()
            .with_separators(vec!["\n".to_string()]);
        let chunks = splitter.split("averyveryverylongword\nshort");
        assert_eq!(chunks, vec!["averyveryverylongword", "short"]);
    }

    #[test]
    fn test_sentence_separator_keeps_period() {
        let text = "The Supplier shall deliver. The Buyer shall pay. Either party may terminate.";
        let chunks = TextSplitter::new(35, 0).unwrap().split(text);
        assert_eq!(chunks[0], "The Supplier shall deliver.");
        assert!(chunks.iter().all(|c| !c.starts_with('.')));
    }

    #[test]
    fn test_chunks_appear_in_document_order() {
        let text = (0..30)
            .map(|i| format!("Paragraph number {}.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = TextSplitter::new(60, 10).unwrap().split(&text);
        let mut cursor = 0;
        for c in &chunks {
            let first_line = c.lines().next().unwrap();
            let pos = text[cursor..].find(first_line).map(|p| p + cursor);
            assert!(pos.is_some(), "chunk out of order: {}", c);
            cursor = pos.unwrap();
        }
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let text = "┌──────────────────┐\n│ Hello world      │\n└──────────────────┘";
        let chunks = TextSplitter::new(8, 2).unwrap().split(text);
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.chars().count() <= 8);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        let splitter = TextSplitter::new(8, 2).unwrap();
        assert_eq!(splitter.split(text), splitter.split(text));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(50, 50).is_err());
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
        assert_eq!(content_hash("").len(), 64);
    }
}
