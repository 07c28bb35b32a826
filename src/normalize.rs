//! Cleanup of extracted document text.
//!
//! PDF text extraction leaves page numbers on their own lines, ragged
//! spacing and long runs of blank lines. [`normalize_text`] turns that into
//! a canonical blob: page-number lines removed, spaces collapsed, lines
//! trimmed and blank-line runs reduced to a single paragraph break.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ReviewError};

static PAGE_NUMBER_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*$").unwrap());
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

/// Reject empty or whitespace-only text.
pub fn ensure_text(text: &str) -> Result<&str> {
    if text.trim().is_empty() {
        return Err(ReviewError::Extraction(
            "document contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

/// Produce the canonical form of raw extracted text.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in unified.lines() {
        if PAGE_NUMBER_LINE.is_match(line) {
            continue;
        }
        let collapsed = SPACE_RUN.replace_all(line, " ");
        let trimmed = collapsed.trim();
        if trimmed.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(trimmed.to_string());
            previous_blank = false;
        }
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_page_number_lines() {
        let raw = "1. Definitions apply.\n  12  \nThe parties agree.";
        assert_eq!(
            normalize_text(raw),
            "1. Definitions apply.\nThe parties agree."
        );
    }

    #[test]
    fn test_keeps_numbers_inside_text() {
        let raw = "Payment is due within 30 days.\n2024";
        assert_eq!(normalize_text(raw), "Payment is due within 30 days.");
        assert_eq!(normalize_text("Section 4 applies"), "Section 4 applies");
    }

    #[test]
    fn test_collapses_blank_line_runs() {
        let raw = "First clause.\n\n\n   \n\nSecond clause.";
        assert_eq!(normalize_text(raw), "First clause.\n\nSecond clause.");
    }

    #[test]
    fn test_collapses_interior_spaces() {
        let raw = "The   Supplier \t shall  deliver.";
        assert_eq!(normalize_text(raw), "The Supplier shall deliver.");
    }

    #[test]
    fn test_trims_and_handles_crlf() {
        let raw = "\r\n\r\n  Heading  \r\nBody text.\r\n\r\n";
        assert_eq!(normalize_text(raw), "Heading\nBody text.");
    }

    #[test]
    fn test_deterministic() {
        let raw = "A  b\n\n\n3\nc";
        assert_eq!(normalize_text(raw), normalize_text(raw));
    }

    #[test]
    fn test_ensure_text_rejects_blank() {
        assert!(matches!(
            ensure_text("  \n\t "),
            Err(ReviewError::Extraction(_))
        ));
        assert_eq!(ensure_text("x").unwrap(), "x");
    }

    #[test]
    fn test_page_numbers_only_normalizes_to_empty() {
        assert_eq!(normalize_text("1\n\n2\n 3 "), "");
    }
}
