//! Uploaded bytes → plain UTF-8 text.
//!
//! PDFs go through `pdf-extract`; plain text is decoded as UTF-8. Any other
//! content type is rejected. Extraction failures and documents with no
//! text at all are reported as [`ReviewError::Extraction`].

use crate::error::{Result, ReviewError};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// True if `content_type` (parameters such as `; charset=utf-8` ignored) can be extracted.
pub fn is_supported(content_type: &str) -> bool {
    matches!(essence(content_type).as_str(), MIME_PDF | MIME_TEXT)
}

/// Guess a content type from a file extension. Anything but `.pdf` is treated as text.
pub fn content_type_for_path(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => MIME_PDF,
        _ => MIME_TEXT,
    }
}

/// Extract text from `bytes`. Never panics on malformed input.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String> {
    let text = match essence(content_type).as_str() {
        MIME_PDF => extract_pdf(bytes)?,
        MIME_TEXT => String::from_utf8(bytes.to_vec())
            .map_err(|e| ReviewError::Extraction(format!("text is not valid UTF-8: {}", e)))?,
        other => {
            return Err(ReviewError::Extraction(format!(
                "unsupported content-type: {}",
                other
            )))
        }
    };

    if text.trim().is_empty() {
        return Err(ReviewError::Extraction(
            "could not extract any text from the document".to_string(),
        ));
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ReviewError::Extraction(format!("PDF extraction failed: {}", e))),
        Err(_) => Err(ReviewError::Extraction(
            "PDF extraction failed: malformed document".to_string(),
        )),
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn unsupported_content_type_returns_error() {
        let err = extract_text(b"foo", "application/octet-stream").unwrap_err();
        assert_eq!(err.kind(), "extraction_failed");
        assert!(!is_supported("application/msword"));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, ReviewError::Extraction(_)));
    }

    #[test]
    fn plain_text_with_charset_parameter() {
        let text = extract_text("Governing law: Delaware.".as_bytes(), "text/plain; charset=utf-8")
            .unwrap();
        assert_eq!(text, "Governing law: Delaware.");
        assert!(is_supported("Application/PDF"));
    }

    #[test]
    fn blank_text_is_an_extraction_error() {
        let err = extract_text(b"  \n\t ", MIME_TEXT).unwrap_err();
        assert!(matches!(err, ReviewError::Extraction(_)));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = extract_text(&[0xff, 0xfe, 0x00], MIME_TEXT).unwrap_err();
        assert!(matches!(err, ReviewError::Extraction(_)));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for_path(Path::new("nda.PDF")), MIME_PDF);
        assert_eq!(content_type_for_path(Path::new("nda.txt")), MIME_TEXT);
        assert_eq!(content_type_for_path(Path::new("README")), MIME_TEXT);
    }
}
