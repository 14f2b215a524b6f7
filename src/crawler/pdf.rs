//! PDF text extraction seam
//!
//! PDF-to-text conversion is an external service; the crawl only needs
//! `bytes -> Option<text>`.

/// Converts a PDF document to plain text
pub trait PdfTextExtractor: Send + Sync {
    /// Returns the document text, or `None` when conversion fails
    fn extract_text(&self, bytes: &[u8]) -> Option<String>;
}

/// Extractor used when no PDF converter is configured
///
/// Every PDF becomes an error record, so the summary shows what was missed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPdfConverter;

impl PdfTextExtractor for NoPdfConverter {
    fn extract_text(&self, _bytes: &[u8]) -> Option<String> {
        None
    }
}

impl<F> PdfTextExtractor for F
where
    F: Fn(&[u8]) -> Option<String> + Send + Sync,
{
    fn extract_text(&self, bytes: &[u8]) -> Option<String> {
        self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_converter_always_fails() {
        assert_eq!(NoPdfConverter.extract_text(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_closures_are_extractors() {
        let extractor = |bytes: &[u8]| Some(format!("{} bytes", bytes.len()));
        assert_eq!(extractor.extract_text(b"abc").as_deref(), Some("3 bytes"));
    }
}
