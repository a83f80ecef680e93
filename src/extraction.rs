use crate::Result;
use std::path::Path;

/// Boundary to the document-extraction collaborator (OCR or otherwise). The
/// analysis core consumes the extracted text as an opaque string and never
/// parses it; field extraction happens upstream.
pub trait TextExtractor {
    /// Full extracted text for the document, pages joined by newlines.
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Pass-through extractor for already-textual reports. Form-feed page breaks
/// are normalized to newlines.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let text = std::fs::read_to_string(path)?;
        Ok(text.replace('\u{0c}', "\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn plain_text_extractor_joins_pages_with_newlines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "Glucosa: 85 mg/dL\u{0c}Sodio: 140 mEq/L").unwrap();
        drop(file);

        let text = PlainTextExtractor.extract_text(&path).unwrap();
        assert_eq!(text, "Glucosa: 85 mg/dL\nSodio: 140 mEq/L");
    }

    #[test]
    fn missing_document_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let result = PlainTextExtractor.extract_text(&dir.path().join("missing.pdf"));
        assert!(result.is_err());
    }
}
