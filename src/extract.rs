//! Best-effort PDF text extraction.
//!
//! Pages are read in document order. A page whose text cannot be extracted is skipped and its
//! index recorded; only a byte stream that is not a PDF at all fails the whole extraction.
//! Image-only pages yield empty text because there is no OCR fallback.

use lopdf::{Document, ObjectId};
use thiserror::Error;

/// Separator placed between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Document-level extraction failure.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The bytes could not be parsed as a PDF document.
    #[error("document is not a readable PDF: {0}")]
    Unreadable(String),
}

/// Failure extracting a single page.
#[derive(Debug, Error)]
#[error("page {index} could not be extracted: {reason}")]
pub struct PageError {
    /// Zero-based page index.
    pub index: usize,
    /// Parser-provided reason.
    pub reason: String,
}

/// Plain text recovered from a document, annotated with the pages that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    /// Page texts joined by a blank line, trimmed.
    pub text: String,
    /// Number of pages attempted (after applying any page cap).
    pub page_count: usize,
    /// Zero-based indices of pages whose extraction failed.
    pub skipped_pages: Vec<usize>,
}

/// Random access to the pages of a parsed document.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extract the text of the page at zero-based `index`.
    fn page_text(&self, index: usize) -> Result<String, PageError>;
}

/// Turns document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extract text from `pdf`, reading at most `max_pages` pages when given.
    fn extract(&self, pdf: &[u8], max_pages: Option<usize>)
    -> Result<ExtractedText, ExtractionError>;
}

/// Walk the pages of `source` in order, skipping the ones that fail.
pub fn collect_pages<P: PageSource + ?Sized>(source: &P, max_pages: Option<usize>) -> ExtractedText {
    let total = source.page_count();
    let page_count = max_pages.map_or(total, |cap| cap.min(total));

    let mut chunks = Vec::with_capacity(page_count);
    let mut skipped_pages = Vec::new();
    for index in 0..page_count {
        match source.page_text(index) {
            Ok(text) => chunks.push(text.trim().to_string()),
            Err(error) => {
                tracing::warn!(page = index, error = %error.reason, "Skipping unreadable page");
                skipped_pages.push(index);
            }
        }
    }

    ExtractedText {
        text: chunks.join(PAGE_SEPARATOR).trim().to_string(),
        page_count,
        skipped_pages,
    }
}

/// Pages of a PDF parsed with `lopdf`.
pub struct LopdfPages {
    document: Document,
    pages: Vec<(u32, ObjectId)>,
}

impl LopdfPages {
    /// Parse PDF bytes held in memory.
    pub fn load(bytes: &[u8]) -> Result<Self, ExtractionError> {
        let document =
            Document::load_mem(bytes).map_err(|error| ExtractionError::Unreadable(error.to_string()))?;
        let pages = document.get_pages().into_iter().collect();
        Ok(Self { document, pages })
    }
}

impl PageSource for LopdfPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, PageError> {
        let (number, _) = self.pages.get(index).ok_or_else(|| PageError {
            index,
            reason: "page out of range".to_string(),
        })?;
        self.document
            .extract_text(&[*number])
            .map_err(|error| PageError {
                index,
                reason: error.to_string(),
            })
    }
}

/// Default extractor backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(
        &self,
        pdf: &[u8],
        max_pages: Option<usize>,
    ) -> Result<ExtractedText, ExtractionError> {
        let pages = LopdfPages::load(pdf)?;
        Ok(collect_pages(&pages, max_pages))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    struct StubPages(Vec<Result<&'static str, &'static str>>);

    impl PageSource for StubPages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_text(&self, index: usize) -> Result<String, PageError> {
            self.0[index].map(str::to_string).map_err(|reason| PageError {
                index,
                reason: reason.to_string(),
            })
        }
    }

    #[test]
    fn corrupt_pages_are_skipped_and_recorded() {
        let source = StubPages(vec![
            Ok("First page"),
            Err("bad xref"),
            Ok("  Third page\n"),
        ]);
        let extracted = collect_pages(&source, None);

        assert_eq!(extracted.text, "First page\n\nThird page");
        assert_eq!(extracted.skipped_pages, vec![1]);
        assert_eq!(extracted.page_count, 3);
    }

    #[test]
    fn page_cap_limits_pages_read() {
        let source = StubPages(vec![Ok("one"), Ok("two"), Ok("three")]);
        let extracted = collect_pages(&source, Some(2));
        assert_eq!(extracted.text, "one\n\ntwo");
        assert_eq!(extracted.page_count, 2);

        let generous = collect_pages(&source, Some(10));
        assert_eq!(generous.page_count, 3);
    }

    #[test]
    fn all_pages_failing_yields_empty_text() {
        let source = StubPages(vec![Err("x"), Err("y")]);
        let extracted = collect_pages(&source, None);
        assert!(extracted.text.is_empty());
        assert_eq!(extracted.skipped_pages, vec![0, 1]);
    }

    #[test]
    fn extracts_pages_in_order_from_real_pdf() {
        let pdf = test_pdf::build(&["Alpha report page", "Beta findings page"]);
        let extracted = PdfTextExtractor.extract(&pdf, None).expect("extracted");

        assert_eq!(extracted.page_count, 2);
        assert!(extracted.skipped_pages.is_empty());
        let alpha = extracted.text.find("Alpha report page").expect("first page text");
        let beta = extracted.text.find("Beta findings page").expect("second page text");
        assert!(alpha < beta);
        assert!(extracted.text.contains(PAGE_SEPARATOR));
    }

    #[test]
    fn zero_page_document_yields_empty_string() {
        let pdf = test_pdf::build(&[]);
        let extracted = PdfTextExtractor.extract(&pdf, None).expect("extracted");
        assert_eq!(extracted.text, "");
        assert_eq!(extracted.page_count, 0);
    }

    #[test]
    fn non_pdf_bytes_are_unreadable() {
        let error = PdfTextExtractor
            .extract(b"<html>not a pdf</html>", None)
            .expect_err("not a pdf");
        assert!(matches!(error, ExtractionError::Unreadable(_)));
    }
}
