//! Page-level text extraction from PDF files.

use std::fs;
use std::path::PathBuf;

use lopdf::Document;

use crate::{QuizError, Result};

/// Text of one page of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// File the page came from.
    pub source: String,
    /// 1-based page number within the source.
    pub number: u32,
    pub text: String,
}

/// Anything that can hand over page records for indexing.
pub trait DocumentSource {
    fn load(&self) -> Result<Vec<Page>>;
}

/// Reads one or more PDF files from disk.
///
/// A single unreadable or malformed file fails the whole load.
#[derive(Debug, Clone, Default)]
pub struct PdfSource {
    paths: Vec<PathBuf>,
}

impl PdfSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl DocumentSource for PdfSource {
    fn load(&self) -> Result<Vec<Page>> {
        let mut pages = Vec::new();

        for path in &self.paths {
            let bytes = fs::read(path).map_err(|err| QuizError::ReadDocument {
                path: path.clone(),
                source: err,
            })?;
            let source = path.display().to_string();
            let extracted = extract_pages(&source, &bytes).map_err(|err| QuizError::Pdf {
                path: path.clone(),
                source: err,
            })?;
            tracing::debug!("{}: {} pages with text", source, extracted.len());
            pages.extend(extracted);
        }

        tracing::info!("Total pages processed: {}", pages.len());
        Ok(pages)
    }
}

/// Extract the text of every page in a PDF held in memory.
///
/// Pages without any extractable text (scans, blank pages) are skipped.
pub fn extract_pages(source: &str, bytes: &[u8]) -> std::result::Result<Vec<Page>, lopdf::Error> {
    let document = Document::load_mem(bytes)?;
    let mut pages = Vec::new();

    for number in document.get_pages().keys().copied() {
        let text = match document.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("{}: no text on page {}: {}", source, number, e);
                continue;
            }
        };

        if text.trim().is_empty() {
            continue;
        }

        pages.push(Page {
            source: source.to_string(),
            number,
            text,
        });
    }

    Ok(pages)
}

/// Text of the page at `index` in load order.
pub fn page_text(pages: &[Page], index: usize) -> Option<&str> {
    pages.get(index).map(|page| page.text.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn hello_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello quiz")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_generated_pdf_parses() {
        let pages = extract_pages("hello.pdf", &hello_pdf()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source, "hello.pdf");
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("Hello quiz"));
    }

    #[test]
    fn test_malformed_pdf_fails() {
        assert!(extract_pages("junk.pdf", b"this is not a pdf").is_err());
    }

    #[test]
    fn test_malformed_file_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pdf");
        let bad = dir.path().join("bad.pdf");
        fs::write(&good, hello_pdf()).unwrap();
        fs::write(&bad, b"%PDF-garbage").unwrap();

        let source = PdfSource::new(vec![good, bad.clone()]);
        match source.load() {
            Err(QuizError::Pdf { path, .. }) => assert_eq!(path, bad),
            other => panic!("expected pdf error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");

        let err = PdfSource::new(vec![missing.clone()]).load().unwrap_err();
        assert!(err.to_string().contains("missing.pdf"));
        assert!(matches!(err, QuizError::ReadDocument { ref path, .. } if *path == missing));
    }

    #[test]
    fn test_page_text_out_of_range() {
        let pages = vec![Page {
            source: "a.pdf".to_string(),
            number: 1,
            text: "first page".to_string(),
        }];
        assert_eq!(page_text(&pages, 0), Some("first page"));
        assert_eq!(page_text(&pages, 1), None);
    }
}
