//! Document ingestion: PDF pages in, embedding-ready chunks out.

mod pdf;
mod splitter;

pub use pdf::{extract_pages, page_text, DocumentSource, Page, PdfSource};
pub use splitter::{Chunk, TextSplitter};
