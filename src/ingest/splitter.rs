//! Separator-based text splitting for indexing.
//!
//! Text is cut on a separator and the pieces are merged back together into
//! chunks no longer than `chunk_size` characters, with roughly
//! `chunk_overlap` characters repeated at the start of the following chunk.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::config::SplitterConfig;

use super::pdf::Page;

/// A piece of page text ready for embedding.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: Uuid,
    pub source: String,
    pub page: u32,
    /// Position of this chunk within its page.
    pub index: u32,
    pub content: String,
}

impl Chunk {
    pub fn new(source: String, page: u32, index: u32, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            page,
            index,
            content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    separator: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(config: &SplitterConfig) -> Self {
        Self {
            separator: config.separator.clone(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    pub fn split_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = pages
            .iter()
            .flat_map(|page| {
                self.split_text(&page.text)
                    .into_iter()
                    .enumerate()
                    .map(|(index, content)| {
                        Chunk::new(page.source.clone(), page.number, index as u32, content)
                    })
            })
            .collect();

        tracing::info!("Split {} pages into {} chunks", pages.len(), chunks.len());
        chunks
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = if self.separator.is_empty() {
            vec![text]
        } else {
            text.split(self.separator.as_str()).collect()
        };
        let pieces = pieces.into_iter().map(str::trim).filter(|p| !p.is_empty());
        self.merge(pieces)
    }

    fn merge<'a>(&self, pieces: impl Iterator<Item = &'a str>) -> Vec<String> {
        let separator_len = self.separator.chars().count();
        let joined_len = |count: usize, total: usize| total + separator_len * count.saturating_sub(1);

        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = piece.chars().count();

            if !current.is_empty() && joined_len(current.len() + 1, total + len) > self.chunk_size {
                chunks.push(self.join(&current));

                // Keep a tail of the previous chunk as overlap, as long as the
                // next piece still fits after it.
                while let Some(first) = current.front() {
                    let too_much_overlap = joined_len(current.len(), total) > self.chunk_overlap;
                    let no_room = joined_len(current.len() + 1, total + len) > self.chunk_size;
                    if !(too_much_overlap || no_room) {
                        break;
                    }
                    total -= first.chars().count();
                    current.pop_front();
                }
            }

            if current.is_empty() && len > self.chunk_size {
                tracing::debug!("piece of {} chars exceeds chunk size {}", len, self.chunk_size);
            }

            current.push_back(piece);
            total += len;
        }

        if !current.is_empty() {
            chunks.push(self.join(&current));
        }

        chunks
    }

    fn join(&self, pieces: &VecDeque<&str>) -> String {
        pieces
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}
