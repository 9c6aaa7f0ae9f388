//! Sentence-level segmentation packed into a character budget.

use super::types::{Chunk, DocumentUnit};
use super::Segmenter;

/// Configuration for [`SemanticSegmenter`].
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticConfig {
    /// Maximum characters per chunk (default: 4000).
    pub max_chunk_chars: usize,
    /// Trailing sentences of a closed chunk repeated at the start of the next.
    pub overlap_sentences: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 4_000,
            overlap_sentences: 2,
        }
    }
}

/// Packs sentences greedily into chunks, seeding each new chunk with the
/// last sentences of the previous one.
#[derive(Default)]
pub struct SemanticSegmenter {
    config: SemanticConfig,
}

impl SemanticSegmenter {
    pub fn new(config: SemanticConfig) -> Self {
        Self { config }
    }

    /// Every sentence in the text, with global order and paragraph index.
    pub fn sentences(&self, text: &str) -> Vec<DocumentUnit> {
        split_paragraphs(text)
            .iter()
            .enumerate()
            .flat_map(|(paragraph, para)| {
                split_sentences(para)
                    .into_iter()
                    .map(move |sentence| (paragraph, sentence))
            })
            .enumerate()
            .map(|(index, (paragraph, sentence))| DocumentUnit::new(index, paragraph, sentence))
            .collect()
    }

    /// The tail of `closed` to carry forward, shrunk until `incoming` fits.
    fn overlap_seed(&self, closed: &[DocumentUnit], incoming: &DocumentUnit) -> Vec<DocumentUnit> {
        let mut take = self.config.overlap_sentences.min(closed.len());
        while take > 0 {
            let seed = &closed[closed.len() - take..];
            if joined_len(seed) + 1 + incoming.char_len <= self.config.max_chunk_chars {
                return seed.to_vec();
            }
            take -= 1;
        }
        Vec::new()
    }

    fn pack(&self, units: Vec<DocumentUnit>) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current: Vec<DocumentUnit> = Vec::new();

        for unit in units {
            let overflows = joined_len(&current) + 1 + unit.char_len > self.config.max_chunk_chars;
            if !current.is_empty() && overflows {
                let seed = self.overlap_seed(&current, &unit);
                let closed = std::mem::replace(&mut current, seed);
                chunks.push(Chunk::from_units(chunks.len(), None, 1, closed, " "));
            }
            current.push(unit);
        }

        if !current.is_empty() {
            chunks.push(Chunk::from_units(chunks.len(), None, 1, current, " "));
        }
        chunks
    }
}

impl Segmenter for SemanticSegmenter {
    fn segment(&self, text: &str) -> Vec<Chunk> {
        self.pack(self.sentences(text))
    }
}

/// Characters in `units` joined by single spaces.
fn joined_len(units: &[DocumentUnit]) -> usize {
    match units.len() {
        0 => 0,
        n => units.iter().map(|u| u.char_len).sum::<usize>() + n - 1,
    }
}

/// Split on blank lines; lines within a paragraph are joined with spaces.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !lines.is_empty() {
                paragraphs.push(lines.join(" "));
                lines.clear();
            }
        } else {
            lines.push(line);
        }
    }
    if !lines.is_empty() {
        paragraphs.push(lines.join(" "));
    }
    paragraphs
}

/// Split at `.`, `!` or `?` followed by whitespace. Returns non-empty,
/// trimmed sentences; trailing text without a terminator is the last one.
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(next_idx, next)) = chars.peek() {
            if next.is_whitespace() {
                let sentence = paragraph[start..next_idx].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                start = next_idx;
            }
        }
    }

    let tail = paragraph[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}
