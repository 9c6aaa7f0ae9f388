//! Text segmentation: turns raw document text into ordered, bounded chunks.
//!
//! Two strategies implement [`Segmenter`]: [`StructuralSegmenter`] closes
//! sections at heading-like lines, [`SemanticSegmenter`] packs sentences into
//! a character budget with a small sentence overlap.

pub mod markers;
mod semantic;
mod structural;
mod types;

pub use markers::{HeadingMarker, MarkerFn, DEFAULT_MARKERS};
pub use semantic::{split_paragraphs, split_sentences, SemanticConfig, SemanticSegmenter};
pub use structural::{natural_split_point, StructuralConfig, StructuralSegmenter};
pub use types::{Chunk, DocumentUnit};

/// A strategy for cutting document text into chunks, in document order.
pub trait Segmenter {
    fn segment(&self, text: &str) -> Vec<Chunk>;
}

/// Character (not byte) length.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The last `n` characters of `text`.
pub(crate) fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// The first `n` characters of `text`.
pub(crate) fn head_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
