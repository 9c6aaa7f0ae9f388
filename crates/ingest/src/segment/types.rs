//! Segmentation output types.

use serde::Serialize;

/// An atomic, ordered piece of input text: a sentence or a whole section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUnit {
    /// 0-based position in document order.
    pub index: usize,
    /// Owning paragraph (sentences) or section (structural units).
    pub parent: usize,
    pub text: String,
    /// Length in characters.
    pub char_len: usize,
}

impl DocumentUnit {
    pub fn new(index: usize, parent: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = super::char_len(&text);
        Self {
            index,
            parent,
            text,
            char_len,
        }
    }
}

/// A bounded group of units sent to the completion service as one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// 0-based, stable across the run.
    pub id: usize,
    /// Section heading, when segmentation is heading-driven.
    pub title: Option<String>,
    /// Heading depth; always 1 for sentence-packed chunks.
    pub level: u8,
    #[serde(skip)]
    pub units: Vec<DocumentUnit>,
    pub content: String,
    pub char_len: usize,
}

impl Chunk {
    /// Build a chunk whose content is its units joined by `separator`.
    pub fn from_units(
        id: usize,
        title: Option<String>,
        level: u8,
        units: Vec<DocumentUnit>,
        separator: &str,
    ) -> Self {
        let content = units
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(separator);
        let char_len = super::char_len(&content);
        Self {
            id,
            title,
            level,
            units,
            content,
            char_len,
        }
    }
}
