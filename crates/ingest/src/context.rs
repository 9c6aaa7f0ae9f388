//! Per-chunk context digests built from already summarized chunks.

use std::fmt;

use serde::Serialize;

use crate::segment::head_chars;
use crate::summarizer::SummarizedChunk;

/// Coarse classification of the whole document, inferred once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Code,
    Academic,
    Technical,
    General,
}

const CLASS_TOKENS: &[&str] = &["class "];
const FUNCTION_TOKENS: &[&str] = &["def ", "function ", "fn "];
const ACADEMIC_TOKENS: &[&str] = &["abstract", "introduction"];
const TECHNICAL_TOKENS: &[&str] = &["requirements", "specification"];

impl DocumentType {
    /// Ordered keyword checks over a sample of the document (its first chunk).
    pub fn infer(sample: &str) -> Self {
        let lower = sample.to_lowercase();
        let has_any = |tokens: &[&str]| tokens.iter().any(|t| lower.contains(t));

        if has_any(CLASS_TOKENS) && has_any(FUNCTION_TOKENS) {
            DocumentType::Code
        } else if has_any(ACADEMIC_TOKENS) {
            DocumentType::Academic
        } else if has_any(TECHNICAL_TOKENS) {
            DocumentType::Technical
        } else {
            DocumentType::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Code => "code",
            DocumentType::Academic => "academic",
            DocumentType::Technical => "technical",
            DocumentType::General => "general",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral context handed to the summarizer for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContext {
    /// `"<title>: <excerpt>..."` per preceding chunk, newline separated.
    pub summary: String,
    pub previous_titles: Vec<String>,
    pub document_type: DocumentType,
    /// e.g. `"chunk 3 of 7"`.
    pub position: String,
}

impl DocumentContext {
    pub fn is_opening(&self) -> bool {
        self.previous_titles.is_empty()
    }
}

/// Builds [`DocumentContext`] values for one run.
///
/// The document type is fixed at construction so every chunk in the run
/// sees the same classification.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    document_type: DocumentType,
    total_chunks: usize,
    window: usize,
    excerpt_chars: usize,
}

impl ContextBuilder {
    pub fn new(document_type: DocumentType, total_chunks: usize) -> Self {
        Self {
            document_type,
            total_chunks,
            window: 2,
            excerpt_chars: 200,
        }
    }

    pub fn with_window(mut self, window: usize, excerpt_chars: usize) -> Self {
        self.window = window;
        self.excerpt_chars = excerpt_chars;
        self
    }

    /// Context for the chunk at `index`, drawn from the finalized `prior` chunks.
    pub fn build(&self, prior: &[SummarizedChunk], index: usize) -> DocumentContext {
        let end = index.min(prior.len());
        let start = end.saturating_sub(self.window);
        let recent = &prior[start..end];

        let summary = recent
            .iter()
            .map(|c| format!("{}: {}...", c.topic, head_chars(&c.chunk.content, self.excerpt_chars)))
            .collect::<Vec<_>>()
            .join("\n");

        DocumentContext {
            summary,
            previous_titles: recent.iter().map(|c| c.topic.clone()).collect(),
            document_type: self.document_type,
            position: format!("chunk {} of {}", index + 1, self.total_chunks),
        }
    }
}
