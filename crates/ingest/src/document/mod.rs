//! Decoding of uploaded text files into pipeline input.

mod md;
mod txt;

use serde::Serialize;
use thiserror::Error;

use crate::pipeline::Mode;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Text,
    Markdown,
}

impl FileType {
    /// Resolve a file type from the filename's extension.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        };
        match ext.as_str() {
            "txt" | "text" => Ok(FileType::Text),
            "md" | "markdown" => Ok(FileType::Markdown),
            other => Err(ExtractionError::UnsupportedType(other.to_string())),
        }
    }
}

/// Result of decoding an uploaded document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub filename: String,
    pub file_type: FileType,
    /// Decoded, trimmed text.
    pub text: String,
    /// Markdown headings in document order. Always empty for plain text.
    pub headings: Vec<String>,
}

impl ExtractedDocument {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Heading-bearing documents summarize section by section, the rest by
    /// sentence packing.
    pub fn suggested_mode(&self) -> Mode {
        if self.headings.is_empty() {
            Mode::Semantic
        } else {
            Mode::Hierarchical
        }
    }
}

/// Decode file bytes based on the filename's extension.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    let file_type = FileType::from_filename(filename)?;
    let text = decode(bytes);

    let headings = match file_type {
        FileType::Text => Vec::new(),
        FileType::Markdown => md::headings(&text),
    };

    Ok(ExtractedDocument {
        filename: filename.to_string(),
        file_type,
        text: txt::normalize(&text),
        headings,
    })
}

/// UTF-8 first, lossy conversion otherwise.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_extensions_case_insensitively() {
        assert_eq!(FileType::from_filename("notes.TXT").unwrap(), FileType::Text);
        assert_eq!(FileType::from_filename("a.b.markdown").unwrap(), FileType::Markdown);
        assert!(matches!(
            FileType::from_filename("paper.pdf"),
            Err(ExtractionError::UnsupportedType(ext)) if ext == "pdf"
        ));
        assert!(FileType::from_filename("README").is_err());
    }

    #[test]
    fn markdown_with_headings_suggests_hierarchical() {
        let doc = extract_text(b"# Lab\n\nBody text.\n\n## Safety\n\nGoggles.", "lab.md").unwrap();
        assert_eq!(doc.headings, vec!["Lab", "Safety"]);
        assert_eq!(doc.suggested_mode(), Mode::Hierarchical);
    }

    #[test]
    fn plain_text_suggests_semantic() {
        let doc = extract_text(b"  # not a heading in plain text  \n", "notes.txt").unwrap();
        assert!(doc.headings.is_empty());
        assert_eq!(doc.text, "# not a heading in plain text");
        assert_eq!(doc.suggested_mode(), Mode::Semantic);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let doc = extract_text(b"caf\xe9 au lait", "menu.txt").unwrap();
        assert!(doc.text.starts_with("caf"));
        assert!(doc.text.ends_with("au lait"));
        assert_eq!(doc.char_count(), 12);
    }
}
