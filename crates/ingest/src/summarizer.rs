//! One summary request and one key-concept request per chunk.

use serde::Serialize;
use tracing::debug;

use labforge_llm::CompletionService;

use crate::context::DocumentContext;
use crate::error::{Phase, PipelineError};
use crate::prompts;
use crate::segment::Chunk;

const TOPIC_WORDS: usize = 6;

/// Completion output for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSummary {
    pub summary: String,
    pub key_concepts: Vec<String>,
}

/// A chunk with its summary, topic and key concepts filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub topic: String,
    pub summary: String,
    pub key_concepts: Vec<String>,
}

impl SummarizedChunk {
    /// Attach a summary. The topic is the section title when there is one,
    /// otherwise it is derived from the key concepts or opening words.
    pub fn new(chunk: Chunk, summary: ChunkSummary) -> Self {
        let topic = match &chunk.title {
            Some(title) => title.clone(),
            None => derive_topic(&chunk, &summary.key_concepts),
        };
        Self {
            chunk,
            topic,
            summary: summary.summary,
            key_concepts: summary.key_concepts,
        }
    }
}

pub struct ChunkSummarizer<'a> {
    completion: &'a dyn CompletionService,
}

impl<'a> ChunkSummarizer<'a> {
    pub fn new(completion: &'a dyn CompletionService) -> Self {
        Self { completion }
    }

    pub async fn summarize(
        &self,
        chunk: &Chunk,
        context: &DocumentContext,
    ) -> Result<ChunkSummary, PipelineError> {
        debug!(
            chunk = chunk.id,
            chars = chunk.char_len,
            position = %context.position,
            "summarizing chunk"
        );

        let summary = self
            .completion
            .complete(&prompts::chunk_summary(chunk, context))
            .await
            .map_err(|e| PipelineError::completion(Phase::ChunkSummary, Some(chunk.id), e))?;

        let concepts = self
            .completion
            .complete(&prompts::key_concepts(chunk))
            .await
            .map_err(|e| PipelineError::completion(Phase::KeyConcepts, Some(chunk.id), e))?;

        let key_concepts = parse_key_concepts(&concepts);
        debug!(chunk = chunk.id, concepts = key_concepts.len(), "chunk summarized");

        Ok(ChunkSummary {
            summary: summary.trim().to_string(),
            key_concepts,
        })
    }
}

/// One concept per non-blank line, with list bullets or numbering removed.
pub fn parse_key_concepts(raw: &str) -> Vec<String> {
    raw.lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return rest.trim();
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim();
        }
    }
    line
}

/// Topic for an untitled chunk: its first key concept, else the opening words
/// of its first sentence.
fn derive_topic(chunk: &Chunk, key_concepts: &[String]) -> String {
    if let Some(first) = key_concepts.first() {
        return first.clone();
    }
    let first_sentence = chunk
        .units
        .first()
        .map(|u| u.text.as_str())
        .unwrap_or(&chunk.content);
    let opening = first_sentence
        .split_whitespace()
        .take(TOPIC_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    let opening = opening.trim_end_matches(|c: char| c.is_ascii_punctuation());
    if opening.is_empty() {
        format!("Part {}", chunk.id + 1)
    } else {
        opening.to_string()
    }
}
