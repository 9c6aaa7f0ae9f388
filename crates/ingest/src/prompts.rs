//! Prompt text for the three completion requests the pipeline issues.

use crate::analyzer::DocumentStructure;
use crate::context::DocumentContext;
use crate::segment::Chunk;
use crate::summarizer::SummarizedChunk;

/// Present in every key-concept prompt and no other.
pub const KEY_CONCEPTS_INSTRUCTION: &str = "List the 3-5 most important key concepts or terms";

/// Present in every final reduction prompt and no other.
pub const REDUCTION_INSTRUCTION: &str = "Create a comprehensive summary of this";

pub fn chunk_summary(chunk: &Chunk, context: &DocumentContext) -> String {
    let previous = if context.is_opening() {
        "(this is the opening part of the document)".to_string()
    } else {
        context.summary.clone()
    };
    let title = chunk
        .title
        .as_deref()
        .map(|t| format!("Section title: {t}\n\n"))
        .unwrap_or_default();

    format!(
        "Summarize the following part of a {doc_type} document ({position}).\n\n\
         Previous context:\n{previous}\n\n\
         {title}Content:\n{content}\n\n\
         Write a concise summary that preserves:\n\
         1. Key concepts and definitions\n\
         2. Relationships to previous sections\n\
         3. Main arguments or findings\n\
         4. Actionable information\n\n\
         Summary:",
        doc_type = context.document_type,
        position = context.position,
        content = chunk.content,
    )
}

pub fn key_concepts(chunk: &Chunk) -> String {
    format!(
        "{KEY_CONCEPTS_INSTRUCTION} in the following text.\n\
         Return one concept per line, with no numbering or commentary.\n\n\
         Text:\n{}",
        chunk.content
    )
}

/// One `## title / summary / key concepts` block per chunk, in document order.
pub fn section_blocks(chunks: &[SummarizedChunk]) -> String {
    chunks
        .iter()
        .map(|c| {
            format!(
                "## {}\n{}\nKey concepts: {}",
                c.topic,
                c.summary,
                c.key_concepts.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn reduction(chunks: &[SummarizedChunk], structure: &DocumentStructure) -> String {
    let hierarchy = if structure.has_hierarchy {
        " organised in nested sections"
    } else {
        ""
    };
    format!(
        "{REDUCTION_INSTRUCTION} {doc_type} document from its section summaries.\n\
         The document has {count} sections{hierarchy} and takes about {minutes} minutes to read.\n\n\
         {blocks}\n\n\
         Provide:\n\
         1. An executive summary (2-3 sentences)\n\
         2. The main sections with their key points\n\
         3. Relationships between sections\n\
         4. A conclusion",
        doc_type = structure.document_type,
        count = structure.total_chunks,
        minutes = structure.estimated_reading_minutes,
        blocks = section_blocks(chunks),
    )
}
