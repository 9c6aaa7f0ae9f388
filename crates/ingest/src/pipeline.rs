//! End-to-end document summarization runs.
//!
//! A run segments the text, summarizes chunks strictly in order (each chunk's
//! context depends on the previous chunks' committed summaries), analyzes the
//! finalized chunks, and reduces them with one last completion call. Any
//! completion failure aborts the run; there is no partial result.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use labforge_core::config::SummarizerConfig;
use labforge_llm::CompletionService;

use crate::analyzer::{DocumentStructure, TopicAnalyzer, TopicRelationship};
use crate::context::{ContextBuilder, DocumentType};
use crate::error::PipelineError;
use crate::reducer::HierarchicalReducer;
use crate::segment::{
    Chunk, SemanticConfig, SemanticSegmenter, Segmenter, StructuralConfig, StructuralSegmenter,
};
use crate::summarizer::{ChunkSummarizer, SummarizedChunk};

// ── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub structural: StructuralConfig,
    pub semantic: SemanticConfig,
    /// Preceding chunks folded into each context digest.
    pub context_window: usize,
    pub context_excerpt_chars: usize,
    pub continuation_threshold: f64,
    pub reading_chars_per_minute: usize,
    /// Reject documents that segment into more chunks than this.
    pub max_chunks: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            structural: StructuralConfig::default(),
            semantic: SemanticConfig::default(),
            context_window: 2,
            context_excerpt_chars: 200,
            continuation_threshold: 0.7,
            reading_chars_per_minute: 1_000,
            max_chunks: None,
        }
    }
}

impl From<&SummarizerConfig> for PipelineConfig {
    fn from(cfg: &SummarizerConfig) -> Self {
        Self {
            structural: StructuralConfig {
                min_section_chars: cfg.section_min_chars,
                max_section_chars: cfg.section_max_chars,
                overlap_chars: cfg.section_overlap_chars,
                split_ratio: cfg.section_split_ratio,
            },
            semantic: SemanticConfig {
                max_chunk_chars: cfg.semantic_max_chars,
                overlap_sentences: cfg.semantic_overlap_sentences,
            },
            context_window: cfg.context_window,
            context_excerpt_chars: cfg.context_excerpt_chars,
            continuation_threshold: cfg.continuation_threshold,
            reading_chars_per_minute: cfg.reading_chars_per_minute,
            max_chunks: cfg.max_chunks,
        }
    }
}

// ── Modes and results ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Heading-driven sections.
    Hierarchical,
    /// Sentence-packed chunks.
    Semantic,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Hierarchical => f.write_str("hierarchical"),
            Mode::Semantic => f.write_str("semantic"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hierarchical" | "structural" => Ok(Mode::Hierarchical),
            "semantic" => Ok(Mode::Semantic),
            other => Err(format!("unknown mode: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<SummarizedChunk>,
    pub final_summary: String,
    pub key_points: Vec<String>,
    pub structure: DocumentStructure,
}

impl HierarchicalSummary {
    /// True for the explicit empty result of a blank document.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMap {
    pub topics: Vec<String>,
    pub relationships: Vec<TopicRelationship>,
    pub key_points: Vec<String>,
    pub structure: DocumentStructure,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub semantic_chunks: Vec<SummarizedChunk>,
    pub document_map: DocumentMap,
    pub final_summary: String,
}

impl SemanticSummary {
    pub fn is_empty(&self) -> bool {
        self.semantic_chunks.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DocumentSummary {
    Hierarchical(HierarchicalSummary),
    Semantic(SemanticSummary),
}

impl DocumentSummary {
    pub fn is_empty(&self) -> bool {
        match self {
            DocumentSummary::Hierarchical(s) => s.is_empty(),
            DocumentSummary::Semantic(s) => s.is_empty(),
        }
    }

    pub fn final_summary(&self) -> &str {
        match self {
            DocumentSummary::Hierarchical(s) => &s.final_summary,
            DocumentSummary::Semantic(s) => &s.final_summary,
        }
    }
}

/// Finalized chunks plus everything derived from them.
struct Reduced {
    chunks: Vec<SummarizedChunk>,
    relationships: Vec<TopicRelationship>,
    key_points: Vec<String>,
    structure: DocumentStructure,
    final_summary: String,
}

// ── Pipeline ────────────────────────────────────────────────────────────────

/// Summarizes documents through an injected completion service.
///
/// Holds no per-run state, so one instance can serve concurrent runs.
pub struct DocumentSummarizer {
    completion: Arc<dyn CompletionService>,
    config: PipelineConfig,
}

impl DocumentSummarizer {
    pub fn new(completion: Arc<dyn CompletionService>, config: PipelineConfig) -> Self {
        Self { completion, config }
    }

    pub async fn summarize(&self, text: &str, mode: Mode) -> Result<DocumentSummary, PipelineError> {
        match mode {
            Mode::Hierarchical => self
                .summarize_hierarchical(text)
                .await
                .map(DocumentSummary::Hierarchical),
            Mode::Semantic => self
                .summarize_semantic(text)
                .await
                .map(DocumentSummary::Semantic),
        }
    }

    /// Heading-driven run: `{ sections, finalSummary, keyPoints, structure }`.
    pub async fn summarize_hierarchical(&self, text: &str) -> Result<HierarchicalSummary, PipelineError> {
        let run_id = Uuid::new_v4();
        let segmenter = StructuralSegmenter::new(self.config.structural.clone());
        let reduced = self
            .run(&segmenter, text)
            .instrument(info_span!("summarize", %run_id, mode = "hierarchical"))
            .await?;

        Ok(HierarchicalSummary {
            run_id,
            generated_at: Utc::now(),
            sections: reduced.chunks,
            final_summary: reduced.final_summary,
            key_points: reduced.key_points,
            structure: reduced.structure,
        })
    }

    /// Sentence-packed run: `{ semanticChunks, documentMap, finalSummary }`.
    pub async fn summarize_semantic(&self, text: &str) -> Result<SemanticSummary, PipelineError> {
        let run_id = Uuid::new_v4();
        let segmenter = SemanticSegmenter::new(self.config.semantic.clone());
        let reduced = self
            .run(&segmenter, text)
            .instrument(info_span!("summarize", %run_id, mode = "semantic"))
            .await?;

        Ok(SemanticSummary {
            run_id,
            generated_at: Utc::now(),
            document_map: DocumentMap {
                topics: reduced.chunks.iter().map(|c| c.topic.clone()).collect(),
                relationships: reduced.relationships,
                key_points: reduced.key_points,
                structure: reduced.structure,
            },
            semantic_chunks: reduced.chunks,
            final_summary: reduced.final_summary,
        })
    }

    async fn run(&self, segmenter: &(dyn Segmenter + Sync), text: &str) -> Result<Reduced, PipelineError> {
        let started = Instant::now();
        let chunks = segmenter.segment(text);
        let document_type = chunks
            .first()
            .map(|c| DocumentType::infer(&c.content))
            .unwrap_or(DocumentType::General);
        let analyzer = TopicAnalyzer::new(
            self.config.continuation_threshold,
            self.config.reading_chars_per_minute,
        );

        if chunks.is_empty() {
            info!("empty document, nothing to summarize");
            return Ok(Reduced {
                chunks: Vec::new(),
                relationships: Vec::new(),
                key_points: Vec::new(),
                structure: analyzer.structure(&[], document_type),
                final_summary: String::new(),
            });
        }
        if let Some(limit) = self.config.max_chunks {
            if chunks.len() > limit {
                return Err(PipelineError::DocumentTooLarge {
                    chunks: chunks.len(),
                    limit,
                });
            }
        }

        info!(
            chunks = chunks.len(),
            chars = text.chars().count(),
            document_type = %document_type,
            "document segmented"
        );

        let finalized = self.summarize_chunks(chunks, document_type).await?;
        let analysis = analyzer.analyze(&finalized, document_type);
        let final_summary = HierarchicalReducer::new(self.completion.as_ref())
            .reduce(&finalized, &analysis.structure)
            .await?;

        info!(
            chunks = finalized.len(),
            key_points = analysis.key_points.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "document summarized"
        );

        Ok(Reduced {
            chunks: finalized,
            relationships: analysis.relationships,
            key_points: analysis.key_points,
            structure: analysis.structure,
            final_summary,
        })
    }

    /// Summarize chunks one at a time, in document order.
    async fn summarize_chunks(
        &self,
        chunks: Vec<Chunk>,
        document_type: DocumentType,
    ) -> Result<Vec<SummarizedChunk>, PipelineError> {
        let contexts = ContextBuilder::new(document_type, chunks.len())
            .with_window(self.config.context_window, self.config.context_excerpt_chars);
        let summarizer = ChunkSummarizer::new(self.completion.as_ref());
        let mut finalized: Vec<SummarizedChunk> = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.into_iter().enumerate() {
            let context = contexts.build(&finalized, index);
            let summary = summarizer.summarize(&chunk, &context).await?;
            finalized.push(SummarizedChunk::new(chunk, summary));
        }
        Ok(finalized)
    }
}
