//! Document summarization: segmentation, context-carrying chunk summaries,
//! topic analysis and a final hierarchical reduction.

pub mod analyzer;
pub mod context;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod reducer;
pub mod segment;
pub mod summarizer;

pub use analyzer::{DocumentAnalysis, DocumentStructure, RelationshipKind, TopicAnalyzer, TopicRelationship};
pub use context::{ContextBuilder, DocumentContext, DocumentType};
pub use document::{extract_text, ExtractedDocument, ExtractionError, FileType};
pub use error::{Phase, PipelineError};
pub use pipeline::{
    DocumentMap, DocumentSummarizer, DocumentSummary, HierarchicalSummary, Mode, PipelineConfig,
    SemanticSummary,
};
pub use segment::{Chunk, DocumentUnit, Segmenter};
pub use summarizer::{ChunkSummarizer, ChunkSummary, SummarizedChunk};
