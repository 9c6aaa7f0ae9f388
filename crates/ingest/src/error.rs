use std::fmt;

use serde::Serialize;
use thiserror::Error;

use labforge_llm::CompletionFailure;

/// Which completion request a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ChunkSummary,
    KeyConcepts,
    FinalReduction,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::ChunkSummary => "chunk summarization",
            Phase::KeyConcepts => "key-concept extraction",
            Phase::FinalReduction => "final reduction",
        };
        f.write_str(s)
    }
}

/// A failed document run. No partial result accompanies it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{phase} failed{}: {source}", chunk_suffix(.chunk_index))]
    Completion {
        phase: Phase,
        chunk_index: Option<usize>,
        source: CompletionFailure,
    },

    #[error("document too large: {chunks} chunks exceeds the limit of {limit}")]
    DocumentTooLarge { chunks: usize, limit: usize },
}

fn chunk_suffix(index: &Option<usize>) -> String {
    index.map(|i| format!(" for chunk {i}")).unwrap_or_default()
}

impl PipelineError {
    pub(crate) fn completion(phase: Phase, chunk_index: Option<usize>, source: CompletionFailure) -> Self {
        PipelineError::Completion {
            phase,
            chunk_index,
            source,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            PipelineError::Completion { phase, .. } => Some(*phase),
            PipelineError::DocumentTooLarge { .. } => None,
        }
    }

    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            PipelineError::Completion { chunk_index, .. } => *chunk_index,
            PipelineError::DocumentTooLarge { .. } => None,
        }
    }

    /// Whether re-running the whole document may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Completion { source, .. } => source.is_retryable(),
            PipelineError::DocumentTooLarge { .. } => false,
        }
    }
}
