//! Folds chunk summaries into the document's final synthesis.

use tracing::debug;

use labforge_llm::CompletionService;

use crate::analyzer::DocumentStructure;
use crate::error::{Phase, PipelineError};
use crate::prompts;
use crate::summarizer::SummarizedChunk;

pub struct HierarchicalReducer<'a> {
    completion: &'a dyn CompletionService,
}

impl<'a> HierarchicalReducer<'a> {
    pub fn new(completion: &'a dyn CompletionService) -> Self {
        Self { completion }
    }

    /// One completion call over every chunk summary, in document order.
    pub async fn reduce(
        &self,
        chunks: &[SummarizedChunk],
        structure: &DocumentStructure,
    ) -> Result<String, PipelineError> {
        let prompt = prompts::reduction(chunks, structure);
        debug!(chunks = chunks.len(), prompt_chars = prompt.len(), "reducing document");

        let synthesis = self
            .completion
            .complete(&prompt)
            .await
            .map_err(|e| PipelineError::completion(Phase::FinalReduction, None, e))?;
        Ok(synthesis.trim().to_string())
    }
}
