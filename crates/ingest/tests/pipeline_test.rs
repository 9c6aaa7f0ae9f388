use std::sync::Arc;

use labforge_ingest::prompts::{KEY_CONCEPTS_INSTRUCTION, REDUCTION_INSTRUCTION};
use labforge_ingest::{
    DocumentSummarizer, DocumentSummary, Mode, Phase, PipelineConfig, PipelineError, RelationshipKind,
};
use labforge_llm::completion::mock::ScriptedCompletion;
use labforge_llm::{CompletionFailure, FailureKind};

/// Answers by prompt kind: concepts, final reduction, or a chunk summary.
fn scripted(concepts: &'static str) -> Arc<ScriptedCompletion> {
    Arc::new(ScriptedCompletion::new(move |call, prompt| {
        if prompt.contains(KEY_CONCEPTS_INSTRUCTION) {
            Ok(concepts.to_string())
        } else if prompt.contains(REDUCTION_INSTRUCTION) {
            Ok("Final synthesis.".to_string())
        } else {
            Ok(format!("Summary from call {call}."))
        }
    }))
}

fn summarizer(svc: &Arc<ScriptedCompletion>, config: PipelineConfig) -> DocumentSummarizer {
    DocumentSummarizer::new(svc.clone(), config)
}

fn body(sentence: &str, times: usize) -> String {
    vec![sentence; times].join(" ")
}

fn two_section_doc() -> String {
    format!(
        "# Intro\n{}\n# Details\n{}",
        body("The lab introduces acid and base titration.", 4),
        body("Add the titrant slowly while swirling the flask.", 4),
    )
}

#[tokio::test]
async fn markdown_sections_become_titled_level_one_sections() {
    let svc = scripted("Titration\nIndicator");
    let out = summarizer(&svc, PipelineConfig::default())
        .summarize_hierarchical(&two_section_doc())
        .await
        .unwrap();

    let titles: Vec<_> = out.sections.iter().map(|s| s.topic.as_str()).collect();
    assert_eq!(titles, vec!["Intro", "Details"]);
    assert!(out.sections.iter().all(|s| s.chunk.level == 1));
    assert!(!out.structure.has_hierarchy);
    assert_eq!(out.structure.main_topics, vec!["Intro", "Details"]);
    assert_eq!(out.final_summary, "Final synthesis.");
    assert_eq!(out.key_points, vec!["Titration", "Indicator"]);
}

#[tokio::test]
async fn issues_two_calls_per_chunk_plus_one_reduction() {
    let svc = scripted("Titration");
    let out = summarizer(&svc, PipelineConfig::default())
        .summarize_hierarchical(&two_section_doc())
        .await
        .unwrap();

    let n = out.sections.len();
    assert_eq!(svc.call_count(), 2 * n + 1);

    let prompts = svc.prompts();
    assert!(prompts.last().unwrap().contains(REDUCTION_INSTRUCTION));
    assert_eq!(
        prompts.iter().filter(|p| p.contains(REDUCTION_INSTRUCTION)).count(),
        1
    );
    // Summary then concepts, chunk by chunk.
    assert!(!prompts[0].contains(KEY_CONCEPTS_INSTRUCTION));
    assert!(prompts[1].contains(KEY_CONCEPTS_INSTRUCTION));
    assert!(!prompts[2].contains(KEY_CONCEPTS_INSTRUCTION));
    assert!(prompts[3].contains(KEY_CONCEPTS_INSTRUCTION));
}

#[tokio::test]
async fn later_chunks_see_a_digest_of_earlier_ones() {
    let svc = scripted("Titration");
    summarizer(&svc, PipelineConfig::default())
        .summarize_hierarchical(&two_section_doc())
        .await
        .unwrap();

    let prompts = svc.prompts();
    assert!(prompts[0].contains("opening part of the document"));
    assert!(prompts[0].contains("chunk 1 of 2"));
    assert!(prompts[2].contains("Intro: The lab introduces acid and base titration."));
    assert!(prompts[2].contains("chunk 2 of 2"));
    // Summaries are fed to the reduction in document order.
    let reduction = prompts.last().unwrap();
    let intro = reduction.find("## Intro\nSummary from call 0.").unwrap();
    let details = reduction.find("## Details\nSummary from call 2.").unwrap();
    assert!(intro < details);
}

#[tokio::test]
async fn short_paragraph_packs_into_one_semantic_chunk() {
    let text = "Acids donate protons. Bases accept them. Water is amphoteric. \
                Indicators change colour. The endpoint is visible.";
    let svc = scripted("Acids\nBases");
    let out = summarizer(&svc, PipelineConfig::default())
        .summarize_semantic(text)
        .await
        .unwrap();

    assert_eq!(out.semantic_chunks.len(), 1);
    let chunk = &out.semantic_chunks[0].chunk;
    assert_eq!(chunk.units.len(), 5);
    assert_eq!(chunk.content, text.split_whitespace().collect::<Vec<_>>().join(" "));
    assert_eq!(out.document_map.topics, vec!["Acids"]);
    assert!(out.document_map.relationships.is_empty());
    assert_eq!(svc.call_count(), 3);
}

#[tokio::test]
async fn semantic_topics_come_from_first_key_concept() {
    let text = body("Every titration needs a clean burette and a steady hand.", 12);
    let mut config = PipelineConfig::default();
    config.semantic.max_chunk_chars = 200;

    let svc = scripted("Chemistry\nGlassware");
    let out = summarizer(&svc, config).summarize_semantic(&text).await.unwrap();

    let n = out.semantic_chunks.len();
    assert!(n > 1);
    assert_eq!(svc.call_count(), 2 * n + 1);
    assert!(out.document_map.topics.iter().all(|t| t == "Chemistry"));
    assert_eq!(out.document_map.relationships.len(), n - 1);
    for rel in &out.document_map.relationships {
        assert_eq!(rel.strength, 1.0);
        assert_eq!(rel.kind, RelationshipKind::Continuation);
    }
    assert_eq!(out.document_map.key_points, vec!["Chemistry", "Glassware"]);
}

#[tokio::test]
async fn failure_mid_document_aborts_the_run() {
    let text = format!(
        "# One\n{}\n# Two\n{}\n# Three\n{}",
        body("First section sentence here.", 5),
        body("Second section sentence here.", 5),
        body("Third section sentence here.", 5),
    );
    // Calls 0 and 1 belong to chunk 0; call 2 is chunk 1's summary.
    let svc = Arc::new(ScriptedCompletion::failing_on_call(2, FailureKind::Timeout, "ok"));
    let err = DocumentSummarizer::new(svc.clone(), PipelineConfig::default())
        .summarize(&text, Mode::Hierarchical)
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::ChunkSummary));
    assert_eq!(err.chunk_index(), Some(1));
    assert!(err.is_retryable());
    assert_eq!(svc.call_count(), 3);
    assert!(err.to_string().contains("for chunk 1"));
}

#[tokio::test]
async fn reduction_failure_yields_no_result() {
    let svc = Arc::new(ScriptedCompletion::new(|_, prompt| {
        if prompt.contains(REDUCTION_INSTRUCTION) {
            Err(CompletionFailure::new(FailureKind::Api, "bad request"))
        } else {
            Ok("fine".to_string())
        }
    }));
    let err = DocumentSummarizer::new(svc, PipelineConfig::default())
        .summarize_hierarchical(&two_section_doc())
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::FinalReduction));
    assert_eq!(err.chunk_index(), None);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn blank_input_returns_empty_result_without_calls() {
    let svc = scripted("unused");
    let summarizer = summarizer(&svc, PipelineConfig::default());

    let hierarchical = summarizer.summarize("  \n\n  ", Mode::Hierarchical).await.unwrap();
    let semantic = summarizer.summarize("", Mode::Semantic).await.unwrap();

    assert!(hierarchical.is_empty());
    assert!(semantic.is_empty());
    assert_eq!(hierarchical.final_summary(), "");
    assert_eq!(svc.call_count(), 0);
    if let DocumentSummary::Semantic(s) = semantic {
        assert_eq!(s.document_map.structure.total_chunks, 0);
        assert!(s.document_map.key_points.is_empty());
    } else {
        panic!("expected a semantic result");
    }
}

#[tokio::test]
async fn chunk_cap_rejects_before_any_call() {
    let svc = scripted("unused");
    let config = PipelineConfig {
        max_chunks: Some(1),
        ..PipelineConfig::default()
    };
    let err = summarizer(&svc, config)
        .summarize_hierarchical(&two_section_doc())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::DocumentTooLarge { chunks: 2, limit: 1 }));
    assert_eq!(svc.call_count(), 0);
}

#[tokio::test]
async fn results_serialize_with_camel_case_keys() {
    let svc = scripted("Titration");
    let summary = summarizer(&svc, PipelineConfig::default())
        .summarize(&two_section_doc(), Mode::Hierarchical)
        .await
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    for key in ["runId", "generatedAt", "sections", "finalSummary", "keyPoints", "structure"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    let section = &json["sections"][0];
    assert_eq!(section["topic"], "Intro");
    assert_eq!(section["keyConcepts"][0], "Titration");
    assert!(section.get("units").is_none());
    assert_eq!(json["structure"]["totalChunks"], 2);
}
