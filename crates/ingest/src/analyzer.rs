//! Topic relationships and document-level structure over finalized chunks.
//!
//! Everything here is a pure function of the chunk list: no completion calls,
//! and repeated runs over the same input give the same output.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::Serialize;

use crate::context::DocumentType;
use crate::summarizer::SummarizedChunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Continuation,
    Transition,
}

/// Edge between the topics of two consecutive chunks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRelationship {
    pub from_chunk: usize,
    pub to_chunk: usize,
    pub from_topic: String,
    pub to_topic: String,
    /// Jaccard similarity of the topics' word sets, in `[0, 1]`.
    pub strength: f64,
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStructure {
    pub total_chunks: usize,
    pub has_hierarchy: bool,
    /// Titles of level-1 chunks, in document order.
    pub main_topics: Vec<String>,
    pub document_type: DocumentType,
    pub total_chars: usize,
    pub estimated_reading_minutes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub relationships: Vec<TopicRelationship>,
    pub structure: DocumentStructure,
    pub key_points: Vec<String>,
}

/// Case-insensitive Jaccard similarity over whitespace-separated words.
///
/// Two empty topics have similarity 0.
pub fn topic_similarity(a: &str, b: &str) -> f64 {
    let words = |s: &str| -> HashSet<String> { s.split_whitespace().map(str::to_lowercase).collect() };
    let (a, b) = (words(a), words(b));

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[derive(Debug, Clone)]
pub struct TopicAnalyzer {
    continuation_threshold: f64,
    chars_per_minute: usize,
}

impl Default for TopicAnalyzer {
    fn default() -> Self {
        Self::new(0.7, 1_000)
    }
}

impl TopicAnalyzer {
    pub fn new(continuation_threshold: f64, chars_per_minute: usize) -> Self {
        Self {
            continuation_threshold,
            chars_per_minute: chars_per_minute.max(1),
        }
    }

    pub fn relationships(&self, chunks: &[SummarizedChunk]) -> Vec<TopicRelationship> {
        chunks
            .windows(2)
            .map(|pair| {
                let (from, to) = (&pair[0], &pair[1]);
                let strength = topic_similarity(&from.topic, &to.topic);
                let kind = if strength > self.continuation_threshold {
                    RelationshipKind::Continuation
                } else {
                    RelationshipKind::Transition
                };
                TopicRelationship {
                    from_chunk: from.chunk.id,
                    to_chunk: to.chunk.id,
                    from_topic: from.topic.clone(),
                    to_topic: to.topic.clone(),
                    strength,
                    kind,
                }
            })
            .collect()
    }

    pub fn structure(&self, chunks: &[SummarizedChunk], document_type: DocumentType) -> DocumentStructure {
        let total_chars: usize = chunks.iter().map(|c| c.chunk.char_len).sum();
        DocumentStructure {
            total_chunks: chunks.len(),
            has_hierarchy: chunks.iter().any(|c| c.chunk.level > 1),
            main_topics: chunks
                .iter()
                .filter(|c| c.chunk.level == 1)
                .map(|c| c.topic.clone())
                .collect(),
            document_type,
            total_chars,
            estimated_reading_minutes: total_chars.div_ceil(self.chars_per_minute),
        }
    }

    /// Key concepts across all chunks, first occurrence kept.
    pub fn key_points(&self, chunks: &[SummarizedChunk]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|c| c.key_concepts.iter().cloned())
            .collect::<IndexSet<String>>()
            .into_iter()
            .collect()
    }

    pub fn analyze(&self, chunks: &[SummarizedChunk], document_type: DocumentType) -> DocumentAnalysis {
        DocumentAnalysis {
            relationships: self.relationships(chunks),
            structure: self.structure(chunks, document_type),
            key_points: self.key_points(chunks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Chunk, DocumentUnit};

    fn finalized(id: usize, topic: &str, level: u8, chars: usize, concepts: &[&str]) -> SummarizedChunk {
        let unit = DocumentUnit::new(id, id, "x".repeat(chars));
        SummarizedChunk {
            chunk: Chunk::from_units(id, Some(topic.to_string()), level, vec![unit], ""),
            topic: topic.to_string(),
            summary: String::new(),
            key_concepts: concepts.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn identical_topics_are_a_continuation() {
        let chunks = vec![
            finalized(0, "Chemistry", 1, 10, &[]),
            finalized(1, "Chemistry", 1, 10, &[]),
        ];
        let rels = TopicAnalyzer::default().relationships(&chunks);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].strength, 1.0);
        assert_eq!(rels[0].kind, RelationshipKind::Continuation);
    }

    #[test]
    fn disjoint_topics_are_a_transition() {
        let chunks = vec![
            finalized(0, "Chemistry", 1, 10, &[]),
            finalized(1, "History", 1, 10, &[]),
        ];
        let rels = TopicAnalyzer::default().relationships(&chunks);
        assert_eq!(rels[0].strength, 0.0);
        assert_eq!(rels[0].kind, RelationshipKind::Transition);
        assert_eq!((rels[0].from_chunk, rels[0].to_chunk), (0, 1));
    }

    #[test]
    fn threshold_is_strict() {
        // 7 shared words out of 10 is exactly 0.7, which is not above it.
        let a = "a b c d e f g h i";
        let b = "a b c d e f g j";
        assert!((topic_similarity(a, b) - 0.7).abs() < 1e-12);
        let chunks = vec![finalized(0, a, 1, 1, &[]), finalized(1, b, 1, 1, &[])];
        assert_eq!(
            TopicAnalyzer::default().relationships(&chunks)[0].kind,
            RelationshipKind::Transition
        );
    }

    #[test]
    fn similarity_bounds_and_symmetry() {
        let topics = [
            "",
            "Acid base titration",
            "acid BASE",
            "Reaction kinetics",
            "  spaced   out  words ",
            "Acid base titration acid",
        ];
        for a in topics {
            for b in topics {
                let s = topic_similarity(a, b);
                assert!((0.0..=1.0).contains(&s));
                assert_eq!(s, topic_similarity(b, a));
                if s == 1.0 {
                    let set = |t: &str| {
                        t.split_whitespace().map(str::to_lowercase).collect::<HashSet<_>>()
                    };
                    assert_eq!(set(a), set(b));
                    assert!(!set(a).is_empty());
                }
            }
        }
        assert_eq!(topic_similarity("", ""), 0.0);
        assert_eq!(topic_similarity("Acid Base", "base acid"), 1.0);
    }

    #[test]
    fn structure_counts_levels_and_reading_time() {
        let chunks = vec![
            finalized(0, "Intro", 1, 1_200, &[]),
            finalized(1, "Detail", 2, 300, &[]),
            finalized(2, "Wrap up", 1, 1, &[]),
        ];
        let structure = TopicAnalyzer::default().structure(&chunks, DocumentType::Academic);
        assert_eq!(structure.total_chunks, 3);
        assert!(structure.has_hierarchy);
        assert_eq!(structure.main_topics, vec!["Intro", "Wrap up"]);
        assert_eq!(structure.total_chars, 1_501);
        assert_eq!(structure.estimated_reading_minutes, 2);
        assert_eq!(structure.document_type, DocumentType::Academic);
    }

    #[test]
    fn flat_document_has_no_hierarchy() {
        let chunks = vec![finalized(0, "Only", 1, 1_000, &[])];
        let structure = TopicAnalyzer::default().structure(&chunks, DocumentType::General);
        assert!(!structure.has_hierarchy);
        assert_eq!(structure.estimated_reading_minutes, 1);

        let empty = TopicAnalyzer::default().structure(&[], DocumentType::General);
        assert_eq!(empty.total_chunks, 0);
        assert_eq!(empty.estimated_reading_minutes, 0);
    }

    #[test]
    fn key_points_deduplicate_in_first_seen_order() {
        let chunks = vec![
            finalized(0, "A", 1, 1, &["pH", "Buffer", "pH"]),
            finalized(1, "B", 1, 1, &["Indicator", "Buffer"]),
            finalized(2, "C", 1, 1, &["Molarity", "pH"]),
        ];
        assert_eq!(
            TopicAnalyzer::default().key_points(&chunks),
            vec!["pH", "Buffer", "Indicator", "Molarity"]
        );
    }

    #[test]
    fn analysis_is_repeatable() {
        let chunks = vec![
            finalized(0, "Acid base", 1, 500, &["pH"]),
            finalized(1, "Acid base titration", 2, 700, &["Burette"]),
            finalized(2, "History", 1, 90, &["pH"]),
        ];
        let analyzer = TopicAnalyzer::default();
        let first = analyzer.analyze(&chunks, DocumentType::Technical);
        let second = analyzer.analyze(&chunks, DocumentType::Technical);
        assert_eq!(first, second);
        assert_eq!(first.relationships.len(), 2);
    }
}
