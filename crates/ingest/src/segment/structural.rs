//! Heading-driven segmentation with forced splits for oversized sections.

use super::markers::{HeadingMarker, MarkerFn, DEFAULT_MARKERS};
use super::types::{Chunk, DocumentUnit};
use super::{char_len, tail_chars, Segmenter};

const UNTITLED_SECTION: &str = "Introduction";
const CONTINUED_SUFFIX: &str = " (continued)";

/// Configuration for [`StructuralSegmenter`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralConfig {
    /// A heading only closes the open section once it holds more than this.
    pub min_section_chars: usize,
    /// Sections above this size are force-split (default: 3000).
    pub max_section_chars: usize,
    /// Trailing characters of a split section that seed its continuation.
    pub overlap_chars: usize,
    /// Split position as a fraction of `max_section_chars` (default: 0.8).
    pub split_ratio: f64,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            min_section_chars: 100,
            max_section_chars: 3_000,
            overlap_chars: 500,
            split_ratio: 0.8,
        }
    }
}

impl StructuralConfig {
    fn split_target(&self) -> usize {
        (self.max_section_chars as f64 * self.split_ratio) as usize
    }
}

/// Splits text into titled sections at heading lines.
pub struct StructuralSegmenter {
    config: StructuralConfig,
    markers: Vec<MarkerFn>,
}

impl StructuralSegmenter {
    pub fn new(config: StructuralConfig) -> Self {
        Self {
            config,
            markers: DEFAULT_MARKERS.to_vec(),
        }
    }

    /// Replace the heading predicates (checked in order).
    pub fn with_markers(mut self, markers: Vec<MarkerFn>) -> Self {
        self.markers = markers;
        self
    }

    fn detect(&self, line: &str) -> Option<HeadingMarker> {
        self.markers.iter().find_map(|marker| marker(line))
    }
}

impl Default for StructuralSegmenter {
    fn default() -> Self {
        Self::new(StructuralConfig::default())
    }
}

impl Segmenter for StructuralSegmenter {
    fn segment(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        text.lines()
            .fold(SectionFold::default(), |fold, line| fold.push_line(line, self))
            .finish()
            .into_iter()
            .enumerate()
            .map(|(id, section)| section.into_chunk(id))
            .collect()
    }
}

/// Byte offset of the first sentence boundary at or past `target_chars`.
///
/// A boundary is `.`, `!` or `?` followed by whitespace; the returned offset
/// points at that whitespace. Returns `None` when no interior boundary lies
/// past the target, in which case the caller keeps the section oversized.
pub fn natural_split_point(content: &str, target_chars: usize) -> Option<usize> {
    match scan_for_split(content, target_chars, ScanCursor::default()) {
        SplitScan::Found(cursor) => Some(cursor.byte),
        SplitScan::Exhausted(_) => None,
    }
}

/// Position in a section's content, in bytes and in characters before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ScanCursor {
    byte: usize,
    seen: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum SplitScan {
    /// Boundary found; the cursor points at the whitespace after it.
    Found(ScanCursor),
    /// No boundary yet. Appended text can only be decided from this cursor on.
    Exhausted(ScanCursor),
}

/// Boundary search starting at `from`, which must sit on a char boundary.
///
/// A terminator at the very end, or one followed only by whitespace, may
/// become a boundary once more text arrives, so the exhausted cursor stops
/// at the first such terminator.
fn scan_for_split(content: &str, target_chars: usize, from: ScanCursor) -> SplitScan {
    let mut seen = from.seen;
    let mut undecided: Option<ScanCursor> = None;
    let mut chars = content[from.byte..]
        .char_indices()
        .map(|(idx, c)| (idx + from.byte, c))
        .peekable();

    while let Some((idx, c)) = chars.next() {
        let here = ScanCursor { byte: idx, seen };
        seen += 1;
        if !matches!(c, '.' | '!' | '?') || seen < target_chars {
            continue;
        }
        match chars.peek() {
            Some(&(next_idx, next)) if next.is_whitespace() => {
                if !content[next_idx..].trim().is_empty() {
                    return SplitScan::Found(ScanCursor { byte: next_idx, seen });
                }
                undecided.get_or_insert(here);
            }
            Some(_) => {}
            None => {
                undecided.get_or_insert(here);
            }
        }
    }

    SplitScan::Exhausted(undecided.unwrap_or(ScanCursor {
        byte: content.len(),
        seen,
    }))
}

// ── Fold state ──────────────────────────────────────────────────────────────

/// A finished section, ready to become a chunk.
struct Section {
    title: String,
    level: u8,
    content: String,
}

impl Section {
    fn into_chunk(self, id: usize) -> Chunk {
        let unit = DocumentUnit::new(id, id, self.content);
        Chunk::from_units(id, Some(self.title), self.level, vec![unit], "")
    }
}

/// The section currently accumulating lines.
struct OpenSection {
    base_title: String,
    level: u8,
    continued: bool,
    content: String,
    /// Characters in `content`, kept in step with every append.
    char_len: usize,
    /// Everything before this has already failed the split search.
    scanned: ScanCursor,
}

impl OpenSection {
    fn untitled() -> Self {
        Self::titled(UNTITLED_SECTION.to_string(), 1)
    }

    fn from_marker(marker: HeadingMarker) -> Self {
        Self::titled(marker.title, marker.level)
    }

    fn titled(base_title: String, level: u8) -> Self {
        Self {
            base_title,
            level,
            continued: false,
            content: String::new(),
            char_len: 0,
            scanned: ScanCursor::default(),
        }
    }

    fn continuation(&self, content: String, char_len: usize) -> Self {
        Self {
            base_title: self.base_title.clone(),
            level: self.level,
            continued: true,
            content,
            char_len,
            scanned: ScanCursor::default(),
        }
    }

    fn append_line(&mut self, line: &str) {
        if !self.content.is_empty() {
            self.content.push('\n');
            self.char_len += 1;
        }
        self.content.push_str(line);
        self.char_len += char_len(line);
    }

    fn close(self) -> Option<Section> {
        let content = self.content.trim();
        if content.is_empty() {
            return None;
        }
        let title = if self.continued {
            format!("{}{}", self.base_title, CONTINUED_SUFFIX)
        } else {
            self.base_title
        };
        Some(Section {
            title,
            level: self.level,
            content: content.to_string(),
        })
    }
}

impl Default for OpenSection {
    fn default() -> Self {
        Self::untitled()
    }
}

#[derive(Default)]
struct SectionFold {
    closed: Vec<Section>,
    open: OpenSection,
}

impl SectionFold {
    fn push_line(mut self, line: &str, segmenter: &StructuralSegmenter) -> Self {
        let config = &segmenter.config;

        if let Some(marker) = segmenter.detect(line) {
            if self.open.char_len > config.min_section_chars {
                let previous = std::mem::replace(&mut self.open, OpenSection::from_marker(marker));
                self.closed.extend(previous.close());
                return self;
            }
            if self.open.content.trim().is_empty() {
                self.open = OpenSection::from_marker(marker);
                return self;
            }
            // Too little content to stand alone: the heading line stays as text.
        }

        self.open.append_line(line);
        self.split_oversized(config)
    }

    /// Force-split the open section while it exceeds the size budget.
    ///
    /// Each search resumes where the previous one gave up, so a section with
    /// no usable boundary is scanned once overall rather than once per line.
    fn split_oversized(mut self, config: &StructuralConfig) -> Self {
        while self.open.char_len > config.max_section_chars {
            let boundary =
                match scan_for_split(&self.open.content, config.split_target(), self.open.scanned) {
                    SplitScan::Found(boundary) => boundary,
                    SplitScan::Exhausted(cursor) => {
                        self.open.scanned = cursor;
                        break;
                    }
                };
            let head = self.open.content[..boundary.byte].trim_end();
            let remainder = self.open.content[boundary.byte..].trim_start();
            let overlap = tail_chars(head, config.overlap_chars);
            let seeded = format!("{overlap} {remainder}");
            let seeded_len = char_len(&seeded);
            if seeded_len >= self.open.char_len {
                self.open.scanned = boundary;
                break;
            }

            let head = head.to_string();
            let next = self.open.continuation(seeded, seeded_len);
            let mut finished = std::mem::replace(&mut self.open, next);
            finished.content = head;
            self.closed.extend(finished.close());
        }
        self
    }

    fn finish(mut self) -> Vec<Section> {
        self.closed.extend(self.open.close());
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_scan_resumes_at_the_end() {
        let content = "alpha beta. gamma";
        assert_eq!(
            scan_for_split(content, 1, ScanCursor { byte: 12, seen: 12 }),
            SplitScan::Exhausted(ScanCursor { byte: 17, seen: 17 })
        );
    }

    #[test]
    fn trailing_terminator_stays_undecided() {
        // "done." may still gain a following sentence.
        assert_eq!(
            scan_for_split("one two done.", 1, ScanCursor::default()),
            SplitScan::Exhausted(ScanCursor { byte: 12, seen: 12 })
        );
        assert_eq!(
            scan_for_split("one two done.  ", 1, ScanCursor::default()),
            SplitScan::Exhausted(ScanCursor { byte: 12, seen: 12 })
        );

        let grown = "one two done.  More text";
        assert_eq!(
            scan_for_split(grown, 1, ScanCursor { byte: 12, seen: 12 }),
            SplitScan::Found(ScanCursor { byte: 13, seen: 13 })
        );
    }

    #[test]
    fn resumed_scan_matches_full_scan() {
        let text = "Lorem ipsum dolor sit amet consectetur adipiscing. Elit sed do.";
        let full = natural_split_point(text, 20);

        let prefix = "Lorem ipsum dolor sit amet";
        let SplitScan::Exhausted(cursor) = scan_for_split(prefix, 20, ScanCursor::default()) else {
            panic!("prefix has no boundary");
        };
        let SplitScan::Found(resumed) = scan_for_split(text, 20, cursor) else {
            panic!("full text has a boundary");
        };
        assert_eq!(Some(resumed.byte), full);
    }

    #[test]
    fn unsplittable_section_is_not_rescanned_per_line() {
        let segmenter = StructuralSegmenter::default();
        let line = "cell | cell | cell | cell | cell";
        let mut fold = SectionFold::default().push_line("# Table", &segmenter);
        for _ in 0..500 {
            fold = fold.push_line(line, &segmenter);
        }

        assert!(fold.open.char_len > segmenter.config.max_section_chars);
        assert_eq!(fold.open.char_len, char_len(&fold.open.content));
        assert_eq!(fold.open.scanned.byte, fold.open.content.len());
        assert_eq!(fold.open.scanned.seen, fold.open.char_len);
    }

    #[test]
    fn megabyte_of_unsplittable_lines_segments_quickly() {
        let line = "word ".repeat(10);
        let text = format!("# Huge\n{}", vec![line.trim_end(); 20_000].join("\n"));
        assert!(text.len() > 900_000);

        let started = std::time::Instant::now();
        let chunks = StructuralSegmenter::default().segment(&text);
        let elapsed = started.elapsed();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].title.as_deref(), Some("Huge"));
        assert!(elapsed.as_secs() < 2, "segmentation took {elapsed:?}");
    }
}
