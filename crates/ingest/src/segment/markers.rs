//! Heading detection as an ordered list of pure line predicates.
//!
//! Each predicate inspects one line and returns the heading title and depth
//! when the line opens a new section. The first predicate that matches wins.

/// A detected heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMarker {
    pub title: String,
    pub level: u8,
}

impl HeadingMarker {
    fn new(title: &str, level: u8) -> Self {
        Self {
            title: title.trim().to_string(),
            level,
        }
    }
}

pub type MarkerFn = fn(&str) -> Option<HeadingMarker>;

/// Markdown headings, then numbered headings, then ALL-CAPS labels.
pub const DEFAULT_MARKERS: &[MarkerFn] = &[markdown_heading, numbered_heading, caps_label];

/// `# Title` through `###### Title`; level is the number of `#`.
pub fn markdown_heading(line: &str) -> Option<HeadingMarker> {
    let line = line.trim_end();
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(char::is_whitespace) || rest.trim().is_empty() {
        return None;
    }
    Some(HeadingMarker::new(rest, hashes as u8))
}

/// `3. Title` at line start. Numbers above 9 sit one level deeper.
pub fn numbered_heading(line: &str) -> Option<HeadingMarker> {
    let line = line.trim_end();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    if !rest.starts_with(char::is_whitespace) || rest.trim().is_empty() {
        return None;
    }
    let level = if line[..digits].trim_start_matches('0').len() > 1 { 2 } else { 1 };
    Some(HeadingMarker::new(rest, level))
}

/// `MATERIALS AND METHODS:`, uppercase letters and spaces ending in a colon.
pub fn caps_label(line: &str) -> Option<HeadingMarker> {
    let body = line.trim().strip_suffix(':')?;
    let mut chars = body.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    let rest: Vec<char> = chars.collect();
    if rest.is_empty() || !rest.iter().all(|c| c.is_ascii_uppercase() || *c == ' ') {
        return None;
    }
    Some(HeadingMarker::new(body, 1))
}
