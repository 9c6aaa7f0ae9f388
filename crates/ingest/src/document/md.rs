use crate::segment::markers::markdown_heading;

/// Heading titles recognised by the Markdown marker, in document order.
pub(super) fn headings(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| markdown_heading(line.trim()))
        .map(|marker| marker.title)
        .collect()
}
