/// Unify line endings and strip surrounding whitespace.
pub(super) fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}
