//! Model answer → canonical label.

use std::sync::LazyLock;

use regex::Regex;

/// Pull the label out of a raw model answer.
///
/// Returns the trimmed text between the first `**` pair on a line, or the
/// whole trimmed answer when the model ignored the marker instruction.
pub fn normalize_label(raw: &str) -> String {
    static MARKED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));

    match MARKED_RE.captures(raw) {
        Some(caps) => caps[1].trim().to_string(),
        None => raw.trim().to_string(),
    }
}
