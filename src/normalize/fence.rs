//! Code-fence stripping.

/// Remove a surrounding markdown code fence, if any, and trim.
///
/// The opening marker line is dropped when it carries only a language tag
/// (```` ```json ````, ```` ```python ````). When the opening fence is
/// followed directly by content on the same line, only the marker and a
/// leading `json` tag are removed.
pub fn strip_fences(text: &str) -> &str {
    let mut s = text.trim();

    if let Some(rest) = s.strip_prefix("```") {
        s = match rest.find('\n') {
            Some(newline) if is_fence_tag(&rest[..newline]) => &rest[newline + 1..],
            _ => rest.strip_prefix("json").unwrap_or(rest),
        };
    }

    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }

    s.trim()
}

fn is_fence_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
}
