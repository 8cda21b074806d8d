//! Rescue extraction of complexities from free text.

use once_cell::sync::Lazy;
use regex::Regex;

/// `O(` ... `)` allowing one level of nested parentheses, e.g. `O(n log n)`,
/// `O(log(n))`, `O(n²)`. The `O` must start a word, so `INFO(n)` is skipped.
static BIG_O: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bO\((?:[^()]|\([^()]*\))+\)").expect("big-O pattern is valid")
});

pub const TIME_LABEL: &str = "time complexity";
pub const SPACE_LABEL: &str = "space complexity";

/// First big-O expression that follows an occurrence of `label` and comes
/// before the next label of either kind.
///
/// Occurrences are tried in order, so a label mentioned in passing ("the time
/// complexity and space complexity of this code") is skipped in favour of the
/// one that actually carries a value. `label` must be lower-case ASCII.
pub fn complexity_after(text: &str, label: &str) -> Option<String> {
    // ASCII lowering keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    lowered.match_indices(label).find_map(|(at, _)| {
        let start = at + label.len();
        let end = next_label(&lowered, start).unwrap_or(text.len());
        BIG_O
            .find(&text[start..end])
            .map(|m| m.as_str().to_string())
    })
}

fn next_label(lowered: &str, from: usize) -> Option<usize> {
    [TIME_LABEL, SPACE_LABEL]
        .iter()
        .filter_map(|label| lowered[from..].find(label).map(|at| from + at))
        .min()
}
