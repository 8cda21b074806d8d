//! Markdown artifact removal for prose fields.

/// Strip backticks, then `**`, then single `*`.
///
/// Plain substring removal, not markdown parsing. Only apply to prose; code
/// fields keep their characters.
pub fn clean(text: &str) -> String {
    text.replace('`', "").replace("**", "").replace('*', "")
}
