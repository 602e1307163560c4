//! Field normalization: trim, unify line endings, cap length.

/// Per-field character limits.
pub const NAME_MAX_CHARS: usize = 120;
pub const EMAIL_MAX_CHARS: usize = 160;
pub const TEL_MAX_CHARS: usize = 40;
pub const TYPE_MAX_CHARS: usize = 80;
pub const MESSAGE_MAX_CHARS: usize = 4000;

/// Characters stripped from both ends of every field: space, tab, LF, CR,
/// NUL and vertical tab. Full-width spaces are content, not padding.
const TRIMMED: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Strip `TRIMMED` characters from both ends.
pub fn trim_field(raw: &str) -> &str {
    raw.trim_matches(TRIMMED)
}

/// Trim surrounding whitespace, rewrite `\r\n` and lone `\r` to `\n`, then
/// keep at most `max_chars` Unicode scalar values.
///
/// The steps run in that order, so a truncated value may end in whitespace.
/// A value that is already trimmed, LF-only and within the limit comes back
/// unchanged.
pub fn normalize(raw: &str, max_chars: usize) -> String {
    let unified = trim_field(raw).replace("\r\n", "\n").replace('\r', "\n");
    truncate_chars(&unified, max_chars).to_string()
}

/// Longest prefix of `s` holding at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
