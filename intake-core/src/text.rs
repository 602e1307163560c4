//! Untrusted vs. HTML-safe text.
//!
//! Everything that arrives from a form is an [`UntrustedText`]. The only way
//! to get a [`SafeHtml`] out of it is [`UntrustedText::to_html`], and page
//! templates only take `SafeHtml`, so an unescaped echo does not compile.

use std::fmt;

/// User-originated text. Deliberately has no `Display` impl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UntrustedText(String);

impl UntrustedText {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for storage (the ledger is not HTML).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_html(&self) -> SafeHtml {
        escape_html(&self.0)
    }
}

impl From<String> for UntrustedText {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UntrustedText {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Text that is safe to interpolate into an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for use in element content and
/// quoted attribute values.
pub fn escape_html(raw: &str) -> SafeHtml {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    SafeHtml(out)
}
