//! Pluggable spam detection.

use crate::normalize::trim_field;
use crate::submission::FormFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamVerdict {
    Accept,
    Reject,
}

/// Decides whether a raw form looks automated. Runs before field
/// validation and never sees normalized values.
pub trait SpamFilter: Send + Sync {
    fn inspect(&self, fields: &FormFields) -> SpamVerdict;
}

/// Rejects any submission whose hidden field carries non-blank content.
#[derive(Debug, Clone)]
pub struct HoneypotFilter {
    field: String,
}

impl HoneypotFilter {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Default for HoneypotFilter {
    fn default() -> Self {
        Self::new(crate::DEFAULT_HONEYPOT_FIELD)
    }
}

impl SpamFilter for HoneypotFilter {
    fn inspect(&self, fields: &FormFields) -> SpamVerdict {
        match fields.get(&self.field) {
            Some(value) if !trim_field(value).is_empty() => SpamVerdict::Reject,
            _ => SpamVerdict::Accept,
        }
    }
}
