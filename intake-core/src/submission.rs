//! Raw form fields and the validated [`Submission`].

use std::collections::HashMap;

use crate::email::is_valid_email;
use crate::error::IntakeError;
use crate::normalize::EMAIL_MAX_CHARS;
use crate::normalize::MESSAGE_MAX_CHARS;
use crate::normalize::NAME_MAX_CHARS;
use crate::normalize::TEL_MAX_CHARS;
use crate::normalize::TYPE_MAX_CHARS;
use crate::normalize::normalize;
use crate::text::UntrustedText;

/// Decoded form body. A repeated key keeps its last value.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: HashMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Missing keys read as empty.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }
}

impl<K, V> FromIterator<(K, V)> for FormFields
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FormFields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

/// A normalized, validated contact submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: UntrustedText,
    pub email: UntrustedText,
    pub tel: UntrustedText,
    pub inquiry_type: UntrustedText,
    pub message: UntrustedText,
}

impl Submission {
    /// Normalize every field, then check required fields and email syntax.
    pub fn from_form(fields: &FormFields) -> Result<Self, IntakeError> {
        let normalized =
            |key: &str, max: usize| UntrustedText::new(normalize(fields.get_or_empty(key), max));

        let submission = Submission {
            name: normalized("name", NAME_MAX_CHARS),
            email: normalized("email", EMAIL_MAX_CHARS),
            tel: normalized("tel", TEL_MAX_CHARS),
            inquiry_type: normalized("type", TYPE_MAX_CHARS),
            message: normalized("message", MESSAGE_MAX_CHARS),
        };

        let required = [
            ("name", &submission.name),
            ("email", &submission.email),
            ("type", &submission.inquiry_type),
            ("message", &submission.message),
        ];
        if let Some(&(field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(IntakeError::MissingRequiredField { field });
        }

        if !is_valid_email(submission.email.as_str()) {
            return Err(IntakeError::InvalidEmailFormat);
        }

        Ok(submission)
    }
}
