use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared semantic type of a raw attribute.
///
/// The kind decides how the value is canonicalized before hashing:
/// exact text keeps digits, phonetic text keeps letters only, dates are
/// parsed and rendered in a fixed numeric layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    ExactText,
    PhoneticText,
    Date,
}

/// A single raw demographic input field.
///
/// Attributes are handed to the encoder by value and dropped inside it.
/// `Debug` is redacted so values never end up in logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
        }
    }

    pub fn exact(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::ExactText, value)
    }

    pub fn phonetic(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::PhoneticText, value)
    }

    pub fn date(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Date, value)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &"<redacted>")
            .finish()
    }
}
