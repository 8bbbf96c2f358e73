//! Message elements
//!
//! The matcher consumes an ordered sequence of [`Element`]s: text runs interleaved
//! with opaque, non-text tokens (mentions, images, faces...). The engine never looks
//! inside an opaque element; it only needs its kind (for element rules) and its
//! identity (so a captured element can be handed back unchanged).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A non-text element. Only `kind` is visible to matching rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opaque {
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Opaque {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// One item of a message element sequence.
///
/// Opaque elements are reference counted: cloning an `Element` keeps the same
/// identity, which [`Element::same_identity`] observes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Text(String),
    Opaque(Arc<Opaque>),
}

impl Element {
    pub fn text(text: impl Into<String>) -> Self {
        Element::Text(text.into())
    }

    pub fn opaque(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Element::Opaque(Arc::new(Opaque::new(kind, payload)))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Element::Text(text) => Some(text),
            Element::Opaque(_) => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Arc<Opaque>> {
        match self {
            Element::Text(_) => None,
            Element::Opaque(opaque) => Some(opaque),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Element::Text(_))
    }

    /// Text elements compare by content, opaque elements by pointer.
    pub fn same_identity(&self, other: &Element) -> bool {
        match (self, other) {
            (Element::Text(a), Element::Text(b)) => a == b,
            (Element::Opaque(a), Element::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Element::Text(text.to_string())
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Element::Text(text)
    }
}

impl From<Opaque> for Element {
    fn from(opaque: Opaque) -> Self {
        Element::Opaque(Arc::new(opaque))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Text(text) => write!(f, "{}", text),
            Element::Opaque(opaque) => write!(f, "[{}]", opaque.kind),
        }
    }
}

/// Display form of a sequence: text verbatim, opaque elements as `[kind]`.
pub fn display_chain(elements: &[Element]) -> String {
    elements.iter().map(|e| e.to_string()).collect()
}
