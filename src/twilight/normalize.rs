//! Element normalizer
//!
//! Regex only understands strings, so an element sequence is flattened into one
//! "mapping string" before matching:
//!
//! - Text elements are concatenated verbatim. Boundaries between adjacent text
//!   elements are not kept, text may match across them.
//! - Every opaque element becomes a placeholder `\u{2}<index>_<kind>\u{3}`, where
//!   `index` is its position in the placeholder table.
//!
//! The two delimiter characters are control codes that are stripped from text
//! elements, so a placeholder can never be produced by adjacent text. Placeholders
//! never contain whitespace, which keeps them inside a single argument token.

use super::element::{Element, Opaque};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use std::sync::Arc;

pub const PLACEHOLDER_START: char = '\u{2}';
pub const PLACEHOLDER_END: char = '\u{3}';

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x02(\d+)_[A-Za-z0-9_]*\x03").unwrap());

/// Restrict a kind name to the characters a placeholder may carry.
pub fn sanitize_kind(kind: &str) -> String {
    kind.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Regex fragment matching exactly one placeholder, optionally of a given kind.
pub fn placeholder_pattern(kind: Option<&str>) -> String {
    match kind {
        Some(kind) => format!(r"\x02\d+_{}\x03", regex::escape(&sanitize_kind(kind))),
        None => r"\x02[^\x03]*\x03".to_string(),
    }
}

pub fn is_reserved(c: char) -> bool {
    c == PLACEHOLDER_START || c == PLACEHOLDER_END
}

#[derive(Debug, Clone)]
struct Slot {
    span: Range<usize>,
    element: Arc<Opaque>,
}

/// The mapping string plus its placeholder table.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    text: String,
    slots: Vec<Slot>,
}

/// Flatten an element sequence into a [`Normalized`] mapping string.
pub fn normalize(elements: &[Element]) -> Normalized {
    let mut normalized = Normalized::default();
    for element in elements {
        match element {
            Element::Text(text) => normalized
                .text
                .extend(text.chars().filter(|c| !is_reserved(*c))),
            Element::Opaque(opaque) => {
                let index = normalized.slots.len();
                let start = normalized.text.len();
                normalized.text.push(PLACEHOLDER_START);
                normalized.text.push_str(&index.to_string());
                normalized.text.push('_');
                normalized.text.push_str(&sanitize_kind(&opaque.kind));
                normalized.text.push(PLACEHOLDER_END);
                normalized.slots.push(Slot {
                    span: start..normalized.text.len(),
                    element: Arc::clone(opaque),
                });
            }
        }
    }
    normalized
}

impl Normalized {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn placeholder_count(&self) -> usize {
        self.slots.len()
    }

    /// True when `range` starts or ends strictly inside a placeholder.
    pub fn splits_placeholder(&self, range: &Range<usize>) -> bool {
        let inside = |pos: usize| self.slots.iter().any(|s| s.span.start < pos && pos < s.span.end);
        inside(range.start) || inside(range.end)
    }

    /// Turn a fragment of the mapping string back into elements.
    ///
    /// Adjacent text stays one element. An empty fragment yields no elements.
    pub fn rehydrate(&self, fragment: &str) -> Vec<Element> {
        let mut elements = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER_REGEX.captures_iter(fragment) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let slot = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| self.slots.get(index));
            let Some(slot) = slot else {
                continue;
            };
            if whole.start() > last {
                elements.push(Element::Text(fragment[last..whole.start()].to_string()));
            }
            elements.push(Element::Opaque(Arc::clone(&slot.element)));
            last = whole.end();
        }
        if last < fragment.len() {
            elements.push(Element::Text(fragment[last..].to_string()));
        }
        elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_is_concatenated() {
        let normalized = normalize(&[Element::text(".c"), Element::text("md 1")]);
        assert_eq!(normalized.as_str(), ".cmd 1");
        assert_eq!(normalized.placeholder_count(), 0);
    }

    #[test]
    fn test_opaque_becomes_placeholder() {
        let normalized = normalize(&[
            Element::text("hi "),
            Element::opaque("At", json!(1)),
            Element::text(" "),
            Element::opaque("Flash Image", json!(null)),
        ]);
        assert_eq!(normalized.as_str(), "hi \u{2}0_At\u{3} \u{2}1_Flash_Image\u{3}");
    }

    #[test]
    fn test_reserved_characters_are_stripped_from_text() {
        let normalized = normalize(&[Element::text("\u{2}0_At\u{3}")]);
        assert_eq!(normalized.as_str(), "0_At");
        assert_eq!(normalized.rehydrate(normalized.as_str()), vec![Element::text("0_At")]);
    }

    #[test]
    fn test_rehydrate_keeps_identity() {
        let at = Element::opaque("At", json!(7));
        let normalized = normalize(&[Element::text("x "), at.clone(), Element::text(" y")]);
        let elements = normalized.rehydrate(normalized.as_str());
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0], Element::text("x "));
        assert!(elements[1].same_identity(&at));
        assert_eq!(elements[2], Element::text(" y"));
    }

    #[test]
    fn test_splits_placeholder() {
        let normalized = normalize(&[Element::text("a"), Element::opaque("At", json!(1))]);
        // "a" + "\u{2}0_At\u{3}" -> placeholder spans bytes 1..7
        assert!(!normalized.splits_placeholder(&(0..1)));
        assert!(!normalized.splits_placeholder(&(1..7)));
        assert!(normalized.splits_placeholder(&(0..3)));
        assert!(normalized.splits_placeholder(&(3..7)));
    }

    #[test]
    fn test_placeholder_pattern_by_kind() {
        let regex = Regex::new(&format!("^{}$", placeholder_pattern(Some("At")))).unwrap();
        assert!(regex.is_match("\u{2}12_At\u{3}"));
        assert!(!regex.is_match("\u{2}12_Face\u{3}"));
        let any = Regex::new(&format!("^{}$", placeholder_pattern(None))).unwrap();
        assert!(any.is_match("\u{2}0_Face\u{3}"));
    }
}
