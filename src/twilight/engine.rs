//! Execution engine
//!
//! Evaluation runs in four steps, each of which can only fail by producing a
//! no-match:
//!
//! 1. normalize the element sequence into a mapping string
//! 2. run the composite pattern; positional groups become regex results
//! 3. hand the `_rest` remainder to the argument parser
//! 4. assemble every exposed result into a [`Sparkle`]
//!
//! Nothing is shared between evaluations except the immutable [`Twilight`].

use super::compile::{Twilight, REST_GROUP};
use super::element::Element;
use super::error::NoMatchReason;
use super::normalize::normalize;
use super::sparkle::{MatchResult, Sparkle};
use super::value::Value;

/// Result of one evaluation.
#[derive(Debug)]
#[must_use]
pub enum Outcome<'s> {
    Matched(Sparkle<'s>),
    NoMatch(NoMatchReason),
}

impl<'s> Outcome<'s> {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Matched(_))
    }

    pub fn sparkle(&self) -> Option<&Sparkle<'s>> {
        match self {
            Outcome::Matched(sparkle) => Some(sparkle),
            Outcome::NoMatch(_) => None,
        }
    }

    pub fn into_sparkle(self) -> Option<Sparkle<'s>> {
        match self {
            Outcome::Matched(sparkle) => Some(sparkle),
            Outcome::NoMatch(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&NoMatchReason> {
        match self {
            Outcome::Matched(_) => None,
            Outcome::NoMatch(reason) => Some(reason),
        }
    }
}

impl Twilight {
    /// Match an element sequence against the compiled rules.
    pub fn evaluate(&self, elements: &[Element]) -> Outcome<'_> {
        match self.try_evaluate(elements) {
            Ok(sparkle) => Outcome::Matched(sparkle),
            Err(reason) => {
                tracing::trace!(%reason, "no match");
                Outcome::NoMatch(reason)
            }
        }
    }

    /// Match a plain text message.
    pub fn evaluate_str(&self, text: &str) -> Outcome<'_> {
        self.evaluate(&[Element::text(text)])
    }

    fn try_evaluate(&self, elements: &[Element]) -> Result<Sparkle<'_>, NoMatchReason> {
        let normalized = normalize(elements);
        let captures = self
            .regex
            .captures(normalized.as_str())
            .ok_or(NoMatchReason::Positional)?;

        let mut results = Vec::with_capacity(self.rules.len());
        for slot in &self.groups {
            let optional = self.rules[slot.rule]
                .as_positional()
                .map_or(false, |p| p.optional);
            // an optional rule that consumed nothing did not match
            let capture = captures
                .name(&slot.group)
                .filter(|m| !(optional && m.as_str().is_empty()));
            if let Some(m) = &capture {
                if normalized.splits_placeholder(&m.range()) {
                    return Err(NoMatchReason::SplitPlaceholder);
                }
            }
            if let Some(name) = self.rule_name(slot.rule) {
                let value = capture.map(|m| Value::from_elements(normalized.rehydrate(m.as_str())));
                results.push((name, MatchResult::regex(&self.rules[slot.rule], value)));
            }
        }

        if !self.parser.is_empty() {
            let rest = captures.name(REST_GROUP).map_or("", |m| m.as_str());
            for outcome in self.parser.parse(rest, &normalized)? {
                if let Some(name) = self.rule_name(outcome.rule) {
                    let rule = &self.rules[outcome.rule];
                    results.push((name, MatchResult::arg(rule, outcome.matched, outcome.value)));
                }
            }
        }

        // declaration order, regardless of which half produced a result
        results.sort_by_key(|(name, _)| self.names.iter().position(|n| n.as_deref() == Some(*name)));
        Ok(Sparkle::new(self, results))
    }
}
