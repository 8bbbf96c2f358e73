//! Result sets
//!
//! A [`Sparkle`] is what one successful evaluation produces: every exposed rule
//! name mapped to its [`MatchResult`], in declaration order. It borrows the
//! [`Twilight`] it came from, so results can point back at their rules without
//! copying them.

use super::compile::Twilight;
use super::rule::MatchRule;
use super::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Index;

/// Which half of the engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// A positional capture.
    Regex,
    /// A flag-style option.
    Arg,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult<'s> {
    pub kind: ResultKind,
    pub matched: bool,
    #[serde(skip)]
    pub origin: &'s MatchRule,
    pub result: Option<Value>,
}

impl<'s> MatchResult<'s> {
    pub(crate) fn regex(origin: &'s MatchRule, result: Option<Value>) -> Self {
        Self {
            kind: ResultKind::Regex,
            matched: result.is_some(),
            origin,
            result,
        }
    }

    pub(crate) fn arg(origin: &'s MatchRule, matched: bool, result: Option<Value>) -> Self {
        Self {
            kind: ResultKind::Arg,
            matched,
            origin,
            result,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}

/// The read-only mapping produced by one evaluation.
pub struct Sparkle<'s> {
    twilight: &'s Twilight,
    results: Vec<(&'s str, MatchResult<'s>)>,
}

impl<'s> Sparkle<'s> {
    pub(crate) fn new(twilight: &'s Twilight, results: Vec<(&'s str, MatchResult<'s>)>) -> Self {
        Self { twilight, results }
    }

    /// The matcher this result set was produced by.
    pub fn twilight(&self) -> &'s Twilight {
        self.twilight
    }

    pub fn get(&self, name: &str) -> Option<&MatchResult<'s>> {
        self.results
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, result)| result)
    }

    /// Shortcut for the value of `name`, if it matched or has a default.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(MatchResult::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in rule declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'s str, &MatchResult<'s>)> {
        self.results.iter().map(|(name, result)| (*name, result))
    }

    pub fn regex_results(&self) -> impl Iterator<Item = (&'s str, &MatchResult<'s>)> {
        self.iter().filter(|(_, r)| r.kind == ResultKind::Regex)
    }

    pub fn arg_results(&self) -> impl Iterator<Item = (&'s str, &MatchResult<'s>)> {
        self.iter().filter(|(_, r)| r.kind == ResultKind::Arg)
    }
}

impl<'s> Index<&str> for Sparkle<'s> {
    type Output = MatchResult<'s>;

    /// Panics when `name` is not a rule name of the matcher.
    fn index(&self, name: &str) -> &Self::Output {
        self.get(name)
            .unwrap_or_else(|| panic!("no rule named `{}` in this result set", name))
    }
}

impl fmt::Debug for Sparkle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.results.iter().map(|(name, r)| (name, (r.kind, r.matched, &r.result))))
            .finish()
    }
}

impl Serialize for Sparkle<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for (name, result) in &self.results {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}
