//! # twilight
//!
//! A hybrid matcher for message element sequences.
//!
//! A message is a sequence of text runs and opaque, non-text elements. A rule list
//! mixes two kinds of rules:
//!
//! - positional rules (literal, union, param, wildcard, element), matched in order
//!   by one composite regex over the normalized message
//! - option rules, flag-style arguments resolved argparse-like against what the
//!   positional match left over
//!
//! The rule list compiles once into an immutable [`Twilight`](twilight::Twilight)
//! that can be evaluated concurrently. An evaluation either yields a
//! [`Sparkle`](twilight::Sparkle), mapping rule names to results, or a no-match.
//! Partial results are never exposed.
//!
//! File Layout
//!
//! src/twilight
//!   ├── element, normalize   Input model and the mapping string
//!   ├── rule, compile        Rule declarations and the composite pattern
//!   ├── argparse             Flag-style sub-parser
//!   ├── engine, sparkle      Evaluation and result sets
//!   └── config               Rule files

pub mod twilight;

pub use twilight::{Element, MatchRule, Outcome, Sparkle, Twilight};
