//! Rule compiler
//!
//! Turns an ordered rule list into a [`Twilight`]: one anchored composite regex for
//! the positional rules, plus an [`ArgParser`] for the option rules.
//!
//! Composite layout, for positional fragments `f0 .. fn`:
//!
//! ```text
//! ^ (?P<_r0>f0) sep0 (?P<_r1>f1) sep1 ... (?P<_rN>fN) TAIL
//! ```
//!
//! - `sepK` comes from rule K's [`SpacePolicy`] and sits between fragments K and K+1.
//! - An optional rule wraps its fragment and the separator before it:
//!   `(?:sepJ(?P<_rK>fK))?`, so an absent rule leaves no separator behind.
//! - While every earlier rule is optional the separator may also be `^`, for the
//!   case where none of them matched.
//! - Groups are named after the rule index, never after the user's rule name, so
//!   rule names are free-form text.
//! - Without options `TAIL` is `\s*$`. With options it is an optional remainder
//!   that must start with a declared flag, captured as `_rest` for the sub-parser.
//!
//! Built-in param and wildcard fragments treat a placeholder as a single atom, so
//! they never end inside a non-text element.

use super::argparse::ArgParser;
use super::error::SpecError;
use super::normalize::{is_reserved, placeholder_pattern};
use super::rule::{Arity, MatchRule, OptionSpec, Pattern, Positional, RuleKind, SpacePolicy};
use regex::Regex;
use std::collections::HashSet;

pub(crate) const REST_GROUP: &str = "_rest";

/// A positional rule's slot in the composite pattern.
#[derive(Debug, Clone)]
pub(crate) struct GroupSlot {
    pub rule: usize,
    pub group: String,
}

/// The compiled, immutable form of a rule list.
///
/// Build once, then call [`Twilight::evaluate`] from as many threads as needed.
#[derive(Debug, Clone)]
pub struct Twilight {
    pub(crate) rules: Vec<MatchRule>,
    pub(crate) names: Vec<Option<String>>,
    pub(crate) regex: Regex,
    pub(crate) groups: Vec<GroupSlot>,
    pub(crate) parser: ArgParser,
}

fn atom() -> String {
    format!(r"(?:{}|[^\x02\x03])", placeholder_pattern(None))
}

fn text_atom() -> String {
    format!(r"(?:{}|[^\s\x02\x03])", placeholder_pattern(None))
}

/// `regex::escape` plus whitespace, which verbose mode would otherwise drop.
fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in regex::escape(text).chars() {
        if c.is_whitespace() {
            out.push_str(&format!(r"\x{{{:X}}}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Regex fragment for one positional rule, flags applied, before grouping.
fn fragment(index: usize, label: &str, positional: &Positional) -> Result<String, SpecError> {
    let reserved = |text: &str| text.chars().any(is_reserved);
    let fragment = match &positional.pattern {
        Pattern::Literal(text) => {
            if text.is_empty() {
                return Err(SpecError::EmptyLiteral(index));
            }
            if reserved(text) {
                return Err(SpecError::ReservedCharacter(index));
            }
            escape_literal(text)
        }
        Pattern::Union(alternatives) => {
            if alternatives.is_empty() {
                return Err(SpecError::EmptyUnion(index));
            }
            if alternatives.iter().any(|a| reserved(a)) {
                return Err(SpecError::ReservedCharacter(index));
            }
            // stable sort: equal lengths keep declaration order
            let mut sorted: Vec<&String> = alternatives.iter().collect();
            sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
            let escaped: Vec<String> = sorted.iter().map(|a| escape_literal(a)).collect();
            format!("(?:{})", escaped.join("|"))
        }
        Pattern::Param(Some(custom)) => {
            let scoped = if positional.flags.is_empty() {
                format!("(?:{})", custom)
            } else {
                positional.flags.wrap(custom)
            };
            Regex::new(&scoped).map_err(|e| SpecError::MalformedPattern {
                rule: label.to_string(),
                source: Box::new(e),
            })?;
            return Ok(scoped);
        }
        Pattern::Param(None) => format!("{}+?", text_atom()),
        Pattern::Wildcard { greedy: false } => format!("{}*?", atom()),
        Pattern::Wildcard { greedy: true } => format!("{}*", atom()),
        Pattern::Element(kind) => placeholder_pattern(Some(kind)),
    };
    Ok(positional.flags.wrap(&fragment))
}

impl Twilight {
    /// Compile an ordered rule list.
    pub fn new<I>(rules: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = MatchRule>,
    {
        let rules: Vec<MatchRule> = rules.into_iter().collect();
        let names: Vec<Option<String>> = rules.iter().map(MatchRule::name).collect();

        let mut seen = HashSet::new();
        for name in names.iter().flatten() {
            if !seen.insert(name.as_str()) {
                return Err(SpecError::DuplicateName(name.clone()));
            }
        }

        let label = |index: usize| {
            names[index]
                .clone()
                .unwrap_or_else(|| format!("#{}", index))
        };

        let mut parser = ArgParser::new();
        for (index, rule) in rules.iter().enumerate() {
            if let RuleKind::Option(spec) = rule.kind() {
                parser.add(index, &label(index), spec)?;
            }
        }

        let positionals: Vec<(usize, &Positional)> = rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| rule.as_positional().map(|p| (index, p)))
            .collect();

        let mut pattern = String::from("^");
        let mut groups = Vec::with_capacity(positionals.len());
        let mut only_optional_before = true;
        for (position, (index, positional)) in positionals.iter().enumerate() {
            let group = format!("_r{}", index);
            let body = fragment(*index, &label(*index), positional)?;
            // the previous rule's policy separates it from this one
            let separator = match position.checked_sub(1).map(|p| positionals[p].1.space) {
                None | Some(SpacePolicy::NoSpace) => String::new(),
                Some(space) if only_optional_before => format!("(?:^|{})", space.separator()),
                Some(space) => space.separator().to_string(),
            };
            let piece = format!("{}(?P<{}>{})", separator, group, body);
            only_optional_before &= positional.optional;
            if positional.optional {
                pattern.push_str(&format!("(?:{})?", piece));
            } else {
                pattern.push_str(&piece);
            }
            groups.push(GroupSlot {
                rule: *index,
                group,
            });
        }

        if parser.is_empty() {
            pattern.push_str(r"\s*$");
        } else {
            let spellings: Vec<String> = parser
                .spellings()
                .into_iter()
                .map(regex::escape)
                .collect();
            pattern.push_str(&format!(
                r"(?:(?:^|\s+)(?P<{}>(?:{})(?s:[=\s].*?)?))?\s*$",
                REST_GROUP,
                spellings.join("|")
            ));
        }

        let regex =
            Regex::new(&pattern).map_err(|e| SpecError::CompositePattern(Box::new(e)))?;
        tracing::debug!(
            pattern = %pattern,
            positional = groups.len(),
            options = parser.len(),
            "compiled rule list"
        );

        Ok(Self {
            rules,
            names,
            regex,
            groups,
            parser,
        })
    }

    /// Compile from `(name, rule)` pairs; the pair's name overrides the rule's.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = (S, MatchRule)>,
        S: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(name, rule)| rule.named(name)))
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    /// The composite positional pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Result-set name of rule `index`, if it is exposed.
    pub fn rule_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).and_then(|n| n.as_deref())
    }

    /// Exposed names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().filter_map(|n| n.as_deref())
    }

    /// One-line usage in argparse style, e.g. `usage: .cmd <n> [-s]`.
    pub fn usage(&self) -> String {
        let mut line = String::from("usage:");
        let mut glue = " ";
        for (index, rule) in self.rules.iter().enumerate() {
            match rule.kind() {
                RuleKind::Positional(p) => {
                    line.push_str(glue);
                    line.push_str(&positional_usage(self.rule_name(index), p));
                    glue = if p.space == SpacePolicy::NoSpace { "" } else { " " };
                }
                RuleKind::Option(_) => {}
            }
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if let RuleKind::Option(o) = rule.kind() {
                let name = self.rule_name(index).unwrap_or_default();
                let shown = format!("{}{}", o.flags[0], option_values(name, o));
                line.push(' ');
                if o.required {
                    line.push_str(&shown);
                } else {
                    line.push_str(&format!("[{}]", shown));
                }
            }
        }
        line
    }

    /// Usage plus one line per rule carrying help text.
    pub fn help(&self) -> String {
        let mut out = self.usage();
        let entries: Vec<(String, &str)> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| {
                let help = rule.help_text()?;
                let label = match rule.kind() {
                    RuleKind::Positional(p) => positional_usage(self.rule_name(index), p),
                    RuleKind::Option(o) => format!(
                        "{}{}",
                        o.flags.join(", "),
                        option_values(self.rule_name(index).unwrap_or_default(), o)
                    ),
                };
                Some((label, help))
            })
            .collect();
        let width = entries.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, help) in entries {
            out.push_str(&format!("\n  {:<width$}  {}", label, help, width = width));
        }
        out
    }
}

fn positional_usage(name: Option<&str>, positional: &Positional) -> String {
    let shown = match (&positional.pattern, name) {
        (Pattern::Literal(text), _) => text.clone(),
        (Pattern::Union(alternatives), _) => format!("{{{}}}", alternatives.join("|")),
        (Pattern::Param(_), Some(name)) => format!("<{}>", name),
        (Pattern::Param(_), None) => "<param>".to_string(),
        (Pattern::Wildcard { .. }, Some(name)) => format!("<{}...>", name),
        (Pattern::Wildcard { .. }, None) => "...".to_string(),
        (Pattern::Element(kind), Some(name)) => format!("<{}:{}>", name, kind),
        (Pattern::Element(kind), None) => format!("<{}>", kind),
    };
    if positional.optional {
        format!("[{}]", shown)
    } else {
        shown
    }
}

fn option_values(name: &str, option: &OptionSpec) -> String {
    if !option.action.takes_values() {
        return String::new();
    }
    let metavar = match &option.choices {
        Some(choices) => {
            let shown: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
            format!("{{{}}}", shown.join(","))
        }
        None => name.to_uppercase(),
    };
    match option.arity {
        Arity::One => format!(" {}", metavar),
        Arity::Exactly(n) => format!(" {}", vec![metavar; n].join(" ")),
        Arity::Optional => format!(" [{}]", metavar),
        Arity::ZeroOrMore => format!(" [{} ...]", metavar),
        Arity::OneOrMore => format!(" {} [{} ...]", metavar, metavar),
    }
}
