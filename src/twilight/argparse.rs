//! Argument sub-parser
//!
//! Option rules are resolved argparse-style against the remainder the positional
//! pattern left unclaimed. The remainder is split into shell-like tokens (quotes
//! group words, adjacent pieces join), then walked left to right:
//!
//! - a token starting with `-` is a flag, unless it is quoted or a negative number
//! - `--flag=value` carries its first argument inline
//! - `Store`/`Append` options consume following non-flag tokens up to their arity
//!
//! Any unknown flag, stray token, failed conversion or choice violation aborts the
//! parse. Flags may occur in any order; repeated `Store` flags keep the last value.

use super::error::{NoMatchReason, SpecError};
use super::normalize::{is_reserved, Normalized};
use super::rule::{Action, OptionSpec};
use super::value::{Value, ValueKind};
use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static NEGATIVE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-(\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?$").unwrap());

/// Raw lexemes of the remainder
#[derive(Logos, Debug, PartialEq, Clone)]
enum Lexeme {
    #[regex(r"\s+")]
    Space,

    #[regex(r#""([^"\\]|\\[^\n])*""#)]
    DoubleQuoted,

    #[regex(r"'[^']*'")]
    SingleQuoted,

    #[regex(r#"[^\s"']+"#)]
    Bare,
}

/// One argument token after quote removal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgToken {
    pub text: String,
    /// The token began with a quote, so it is never taken as a flag.
    pub quoted: bool,
}

impl ArgToken {
    pub fn is_flag(&self) -> bool {
        !self.quoted
            && self.text.len() > 1
            && self.text.starts_with('-')
            && !NEGATIVE_NUMBER.is_match(&self.text)
    }
}

fn unescape(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                if next != '"' && next != '\\' {
                    out.push('\\');
                }
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a remainder into argument tokens.
pub fn tokenize(source: &str) -> Result<Vec<ArgToken>, NoMatchReason> {
    let mut tokens = Vec::new();
    let mut current: Option<ArgToken> = None;
    let mut lexer = Lexeme::lexer(source);

    while let Some(lexeme) = lexer.next() {
        let lexeme = lexeme.map_err(|_| {
            NoMatchReason::Tokenize(format!("unterminated quote at byte {}", lexer.span().start))
        })?;
        let slice = lexer.slice();
        match lexeme {
            Lexeme::Space => tokens.extend(current.take()),
            Lexeme::Bare => current
                .get_or_insert_with(ArgToken::default)
                .text
                .push_str(slice),
            Lexeme::SingleQuoted | Lexeme::DoubleQuoted => {
                let inner = &slice[1..slice.len() - 1];
                let token = current.get_or_insert_with(|| ArgToken {
                    text: String::new(),
                    quoted: true,
                });
                if lexeme == Lexeme::DoubleQuoted {
                    token.text.push_str(&unescape(inner));
                } else {
                    token.text.push_str(inner);
                }
            }
        }
    }
    tokens.extend(current);
    Ok(tokens)
}

#[derive(Debug, Clone)]
struct ArgEntry {
    rule: usize,
    name: String,
    spec: OptionSpec,
    regex: Option<Regex>,
}

impl ArgEntry {
    fn convert(&self, flag: &str, token: &str, normalized: &Normalized) -> Result<Value, NoMatchReason> {
        if let Some(regex) = &self.regex {
            if !regex.is_match(token) {
                return Err(NoMatchReason::Conversion {
                    flag: flag.to_string(),
                    message: format!("`{}` does not match `{}`", token, regex.as_str()),
                });
            }
        }
        let value = self
            .spec
            .value_kind
            .convert(token, normalized)
            .map_err(|message| NoMatchReason::Conversion {
                flag: flag.to_string(),
                message,
            })?;
        if let Some(choices) = &self.spec.choices {
            if !choices.contains(&value) {
                return Err(NoMatchReason::Choice {
                    flag: flag.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(value)
    }
}

/// Resolution of one option rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgOutcome {
    /// Index of the option in the rule list.
    pub rule: usize,
    pub matched: bool,
    pub value: Option<Value>,
}

/// Flag parser built from the option rules of a rule list.
#[derive(Debug, Clone, Default)]
pub struct ArgParser {
    entries: Vec<ArgEntry>,
    lookup: HashMap<String, usize>,
}

impl ArgParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every flag spelling, longest first.
    pub fn spellings(&self) -> Vec<&str> {
        let mut spellings: Vec<&str> = self.lookup.keys().map(String::as_str).collect();
        spellings.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        spellings
    }

    /// Register option rule `rule` under result name `name`.
    pub fn add(&mut self, rule: usize, name: &str, spec: &OptionSpec) -> Result<(), SpecError> {
        let invalid = |flag: &str, reason: &'static str| SpecError::InvalidFlag {
            rule: name.to_string(),
            flag: flag.to_string(),
            reason,
        };

        if spec.flags.is_empty() {
            return Err(invalid("", "an option needs at least one flag"));
        }
        for flag in &spec.flags {
            if !flag.starts_with('-') || flag.trim_start_matches('-').is_empty() {
                return Err(invalid(flag, "flags start with `-` followed by a name"));
            }
            if flag.chars().any(|c| c.is_whitespace() || c == '=' || is_reserved(c)) {
                return Err(invalid(flag, "flags cannot contain whitespace or `=`"));
            }
            if NEGATIVE_NUMBER.is_match(flag) {
                return Err(invalid(flag, "flags cannot look like negative numbers"));
            }
            if let Some(&other) = self.lookup.get(flag) {
                return Err(SpecError::ConflictingFlag {
                    flag: flag.clone(),
                    first: self.entries[other].name.clone(),
                    second: name.to_string(),
                });
            }
        }

        let regex = spec
            .regex
            .as_ref()
            .map(|pattern| Regex::new(&format!("^(?:{})$", pattern)))
            .transpose()
            .map_err(|e| SpecError::MalformedPattern {
                rule: name.to_string(),
                source: Box::new(e),
            })?;

        // string defaults go through the option's conversion, as argparse does
        let mut spec = spec.clone();
        if let Some(Value::Str(raw)) = spec.default.clone() {
            if spec.action.takes_values() && !matches!(spec.value_kind, ValueKind::Str) {
                let converted = spec
                    .value_kind
                    .convert(&raw, &Normalized::default())
                    .map_err(|reason| SpecError::InvalidDefault {
                        rule: name.to_string(),
                        reason,
                    })?;
                spec.default = Some(converted);
            }
        }

        if let (Some(choices), Some(default)) = (&spec.choices, &spec.default) {
            if !choices.contains(default) {
                tracing::debug!(option = name, "default is outside the declared choices");
            }
        }

        let index = self.entries.len();
        for flag in &spec.flags {
            self.lookup.insert(flag.clone(), index);
        }
        self.entries.push(ArgEntry {
            rule,
            name: name.to_string(),
            spec,
            regex,
        });
        Ok(())
    }

    /// Resolve every option against `rest`, a slice of `normalized`'s mapping string.
    pub fn parse(&self, rest: &str, normalized: &Normalized) -> Result<Vec<ArgOutcome>, NoMatchReason> {
        let tokens = tokenize(rest)?;
        let mut values: Vec<Option<Value>> = vec![None; self.entries.len()];
        let mut seen = vec![false; self.entries.len()];

        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            i += 1;
            if !token.is_flag() {
                return Err(NoMatchReason::UnexpectedToken(token.text.clone()));
            }
            let (flag, inline) = match token.text.split_once('=') {
                Some((flag, value)) if self.lookup.contains_key(flag) => (flag, Some(value)),
                _ => (token.text.as_str(), None),
            };
            let index = *self
                .lookup
                .get(flag)
                .ok_or_else(|| NoMatchReason::UnknownFlag(flag.to_string()))?;
            let entry = &self.entries[index];
            seen[index] = true;
            let previous = values[index].take();

            values[index] = match &entry.spec.action {
                Action::Store | Action::Append => {
                    let (min, max) = entry.spec.arity.bounds();
                    let mut raw: Vec<&str> = inline.into_iter().collect();
                    while max.map_or(true, |max| raw.len() < max)
                        && i < tokens.len()
                        && !tokens[i].is_flag()
                    {
                        raw.push(&tokens[i].text);
                        i += 1;
                    }
                    if raw.len() < min {
                        return Err(NoMatchReason::MissingValue(flag.to_string()));
                    }
                    let converted = raw
                        .iter()
                        .map(|token| entry.convert(flag, token, normalized))
                        .collect::<Result<Vec<_>, _>>()?;
                    let stored = if entry.spec.arity.is_scalar() {
                        converted
                            .into_iter()
                            .next()
                            .or_else(|| entry.spec.constant.clone())
                    } else {
                        Some(Value::List(converted))
                    };
                    if entry.spec.action == Action::Append {
                        let mut list = match previous {
                            Some(Value::List(list)) => list,
                            _ => Vec::new(),
                        };
                        list.extend(stored);
                        Some(Value::List(list))
                    } else {
                        stored
                    }
                }
                action => {
                    if inline.is_some() {
                        return Err(NoMatchReason::UnexpectedToken(token.text.clone()));
                    }
                    match action {
                        Action::StoreTrue => Some(Value::Bool(true)),
                        Action::StoreFalse => Some(Value::Bool(false)),
                        Action::StoreConst(value) => Some(value.clone()),
                        _ => {
                            let count = previous.as_ref().and_then(Value::as_int).unwrap_or(0);
                            Some(Value::Int(count + 1))
                        }
                    }
                }
            };
        }

        for (index, entry) in self.entries.iter().enumerate() {
            if entry.spec.required && !seen[index] {
                return Err(NoMatchReason::MissingRequired(entry.spec.flags[0].clone()));
            }
        }

        Ok(self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| ArgOutcome {
                rule: entry.rule,
                matched: seen[index],
                value: if seen[index] {
                    values[index].take()
                } else {
                    entry.spec.effective_default()
                },
            })
            .collect())
    }
}
