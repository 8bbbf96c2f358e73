//! Match rules
//!
//! A rule list is an ordered `Vec<MatchRule>`. Positional rules (literal, union,
//! param, wildcard, element) are matched left to right by one composite regex.
//! Option rules are flag-style arguments resolved afterwards, against whatever the
//! positional match left over.
//!
//! Rules are built fluently:
//!
//! ```text
//! vec![
//!     MatchRule::literal(".roll"),
//!     MatchRule::param("dice").pattern(r"\d+d\d+").optional(),
//!     MatchRule::option(["-v", "--verbose"]).action(Action::StoreTrue),
//! ]
//! ```
//!
//! Modifiers only affect the rule variants they make sense for; `greedy()` on a
//! literal, or `choices()` on a param, is ignored.

use super::value::{Value, ValueKind};
use serde::Deserialize;

/// Separator emitted after a positional fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacePolicy {
    /// The next fragment follows immediately.
    NoSpace,
    /// Whitespace is allowed but not required.
    #[default]
    Preserve,
    /// At least one whitespace character is required.
    Force,
}

impl SpacePolicy {
    pub fn separator(self) -> &'static str {
        match self {
            SpacePolicy::NoSpace => "",
            SpacePolicy::Preserve => r"\s*",
            SpacePolicy::Force => r"\s+",
        }
    }
}

/// Inline regex flags applied to one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PatternFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_all: bool,
    pub verbose: bool,
}

impl PatternFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn multi_line(mut self) -> Self {
        self.multi_line = true;
        self
    }

    pub fn dot_all(mut self) -> Self {
        self.dot_all = true;
        self
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Parse the short form used in rule files, e.g. `"ix"`.
    pub fn parse(letters: &str) -> Result<Self, char> {
        let mut flags = Self::default();
        for c in letters.chars().filter(|c| !c.is_whitespace()) {
            match c {
                'i' => flags.case_insensitive = true,
                'm' => flags.multi_line = true,
                's' => flags.dot_all = true,
                'x' => flags.verbose = true,
                other => return Err(other),
            }
        }
        Ok(flags)
    }

    pub fn letters(&self) -> String {
        let mut letters = String::new();
        if self.case_insensitive {
            letters.push('i');
        }
        if self.multi_line {
            letters.push('m');
        }
        if self.dot_all {
            letters.push('s');
        }
        if self.verbose {
            letters.push('x');
        }
        letters
    }

    pub fn is_empty(&self) -> bool {
        self.letters().is_empty()
    }

    /// Scope the flags to `fragment`.
    pub fn wrap(&self, fragment: &str) -> String {
        let letters = self.letters();
        if letters.is_empty() {
            return fragment.to_string();
        }
        // a trailing `#` comment in verbose mode would swallow the closing paren
        let end = if self.verbose { "\n)" } else { ")" };
        format!("(?{}:{}{}", letters, fragment, end)
    }
}

/// What a positional rule matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Exact text.
    Literal(String),
    /// One of several exact texts; longer alternatives are tried first.
    Union(Vec<String>),
    /// A run of non-whitespace, or a custom regex.
    Param(Option<String>),
    /// Anything, lazily unless `greedy`.
    Wildcard { greedy: bool },
    /// One opaque element of the given kind.
    Element(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Positional {
    pub pattern: Pattern,
    pub optional: bool,
    pub space: SpacePolicy,
    pub flags: PatternFlags,
}

/// What an option does when its flag is seen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Action {
    /// Store the converted argument(s).
    #[default]
    Store,
    /// Store a fixed value, takes no argument.
    StoreConst(Value),
    StoreTrue,
    StoreFalse,
    /// Collect the argument(s) of every occurrence into a list.
    Append,
    /// Count occurrences.
    Count,
}

impl Action {
    pub fn takes_values(&self) -> bool {
        matches!(self, Action::Store | Action::Append)
    }
}

/// How many argument tokens a `Store`/`Append` option consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    #[default]
    One,
    Exactly(usize),
    /// Zero or one; falls back to the option's constant when absent.
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Arity {
    pub fn bounds(self) -> (usize, Option<usize>) {
        match self {
            Arity::One => (1, Some(1)),
            Arity::Exactly(n) => (n, Some(n)),
            Arity::Optional => (0, Some(1)),
            Arity::ZeroOrMore => (0, None),
            Arity::OneOrMore => (1, None),
        }
    }

    /// Single-valued arities store a scalar, the others a list.
    pub fn is_scalar(self) -> bool {
        matches!(self, Arity::One | Arity::Optional)
    }
}

#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub flags: Vec<String>,
    pub action: Action,
    pub arity: Arity,
    pub value_kind: ValueKind,
    pub choices: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub constant: Option<Value>,
    pub required: bool,
    /// Every argument must fully match this pattern before conversion.
    pub regex: Option<String>,
}

impl OptionSpec {
    /// Name used when none is given: the first flag, dashes trimmed, inner `-` as `_`.
    pub fn derived_name(&self) -> String {
        let flag = self.flags.first().map(String::as_str).unwrap_or_default();
        flag.trim_start_matches('-').replace('-', "_")
    }

    /// Value reported when the flag never occurs.
    pub fn effective_default(&self) -> Option<Value> {
        if self.default.is_some() {
            return self.default.clone();
        }
        match self.action {
            Action::StoreTrue => Some(Value::Bool(false)),
            Action::StoreFalse => Some(Value::Bool(true)),
            Action::Count => Some(Value::Int(0)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    Positional(Positional),
    Option(OptionSpec),
}

#[derive(Debug, Clone)]
pub struct MatchRule {
    name: Option<String>,
    help: Option<String>,
    kind: RuleKind,
}

impl MatchRule {
    fn positional(pattern: Pattern) -> Self {
        Self {
            name: None,
            help: None,
            kind: RuleKind::Positional(Positional {
                pattern,
                optional: false,
                space: SpacePolicy::default(),
                flags: PatternFlags::default(),
            }),
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self::positional(Pattern::Literal(text.into()))
    }

    pub fn union<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::positional(Pattern::Union(
            alternatives.into_iter().map(Into::into).collect(),
        ))
    }

    /// A named capture of one whitespace-free run.
    pub fn param(name: impl Into<String>) -> Self {
        Self::positional(Pattern::Param(None)).named(name)
    }

    /// A lazy capture of anything. Unnamed until [`MatchRule::named`].
    pub fn wildcard() -> Self {
        Self::positional(Pattern::Wildcard { greedy: false })
    }

    pub fn element(kind: impl Into<String>) -> Self {
        Self::positional(Pattern::Element(kind.into()))
    }

    /// A flag-style option spelled by one or more flags, e.g. `["-s", "--switch"]`.
    pub fn option<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            help: None,
            kind: RuleKind::Option(OptionSpec {
                flags: flags.into_iter().map(Into::into).collect(),
                action: Action::default(),
                arity: Arity::default(),
                value_kind: ValueKind::default(),
                choices: None,
                default: None,
                constant: None,
                required: false,
                regex: None,
            }),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn optional(mut self) -> Self {
        match &mut self.kind {
            RuleKind::Positional(p) => p.optional = true,
            RuleKind::Option(o) => o.required = false,
        }
        self
    }

    pub fn required(mut self) -> Self {
        match &mut self.kind {
            RuleKind::Positional(p) => p.optional = false,
            RuleKind::Option(o) => o.required = true,
        }
        self
    }

    pub fn space(self, space: SpacePolicy) -> Self {
        self.map_positional(|p| p.space = space)
    }

    pub fn flags(self, flags: PatternFlags) -> Self {
        self.map_positional(|p| p.flags = flags)
    }

    /// Custom regex for a param rule.
    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.map_positional(|p| {
            if let Pattern::Param(custom) = &mut p.pattern {
                *custom = Some(pattern);
            }
        })
    }

    pub fn greedy(self) -> Self {
        self.map_positional(|p| {
            if let Pattern::Wildcard { greedy } = &mut p.pattern {
                *greedy = true;
            }
        })
    }

    pub fn action(self, action: Action) -> Self {
        self.map_option(|o| o.action = action)
    }

    pub fn arity(self, arity: Arity) -> Self {
        self.map_option(|o| o.arity = arity)
    }

    pub fn value_kind(self, kind: ValueKind) -> Self {
        self.map_option(|o| o.value_kind = kind)
    }

    pub fn choices<I, V>(self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let choices = choices.into_iter().map(Into::into).collect();
        self.map_option(|o| o.choices = Some(choices))
    }

    pub fn default(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.map_option(|o| o.default = Some(value))
    }

    pub fn constant(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.map_option(|o| o.constant = Some(value))
    }

    pub fn regex(self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.map_option(|o| o.regex = Some(pattern))
    }

    fn map_positional(mut self, f: impl FnOnce(&mut Positional)) -> Self {
        if let RuleKind::Positional(p) = &mut self.kind {
            f(p);
        }
        self
    }

    fn map_option(mut self, f: impl FnOnce(&mut OptionSpec)) -> Self {
        if let RuleKind::Option(o) = &mut self.kind {
            f(o);
        }
        self
    }

    /// The name the rule is exposed under in a result set.
    ///
    /// Options always have one; positional rules only when named.
    pub fn name(&self) -> Option<String> {
        match (&self.name, &self.kind) {
            (Some(name), _) => Some(name.clone()),
            (None, RuleKind::Option(o)) => Some(o.derived_name()),
            (None, RuleKind::Positional(_)) => None,
        }
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn as_positional(&self) -> Option<&Positional> {
        match &self.kind {
            RuleKind::Positional(p) => Some(p),
            RuleKind::Option(_) => None,
        }
    }

    pub fn as_option(&self) -> Option<&OptionSpec> {
        match &self.kind {
            RuleKind::Positional(_) => None,
            RuleKind::Option(o) => Some(o),
        }
    }

    pub fn is_option(&self) -> bool {
        matches!(self.kind, RuleKind::Option(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_wrap() {
        assert_eq!(PatternFlags::new().wrap("a"), "a");
        assert_eq!(PatternFlags::new().case_insensitive().wrap("a"), "(?i:a)");
        assert_eq!(
            PatternFlags::new().verbose().wrap("a # comment"),
            "(?x:a # comment\n)"
        );
    }

    #[test]
    fn test_flags_parse() {
        let flags = PatternFlags::parse("ix").unwrap();
        assert!(flags.case_insensitive && flags.verbose);
        assert!(!flags.dot_all);
        assert_eq!(PatternFlags::parse("q"), Err('q'));
    }

    #[test]
    fn test_option_names() {
        let rule = MatchRule::option(["-s", "--dry-run"]);
        assert_eq!(rule.name().as_deref(), Some("s"));
        let rule = MatchRule::option(["--dry-run", "-s"]);
        assert_eq!(rule.name().as_deref(), Some("dry_run"));
        let rule = MatchRule::option(["-s"]);
        assert_eq!(rule.name().as_deref(), Some("s"));
        let rule = MatchRule::option(["-s"]).named("switch");
        assert_eq!(rule.name().as_deref(), Some("switch"));
    }

    #[test]
    fn test_positional_names() {
        assert_eq!(MatchRule::literal(".cmd").name(), None);
        assert_eq!(MatchRule::param("n").name().as_deref(), Some("n"));
        assert_eq!(MatchRule::wildcard().named("rest").name().as_deref(), Some("rest"));
    }

    #[test]
    fn test_modifiers_apply_to_their_variant() {
        let rule = MatchRule::literal("a").greedy().action(Action::Count);
        assert_eq!(
            rule.as_positional().map(|p| &p.pattern),
            Some(&Pattern::Literal("a".into()))
        );

        let rule = MatchRule::wildcard().greedy().optional();
        let positional = rule.as_positional().unwrap();
        assert_eq!(positional.pattern, Pattern::Wildcard { greedy: true });
        assert!(positional.optional);
    }

    #[test]
    fn test_effective_default() {
        let flag = MatchRule::option(["-s"]).action(Action::StoreTrue);
        assert_eq!(flag.as_option().unwrap().effective_default(), Some(Value::Bool(false)));
        let count = MatchRule::option(["-v"]).action(Action::Count);
        assert_eq!(count.as_option().unwrap().effective_default(), Some(Value::Int(0)));
        let store = MatchRule::option(["--n"]).default(5);
        assert_eq!(store.as_option().unwrap().effective_default(), Some(Value::Int(5)));
        let bare = MatchRule::option(["--n"]);
        assert_eq!(bare.as_option().unwrap().effective_default(), None);
    }
}
