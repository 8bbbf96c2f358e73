//! Rule files
//!
//! Rule lists can be declared in TOML, YAML or JSON and loaded through [`Loader`],
//! which layers sources with the `config` crate before deserializing them into a
//! [`RuleFile`]:
//!
//! ```toml
//! [[rules]]
//! kind = "literal"
//! text = ".roll"
//!
//! [[rules]]
//! kind = "param"
//! name = "dice"
//! pattern = '\d+d\d+'
//! optional = true
//!
//! [[rules]]
//! kind = "option"
//! flags = ["--verbose", "-v"]
//! action = "store_true"
//! ```
//!
//! Later sources replace the `rules` array of earlier ones.

use super::compile::Twilight;
use super::error::SpecError;
use super::rule::{Action, Arity, MatchRule, PatternFlags, SpacePolicy};
use super::value::{Value, ValueKind};
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error(transparent)]
    Source(#[from] ::config::ConfigError),

    #[error("rule #{index}: {message}")]
    Rule { index: usize, message: String },

    #[error(transparent)]
    Spec(#[from] SpecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Literal,
    Union,
    Param,
    Wildcard,
    Element,
    Option,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionDecl {
    #[default]
    Store,
    StoreConst,
    StoreTrue,
    StoreFalse,
    Append,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTypeDecl {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Element,
}

/// `nargs` as argparse spells it: a count, or one of `?`, `*`, `+`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NargsDecl {
    Count(usize),
    Symbol(String),
}

/// One `[[rules]]` entry. Fields not used by `kind` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDecl {
    pub kind: DeclKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub optional: bool,

    // positional
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub greedy: bool,
    #[serde(default)]
    pub space: SpacePolicy,
    #[serde(default)]
    pub regex_flags: Option<String>,

    // option
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub action: ActionDecl,
    #[serde(default)]
    pub nargs: Option<NargsDecl>,
    #[serde(default, rename = "type")]
    pub value_type: ValueTypeDecl,
    #[serde(default)]
    pub choices: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default, rename = "const")]
    pub constant: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub regex: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleFile {
    pub rules: Vec<RuleDecl>,
}

impl RuleFile {
    pub fn into_rules(self) -> Result<Vec<MatchRule>, RuleFileError> {
        self.rules
            .into_iter()
            .enumerate()
            .map(|(index, decl)| decl.into_rule(index))
            .collect()
    }

    pub fn compile(self) -> Result<Twilight, RuleFileError> {
        Ok(Twilight::new(self.into_rules()?)?)
    }
}

fn json_value(value: serde_json::Value, kind: ValueTypeDecl) -> Result<Value, String> {
    use serde_json::Value as Json;

    match value {
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) if kind == ValueTypeDecl::Float => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("{} is not a float", n)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .ok_or_else(|| format!("{} is out of range", n)),
        Json::String(s) => Ok(Value::Str(s)),
        Json::Array(items) => items
            .into_iter()
            .map(|item| json_value(item, kind))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => Err(format!("unsupported value {}", other)),
    }
}

impl RuleDecl {
    pub fn into_rule(self, index: usize) -> Result<MatchRule, RuleFileError> {
        let fail = |message: String| RuleFileError::Rule { index, message };
        let missing = |field: &str| fail(format!("`{}` is required for this kind", field));

        let rule = match self.kind {
            DeclKind::Literal => MatchRule::literal(self.text.ok_or_else(|| missing("text"))?),
            DeclKind::Union => MatchRule::union(self.alternatives),
            DeclKind::Param => {
                let rule = MatchRule::param(self.name.clone().ok_or_else(|| missing("name"))?);
                match self.pattern {
                    Some(pattern) => rule.pattern(pattern),
                    None => rule,
                }
            }
            DeclKind::Wildcard if self.greedy => MatchRule::wildcard().greedy(),
            DeclKind::Wildcard => MatchRule::wildcard(),
            DeclKind::Element => {
                MatchRule::element(self.element.ok_or_else(|| missing("element"))?)
            }
            DeclKind::Option => {
                let kind = self.value_type;
                let convert = |value| json_value(value, kind).map_err(fail);
                let action = match self.action {
                    ActionDecl::Store => Action::Store,
                    ActionDecl::StoreConst => {
                        let constant = self.constant.clone().ok_or_else(|| missing("const"))?;
                        Action::StoreConst(convert(constant)?)
                    }
                    ActionDecl::StoreTrue => Action::StoreTrue,
                    ActionDecl::StoreFalse => Action::StoreFalse,
                    ActionDecl::Append => Action::Append,
                    ActionDecl::Count => Action::Count,
                };
                let arity = match &self.nargs {
                    None => Arity::One,
                    Some(NargsDecl::Count(1)) => Arity::One,
                    Some(NargsDecl::Count(n)) => Arity::Exactly(*n),
                    Some(NargsDecl::Symbol(s)) => match s.as_str() {
                        "?" => Arity::Optional,
                        "*" => Arity::ZeroOrMore,
                        "+" => Arity::OneOrMore,
                        other => return Err(fail(format!("unknown nargs `{}`", other))),
                    },
                };
                let value_kind = match kind {
                    ValueTypeDecl::Str => ValueKind::Str,
                    ValueTypeDecl::Int => ValueKind::Int,
                    ValueTypeDecl::Float => ValueKind::Float,
                    ValueTypeDecl::Bool => ValueKind::Bool,
                    ValueTypeDecl::Element => ValueKind::Element,
                };

                let mut rule = MatchRule::option(self.flags.clone())
                    .action(action)
                    .arity(arity)
                    .value_kind(value_kind);
                if let Some(choices) = self.choices.clone() {
                    let choices = choices.into_iter().map(convert).collect::<Result<Vec<_>, _>>()?;
                    rule = rule.choices(choices);
                }
                if let Some(default) = self.default.clone() {
                    rule = rule.default(convert(default)?);
                }
                if self.action != ActionDecl::StoreConst {
                    if let Some(constant) = self.constant.clone() {
                        rule = rule.constant(convert(constant)?);
                    }
                }
                if let Some(regex) = self.regex.clone() {
                    rule = rule.regex(regex);
                }
                if self.required {
                    rule = rule.required();
                }
                rule
            }
        };

        let mut rule = match self.name {
            Some(name) => rule.named(name),
            None => rule,
        };
        if let Some(help) = self.help {
            rule = rule.help(help);
        }
        if self.optional {
            rule = rule.optional();
        }
        if self.kind != DeclKind::Option {
            rule = rule.space(self.space);
            if let Some(letters) = &self.regex_flags {
                let flags = PatternFlags::parse(letters)
                    .map_err(|c| fail(format!("unknown regex flag `{}`", c)))?;
                rule = rule.flags(flags);
            }
        }
        Ok(rule)
    }
}

/// Layers rule sources and builds a [`Twilight`] from the result.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Layer a rule file; the format follows the extension. Missing files are an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Layer a rule file that may be absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Layer an inline source.
    pub fn with_str(mut self, source: &str, format: FileFormat) -> Self {
        self.builder = self.builder.add_source(File::from_str(source, format));
        self
    }

    pub fn load(self) -> Result<RuleFile, RuleFileError> {
        Ok(self.builder.build()?.try_deserialize()?)
    }

    pub fn build(self) -> Result<Twilight, RuleFileError> {
        self.load()?.compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLL: &str = r#"
[[rules]]
kind = "literal"
text = ".roll"
space = "force"

[[rules]]
kind = "param"
name = "dice"
pattern = '\d+d\d+'

[[rules]]
kind = "option"
flags = ["--times", "-t"]
type = "int"
default = 1
choices = [1, 2, 3]
help = "how many rolls"

[[rules]]
kind = "option"
flags = ["-v", "--verbose"]
action = "store_true"
"#;

    #[test]
    fn test_load_toml() {
        let twilight = Loader::new().with_str(ROLL, FileFormat::Toml).build().unwrap();
        assert_eq!(
            twilight.names().collect::<Vec<_>>(),
            vec!["dice", "times", "verbose"]
        );

        let outcome = twilight.evaluate_str(".roll 2d6 -t 3");
        let sparkle = outcome.sparkle().unwrap();
        assert_eq!(sparkle.value("dice").and_then(Value::as_str), Some("2d6"));
        assert_eq!(sparkle.value("times"), Some(&Value::Int(3)));
        assert_eq!(sparkle.value("verbose"), Some(&Value::Bool(false)));

        let outcome = twilight.evaluate_str(".roll 2d6");
        assert_eq!(outcome.sparkle().unwrap().value("times"), Some(&Value::Int(1)));
        assert!(!twilight.evaluate_str(".roll2d6").is_match());
        assert!(!twilight.evaluate_str(".roll 2d6 -t 4").is_match());
    }

    #[test]
    fn test_load_json() {
        let source = r#"{"rules": [
            {"kind": "union", "alternatives": ["hi", "hello"], "regex_flags": "i"},
            {"kind": "wildcard", "name": "who"},
            {"kind": "option", "flags": ["--tag"], "action": "append", "nargs": "+"}
        ]}"#;
        let twilight = Loader::new().with_str(source, FileFormat::Json).build().unwrap();
        let outcome = twilight.evaluate_str("HELLO there --tag a b");
        let sparkle = outcome.sparkle().unwrap();
        assert_eq!(sparkle.value("who").and_then(Value::as_str), Some("there"));
        let tags = Value::List(vec![Value::List(vec![Value::from("a"), Value::from("b")])]);
        assert_eq!(sparkle.value("tag"), Some(&tags));
    }

    #[test]
    fn test_missing_field() {
        let source = "[[rules]]\nkind = \"literal\"\n";
        let err = Loader::new()
            .with_str(source, FileFormat::Toml)
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleFileError::Rule { index: 0, .. }));
    }

    #[test]
    fn test_spec_errors_surface() {
        let source = r#"
[[rules]]
kind = "param"
name = "x"

[[rules]]
kind = "param"
name = "x"
"#;
        let err = Loader::new()
            .with_str(source, FileFormat::Toml)
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleFileError::Spec(SpecError::DuplicateName(_))));
    }

    #[test]
    fn test_bad_regex_flag() {
        let source = r#"
[[rules]]
kind = "literal"
text = "a"
regex_flags = "q"
"#;
        let err = Loader::new()
            .with_str(source, FileFormat::Toml)
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleFileError::Rule { index: 0, .. }));
    }
}
