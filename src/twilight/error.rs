//! Error types
//!
//! Two classes exist. [`SpecError`] is raised while compiling a rule list and
//! prevents a [`Twilight`](super::Twilight) from being built. [`NoMatchReason`]
//! explains why one evaluation did not match; it travels inside an ordinary
//! return value and is only informative.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("duplicate rule name `{0}`")]
    DuplicateName(String),

    #[error("flag `{flag}` is declared by both `{first}` and `{second}`")]
    ConflictingFlag {
        flag: String,
        first: String,
        second: String,
    },

    #[error("invalid flag spelling `{flag}` in rule `{rule}`: {reason}")]
    InvalidFlag {
        rule: String,
        flag: String,
        reason: &'static str,
    },

    #[error("malformed pattern in rule `{rule}`")]
    MalformedPattern {
        rule: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("rule #{0} is an empty literal")]
    EmptyLiteral(usize),

    #[error("rule #{0} is a union without alternatives")]
    EmptyUnion(usize),

    #[error("rule #{0} contains a reserved placeholder character")]
    ReservedCharacter(usize),

    #[error("invalid default for option `{rule}`: {reason}")]
    InvalidDefault { rule: String, reason: String },

    #[error("composite pattern failed to compile")]
    CompositePattern(#[source] Box<regex::Error>),
}

/// Why an evaluation produced no match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoMatchReason {
    #[error("positional pattern did not match")]
    Positional,

    #[error("a capture split a non-text element")]
    SplitPlaceholder,

    #[error("could not tokenize arguments: {0}")]
    Tokenize(String),

    #[error("unknown flag `{0}`")]
    UnknownFlag(String),

    #[error("unexpected argument `{0}`")]
    UnexpectedToken(String),

    #[error("flag `{0}` is missing its argument")]
    MissingValue(String),

    #[error("flag `{flag}`: {message}")]
    Conversion { flag: String, message: String },

    #[error("flag `{flag}`: `{value}` is not one of the allowed choices")]
    Choice { flag: String, value: String },

    #[error("required flag `{0}` is absent")]
    MissingRequired(String),
}
