//! Main module for twilight matching functionality
//!
//! Setup compiles a rule list into a [`Twilight`] once; each incoming message is
//! then evaluated against it, producing either a [`Sparkle`] or a no-match.

pub mod argparse;
pub mod compile;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod rule;
pub mod sparkle;
pub mod value;

pub use compile::Twilight;
pub use element::{Element, Opaque};
pub use engine::Outcome;
pub use error::{NoMatchReason, SpecError};
pub use rule::{Action, Arity, MatchRule, PatternFlags, SpacePolicy};
pub use sparkle::{MatchResult, ResultKind, Sparkle};
pub use value::{Value, ValueKind};
