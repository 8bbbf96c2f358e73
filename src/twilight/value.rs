//! Values produced by a match
//!
//! Positional captures resolve to elements, flag-style options resolve to typed
//! scalars; both are carried by [`Value`] so a result set has a single value type.

use super::element::Element;
use super::normalize::{is_reserved, Normalized};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Element(Element),
    /// A capture mixing text and opaque elements, in order.
    Chain(Vec<Element>),
    List(Vec<Value>),
}

impl Value {
    /// Build the value for a captured run of elements.
    pub fn from_elements(mut elements: Vec<Element>) -> Self {
        match elements.len() {
            0 => Value::Element(Element::Text(String::new())),
            1 => Value::Element(elements.remove(0)),
            _ => Value::Chain(elements),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text content of a `Str` or of a text element.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Element(Element::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Value::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// The value as an element sequence, when it came from message content.
    pub fn to_elements(&self) -> Option<Vec<Element>> {
        match self {
            Value::Element(element) => Some(vec![element.clone()]),
            Value::Chain(elements) => Some(elements.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Element(element) => write!(f, "{}", element),
            Value::Chain(elements) => {
                for element in elements {
                    write!(f, "{}", element)?;
                }
                Ok(())
            }
            Value::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Element> for Value {
    fn from(element: Element) -> Self {
        Value::Element(element)
    }
}

/// User supplied conversion from a raw argument token to a [`Value`].
pub type Converter = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// How an option's argument token is converted.
#[derive(Clone, Default)]
pub enum ValueKind {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    /// Keep message content, opaque elements included.
    Element,
    /// Receives the token as it appears in the mapping string.
    Custom(Converter),
}

impl fmt::Debug for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Str => write!(f, "Str"),
            ValueKind::Int => write!(f, "Int"),
            ValueKind::Float => write!(f, "Float"),
            ValueKind::Bool => write!(f, "Bool"),
            ValueKind::Element => write!(f, "Element"),
            ValueKind::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl ValueKind {
    pub fn custom<F>(convert: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        ValueKind::Custom(Arc::new(convert))
    }

    pub fn convert(&self, token: &str, normalized: &Normalized) -> Result<Value, String> {
        let has_element = token.chars().any(is_reserved);
        match self {
            ValueKind::Element => Ok(Value::from_elements(normalized.rehydrate(token))),
            ValueKind::Custom(convert) => convert(token),
            _ if has_element => Err("expected text, found a non-text element".to_string()),
            ValueKind::Str => Ok(Value::Str(token.to_string())),
            ValueKind::Int => token
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("invalid integer {:?}: {}", token, e)),
            ValueKind::Float => token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("invalid float {:?}: {}", token, e)),
            ValueKind::Bool => parse_bool(token)
                .map(Value::Bool)
                .ok_or_else(|| format!("invalid boolean {:?}", token)),
        }
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
