// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::collections::BTreeMap;

/// A dynamically typed user value.
///
/// Everything the engine touches is a `Value` tree: set members, bin
/// contents, the persisted control descriptor and sub-record segments.
/// Keeping one shape for all of them means the descriptor that reaches the
/// host is exactly the structure that gets stored.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Signed integer
    Integer(i64),

    /// Floating point number
    Float(f64),

    /// Boolean
    Boolean(bool),

    /// UTF-8 string
    String(String),

    /// Ordered list of values
    List(Vec<Value>),

    /// String-keyed map
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` if the value is a scalar (number or string).
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Integer(_) | Self::Float(_) | Self::String(_)
        )
    }

    /// Returns the integer content, if the value is an integer.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the string content, if the value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list content, if the value is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map content, if the value is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Short type name, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Deterministic string rendering.
    ///
    /// Used as the fallback comparable key for structured values that have
    /// no registered key-extraction function, so two structurally equal
    /// values must always render identically (map entries render in key
    /// order).
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }

    fn render(&self, out: &mut String) {
        use std::fmt::Write;

        match self {
            Self::Integer(x) => {
                let _ = write!(out, "{x}");
            }
            Self::Float(x) => {
                let _ = write!(out, "{x:?}");
            }
            Self::Boolean(b) => {
                let _ = write!(out, "{b}");
            }
            Self::String(s) => {
                let _ = write!(out, "{s:?}");
            }
            Self::List(items) => {
                out.push('[');

                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    item.render(out);
                }

                out.push(']');
            }
            Self::Map(entries) => {
                out.push('{');

                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{key}:");
                    value.render(out);
                }

                out.push('}');
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self::Map(value)
    }
}
