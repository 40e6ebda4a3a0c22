// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{functions::FunctionContext, value::Value};

/// The comparable key extracted from a set member.
///
/// Keys are typed: an integer key never matches a string key, even when
/// their renderings coincide. Equality between floats is bitwise.
#[derive(Clone, Debug)]
pub enum Key {
    /// Integer key
    Int(i64),

    /// Float key
    Float(f64),

    /// String key
    Str(String),
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Int(x) => {
                state.write_u8(0);
                x.hash(state);
            }
            Self::Float(x) => {
                state.write_u8(1);
                x.to_bits().hash(state);
            }
            Self::Str(s) => {
                state.write_u8(2);
                s.hash(state);
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{x}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl Key {
    /// Byte rendering fed to the bucket hash.
    pub(crate) fn bytes(&self) -> Vec<u8> {
        match self {
            Self::Int(x) => x.to_string().into_bytes(),
            Self::Float(x) => format!("{x:?}").into_bytes(),
            Self::Str(s) => s.clone().into_bytes(),
        }
    }
}

/// Produces the comparable key for a user value.
///
/// Scalars are their own key. Structured values go through the registered
/// key-extraction function if there is one, else through the canonical
/// string rendering.
pub(crate) fn extract(value: &Value, fx: &FunctionContext) -> crate::Result<Key> {
    match value {
        Value::Integer(x) => Ok(Key::Int(*x)),
        Value::Float(x) => Ok(Key::Float(*x)),
        Value::String(s) => Ok(Key::Str(s.clone())),
        _ => match fx.key_fn {
            Some(f) => match f(value)? {
                Value::Integer(x) => Ok(Key::Int(x)),
                Value::Float(x) => Ok(Key::Float(x)),
                Value::String(s) => Ok(Key::Str(s)),
                other => Ok(Key::Str(other.canonical())),
            },
            None => Ok(Key::Str(value.canonical())),
        },
    }
}
