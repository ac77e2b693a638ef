//! value-to-estree - turn runtime values into ESTree expressions
//!
//! This crate converts a value into an [ESTree](https://github.com/estree/estree)
//! expression node which, once handed to any ESTree code generator, produces
//! source text that evaluates back to an equivalent value.
//!
//! ```
//! use value_to_estree::convert::{Options, value_to_estree};
//! use value_to_estree::estree::Expression;
//! use value_to_estree::value::Value;
//!
//! let value = Value::object([("answer", Value::from(42)), ("ok", Value::from(true))]);
//! let node = value_to_estree(&value, &Options::default()).unwrap();
//! assert!(matches!(node, Expression::ObjectExpression(_)));
//! ```
//!
//! ## Value Model
//!
//! Rust has no ambient JavaScript heap, so the crate carries its own model of
//! runtime values in [`value`] and [`object`]: primitives (including `undefined`,
//! bigints and symbols) plus reference-counted objects with identity. Identity is
//! what makes shared and cyclic structures observable to the converter.
//!
//! ## Output Shape
//!
//! Every value kind maps to one fixed node shape:
//!
//! ```text
//! undefined / Infinity / NaN      Identifier
//! null, bool, number, string      Literal
//! -5, -5n                         UnaryExpression("-", Literal)
//! Symbol.for("k")                 CallExpression(Symbol.for, ["k"])
//! [1, , 3]                        ArrayExpression (holes are null)
//! new Number(1), new Date(0)      NewExpression
//! Buffer                          CallExpression(Buffer.from, [[...bytes]])
//! {a: 1}                          ObjectExpression
//! ```
//!
//! ## Modules
//!
//! - `value`: runtime values, symbols and the global symbol registry
//! - `object`: heap objects, object kinds and plain-object detection
//! - `estree`: the ESTree node types emitted by the converter
//! - `convert`: the converter and its options
//! - `json`: JSON text to values, and ESTree nodes to JSON (feature `json`)

use std::fmt;

/// Error types for the converter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The value has no ESTree representation and no opt-in applied
    UnsupportedValue { message: String, cause: Value },
    /// An object was reached again while it was still being converted
    CircularReference { message: String, cause: Value },
    /// Nesting exceeded the configured `max_depth`
    TooDeeplyNested { limit: usize },
    /// Raised by a user supplied fallback
    Fallback(String),
    /// Input to the JSON bridge was not valid JSON
    InvalidJson(String),
    /// `Value::url` was given an href that `new URL` rejects
    InvalidUrl(String),
}

impl Error {
    /// Create an UnsupportedValue error whose message embeds the value's string form
    pub fn unsupported(value: &Value) -> Self {
        Error::UnsupportedValue {
            message: format!("Unsupported value: {value}"),
            cause: value.clone(),
        }
    }

    /// Create an UnsupportedValue error for a symbol outside the global registry
    pub(crate) fn unsupported_symbol(value: &Value) -> Self {
        Error::UnsupportedValue {
            message: format!("Only global symbols are supported, got: {value}"),
            cause: value.clone(),
        }
    }

    /// Create a CircularReference error for an object that contains itself
    pub(crate) fn circular(value: &Value) -> Self {
        Error::CircularReference {
            message: format!("Found circular reference: {value}"),
            cause: value.clone(),
        }
    }

    /// The value that triggered the error, if the error carries one
    pub fn cause(&self) -> Option<&Value> {
        match self {
            Error::UnsupportedValue { cause, .. } | Error::CircularReference { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedValue { message, .. } => write!(f, "TypeError: {message}"),
            Error::CircularReference { message, .. } => write!(f, "Error: {message}"),
            Error::TooDeeplyNested { limit } => {
                write!(f, "Value too deeply nested (max depth: {limit})")
            }
            Error::Fallback(msg) => write!(f, "Fallback error: {msg}"),
            Error::InvalidJson(msg) => write!(f, "Invalid JSON: {msg}"),
            Error::InvalidUrl(msg) => write!(f, "TypeError: Invalid URL: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub mod convert;
pub mod estree;
pub mod object;
pub mod value;

#[cfg(feature = "json")]
pub mod json;

pub use convert::{Options, value_to_estree};
pub use estree::Expression;
pub use value::Value;
