//! This module defines the runtime value model consumed by the converter. The main
//! enum, [`Value`], covers every JavaScript primitive (including `undefined`, bigints
//! and symbols) plus references to heap objects, which live in [`crate::object`].
//! Conversion traits are implemented for common Rust types so values can be built
//! from literals, arrays and vectors, and constructor helpers exist for each
//! built-in object kind. Equality follows strict equality (`===`) and `Display`
//! follows the JavaScript `String(value)` conversion, which is what error messages
//! embed.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use num_bigint::BigInt;
use url::Url;

use crate::Error;
use crate::object::{Boxed, Object, ObjectId, ObjectKind, ObjectRef, Prototype, TypedArray};

/// Type alias for number values (IEEE 754 double, like JavaScript numbers)
pub type NumberType = f64;

/// A runtime value
///
/// Primitives are stored inline; objects are shared references so that the same
/// object can appear several times in a structure, or inside itself.
///
/// To build values, use the `From` conversions and constructor helpers:
/// - `Value::from(42)`, `Value::from("text")`, `Value::from(true)`
/// - `Value::from([1, 2, 3])` or `Value::array(..)` for arrays
/// - `Value::object([("key", Value::from(1))])` for plain objects
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(NumberType),
    BigInt(BigInt),
    String(String),
    Symbol(Symbol),
    Object(ObjectRef),
}

impl Value {
    /// Plain object (`Object.prototype`) with the given enumerable properties
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::with_properties(Object::new(ObjectKind::Ordinary), entries)
    }

    /// Object created with `Object.create(null)`
    pub fn null_prototype_object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Object::with_prototype(ObjectKind::Ordinary, Prototype::Null);
        Self::with_properties(object, entries)
    }

    /// Instance of a user-defined (or otherwise unrecognized) class
    pub fn instance<K, I>(class: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Object::with_prototype(ObjectKind::Ordinary, Prototype::Class(class.into()));
        Self::with_properties(object, fields)
    }

    fn with_properties<K, I>(object: Object, entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let obj = ObjectRef::new(object);
        for (key, value) in entries {
            obj.set(key, value);
        }
        Value::Object(obj)
    }

    /// Dense array
    pub fn array<I: IntoIterator<Item = Value>>(elements: I) -> Self {
        Self::array_with_holes(elements.into_iter().map(Some))
    }

    /// Sparse array, `None` marks a hole
    pub fn array_with_holes<I: IntoIterator<Item = Option<Value>>>(elements: I) -> Self {
        Self::from_kind(ObjectKind::Array(elements.into_iter().collect()))
    }

    /// Boxed primitive, e.g. `new Number(1)`
    pub fn boxed(primitive: Boxed) -> Self {
        Self::from_kind(ObjectKind::Boxed(primitive))
    }

    /// Regular expression with its source pattern and flags
    pub fn regexp(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::from_kind(ObjectKind::RegExp {
            source: source.into(),
            flags: flags.into(),
        })
    }

    /// Date holding milliseconds since the Unix epoch (`NaN` for an invalid date)
    pub fn date(epoch_millis: NumberType) -> Self {
        Self::from_kind(ObjectKind::Date(epoch_millis))
    }

    /// Node.js `Buffer`
    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_kind(ObjectKind::Buffer(bytes.into()))
    }

    pub fn typed_array(array: TypedArray) -> Self {
        Self::from_kind(ObjectKind::TypedArray(array))
    }

    /// `Map`, keys are deduplicated with SameValueZero like `Map.prototype.set`
    pub fn map<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
        let obj = ObjectRef::new(Object::new(ObjectKind::Map(Vec::new())));
        for (key, value) in entries {
            obj.map_insert(key, value);
        }
        Value::Object(obj)
    }

    /// `Set`, members are deduplicated with SameValueZero like `Set.prototype.add`
    pub fn set<I: IntoIterator<Item = Value>>(members: I) -> Self {
        let obj = ObjectRef::new(Object::new(ObjectKind::Set(Vec::new())));
        for member in members {
            obj.set_add(member);
        }
        Value::Object(obj)
    }

    /// `URL` parsed from `href` the way `new URL(href)` parses it.
    ///
    /// Fails for input that `new URL` would reject, so every URL value can be
    /// rebuilt from its href.
    pub fn url(href: &str) -> Result<Self, Error> {
        let url = Url::parse(href).map_err(|e| Error::InvalidUrl(format!("{href}: {e}")))?;
        Ok(Self::from_kind(ObjectKind::Url(url)))
    }

    /// `URLSearchParams` holding decoded name/value pairs
    pub fn url_search_params<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_kind(ObjectKind::UrlSearchParams(pairs))
    }

    /// Function object, only its name is modeled
    pub fn function(name: impl Into<String>) -> Self {
        Self::from_kind(ObjectKind::Function { name: name.into() })
    }

    fn from_kind(kind: ObjectKind) -> Self {
        Value::Object(ObjectRef::new(Object::new(kind)))
    }

    /// The object reference, if this value is an object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// `undefined` or `null`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Write the JavaScript `String(value)` form.
    ///
    /// `joining` holds the arrays currently being joined; an array met again while
    /// it is being joined contributes nothing, like `Array.prototype.join`.
    pub(crate) fn write_js_string(
        &self,
        f: &mut fmt::Formatter<'_>,
        joining: &mut Vec<ObjectId>,
    ) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", number_to_js_string(*n)),
            Value::BigInt(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Symbol(sym) => write!(f, "{sym}"),
            Value::Object(obj) => obj.write_js_string(f, joining),
        }
    }
}

/// Format a number the way `Number.prototype.toString()` does
pub(crate) fn number_to_js_string(n: NumberType) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{n}");
    }
    // Rust writes `1e21` and `1e-7`; JavaScript always signs the exponent.
    let exponential = format!("{n:e}");
    match exponential.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exponential,
    }
}

/// SameValueZero, the key equality used by `Map` and `Set`
pub(crate) fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a == b,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::BigInt(b) => write!(f, "BigInt({b})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Symbol(sym) => write!(f, "{sym:?}"),
            // Objects may be cyclic, so only their identity and kind are shown
            Value::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_js_string(f, &mut Vec::new())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // IEEE comparison: NaN !== NaN and 0 === -0
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false, // Different kinds are never strictly equal
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_number {
    ($num_type:ty) => {
        impl From<$num_type> for Value {
            fn from(n: $num_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

// Exact conversions into f64
impl_from_number!(i8);
impl_from_number!(i16);
impl_from_number!(i32);
impl_from_number!(u8);
impl_from_number!(u16);
impl_from_number!(u32);
impl_from_number!(f32);
impl_from_number!(NumberType);

macro_rules! impl_from_wide_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            // Rounds to the nearest double, like `Number(x)` past 2^53
            fn from(n: $int_type) -> Self {
                Value::Number(n as NumberType)
            }
        }
    };
}

impl_from_wide_integer!(i64);
impl_from_wide_integer!(u64);
impl_from_wide_integer!(isize);
impl_from_wide_integer!(usize);

impl From<BigInt> for Value {
    fn from(b: BigInt) -> Self {
        Value::BigInt(b)
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<Boxed> for Value {
    fn from(primitive: Boxed) -> Self {
        Value::boxed(primitive)
    }
}

impl From<TypedArray> for Value {
    fn from(array: TypedArray) -> Self {
        Value::typed_array(array)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::array(v.into_iter().map(Into::into))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::array(arr.into_iter().map(Into::into))
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::array(iter.into_iter().map(Into::into))
    }
}

/// Global symbol registry backing `Symbol.for` and `Symbol.keyFor`
static SYMBOL_REGISTRY: LazyLock<Mutex<HashMap<String, Symbol>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn registry() -> MutexGuard<'static, HashMap<String, Symbol>> {
    // The map stays consistent even if a holder panicked
    SYMBOL_REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// A symbol; every symbol is unique and compares by identity
#[derive(Clone)]
pub struct Symbol(Arc<SymbolData>);

struct SymbolData {
    description: Option<String>,
}

impl Symbol {
    /// A fresh local symbol, `Symbol(description)`
    pub fn new(description: Option<&str>) -> Self {
        Symbol(Arc::new(SymbolData {
            description: description.map(str::to_owned),
        }))
    }

    /// The registry symbol for `key`, created on first use, `Symbol.for(key)`
    pub fn for_key(key: &str) -> Self {
        registry()
            .entry(key.to_owned())
            .or_insert_with(|| Symbol::new(Some(key)))
            .clone()
    }

    /// The registry key of this symbol, `Symbol.keyFor(symbol)`.
    ///
    /// Only reads the registry: a local symbol stays unregistered.
    pub fn key_for(&self) -> Option<String> {
        let description = self.description()?;
        registry()
            .get(description)
            .filter(|registered| *registered == self)
            .map(|_| description.to_owned())
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or_default())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(description) => write!(f, "Symbol({description:?})"),
            None => write!(f, "Symbol()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_forms() {
        let cases = vec![
            (Value::Undefined, "undefined"),
            (Value::Null, "null"),
            (Value::from(true), "true"),
            (Value::from(42), "42"),
            (Value::from(-1.5), "-1.5"),
            (Value::from(-0.0), "0"),
            (Value::from(0.1 + 0.2), "0.30000000000000004"),
            (Value::from(1e21), "1e+21"),
            (Value::from(1.5e-7), "1.5e-7"),
            (Value::from(123_456_789_012_345_680_000.0), "123456789012345680000"),
            (Value::from(f64::NAN), "NaN"),
            (Value::from(f64::NEG_INFINITY), "-Infinity"),
            (Value::from(BigInt::from(-12)), "-12"),
            (Value::from("plain"), "plain"),
            (Value::from(Symbol::new(Some("tag"))), "Symbol(tag)"),
            (Value::from(Symbol::new(None)), "Symbol()"),
            (Value::from([1, 2, 3]), "1,2,3"),
            (
                Value::array_with_holes([Some(Value::from(1)), None, Some(Value::Null)]),
                "1,,",
            ),
            (Value::object([("a", Value::from(1))]), "[object Object]"),
            (Value::instance("Point", [("x", Value::from(1))]), "[object Object]"),
            (Value::boxed(Boxed::String("boxed".into())), "boxed"),
            (Value::regexp("a+b", "gi"), "/a+b/gi"),
            (Value::date(0.0), "Thu Jan 01 1970 00:00:00 GMT+0000 (Coordinated Universal Time)"),
            (Value::date(f64::NAN), "Invalid Date"),
            (Value::buffer(b"hi".to_vec()), "hi"),
            (Value::typed_array(TypedArray::Int8(vec![-1, 2])), "-1,2"),
            (Value::map([(Value::from(1), Value::from(2))]), "[object Map]"),
            (Value::set([Value::from(1)]), "[object Set]"),
            (Value::url("HTTPS://Example.COM").expect("valid href"), "https://example.com/"),
            (
                Value::url_search_params([("q", "a b"), ("x", "1&2")]),
                "q=a+b&x=1%262",
            ),
            (Value::function("handler"), "function handler() { [native code] }"),
        ];

        for (i, (value, expected)) in cases.iter().enumerate() {
            assert_eq!(
                value.to_string(),
                *expected,
                "Test case {} failed for {:?}",
                i + 1,
                value
            );
        }
    }

    #[test]
    fn test_cyclic_array_join() {
        let arr = ObjectRef::array();
        arr.push(1);
        arr.push(arr.clone());
        arr.push(3);
        assert_eq!(Value::from(arr).to_string(), "1,,3");
    }

    #[test]
    fn test_strict_equality() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_eq!(Value::from(0.0), Value::from(-0.0));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_ne!(Value::from(1), Value::from("1"));
        assert_ne!(Value::Undefined, Value::Null);

        // Objects compare by identity, not structure
        let a = Value::from([1]);
        assert_eq!(a, a.clone());
        assert_ne!(a, Value::from([1]));

        assert!(same_value_zero(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(same_value_zero(&Value::from(0.0), &Value::from(-0.0)));
    }

    #[test]
    fn test_symbol_registry() {
        let registered = Symbol::for_key("value_tests.registered");
        assert_eq!(registered, Symbol::for_key("value_tests.registered"));
        assert_eq!(
            registered.key_for().as_deref(),
            Some("value_tests.registered")
        );

        let local = Symbol::new(Some("value_tests.local"));
        assert_ne!(local, Symbol::new(Some("value_tests.local")));
        assert_eq!(local.key_for(), None);
        // Looking up a local symbol must not register its description
        assert!(!registry().contains_key("value_tests.local"));

        // Same description as a registry symbol is still not that symbol
        let shadow = Symbol::new(Some("value_tests.registered"));
        assert_eq!(shadow.key_for(), None);

        assert_eq!(Symbol::new(None).key_for(), None);
        assert_eq!(Symbol::for_key("").key_for().as_deref(), Some(""));
    }

    #[test]
    fn test_from_conversions() {
        assert!(matches!(Value::from(7u8), Value::Number(n) if n == 7.0));
        assert!(matches!(Value::from(i64::MAX), Value::Number(n) if n == 9_223_372_036_854_775_807.0));
        assert!(matches!(Value::from(String::from("s")), Value::String(s) if s == "s"));

        let collected: Value = (1..=3).collect();
        let obj = collected.as_object().expect("collect builds an array");
        assert!(matches!(obj.borrow().kind(), ObjectKind::Array(items) if items.len() == 3));
    }
}
