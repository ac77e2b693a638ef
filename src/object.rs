//! Heap objects referenced from [`Value::Object`].
//!
//! An [`Object`] pairs a built-in [`ObjectKind`] (which carries the kind's
//! internal data, such as array elements or map entries) with a [`Prototype`]
//! and an ordered list of own string-keyed properties. Objects are shared
//! through [`ObjectRef`], whose pointer identity stands in for JavaScript
//! object identity.
//!
//! Cyclic structures built from `ObjectRef`s are reference cycles and are never
//! freed; break the cycle (e.g. with [`ObjectRef::set`]) to release them.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use chrono::DateTime;
use num_bigint::BigInt;
use url::Url;

use crate::value::{NumberType, Value, same_value_zero};

/// Identity of an object, stable while the object is alive
pub type ObjectId = usize;

/// Largest time value a `Date` can hold, in milliseconds either side of the epoch
const MAX_DATE_MILLIS: NumberType = 8.64e15;

/// The `[[Prototype]]` of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prototype {
    /// `Object.prototype`, the prototype of object literals
    Object,
    /// No prototype at all, `Object.create(null)`
    Null,
    /// The `prototype` of the named constructor
    Class(String),
}

/// Primitive wrapped by `new Boolean(..)`, `new Number(..)` or `new String(..)`
#[derive(Debug, Clone, PartialEq)]
pub enum Boxed {
    Boolean(bool),
    Number(NumberType),
    String(String),
}

impl Boxed {
    pub fn constructor_name(&self) -> &'static str {
        match self {
            Boxed::Boolean(_) => "Boolean",
            Boxed::Number(_) => "Number",
            Boxed::String(_) => "String",
        }
    }

    /// The wrapped primitive, `valueOf()`
    pub fn primitive(&self) -> Value {
        match self {
            Boxed::Boolean(b) => Value::Bool(*b),
            Boxed::Number(n) => Value::Number(*n),
            Boxed::String(s) => Value::String(s.clone()),
        }
    }
}

/// Typed numeric arrays and their element storage
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Uint8Clamped(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    BigInt64(Vec<i64>),
    BigUint64(Vec<u64>),
}

impl TypedArray {
    pub fn constructor_name(&self) -> &'static str {
        match self {
            TypedArray::Int8(_) => "Int8Array",
            TypedArray::Uint8(_) => "Uint8Array",
            TypedArray::Uint8Clamped(_) => "Uint8ClampedArray",
            TypedArray::Int16(_) => "Int16Array",
            TypedArray::Uint16(_) => "Uint16Array",
            TypedArray::Int32(_) => "Int32Array",
            TypedArray::Uint32(_) => "Uint32Array",
            TypedArray::Float32(_) => "Float32Array",
            TypedArray::Float64(_) => "Float64Array",
            TypedArray::BigInt64(_) => "BigInt64Array",
            TypedArray::BigUint64(_) => "BigUint64Array",
        }
    }

    /// Elements in iteration order, as the values iterating the array yields
    pub fn values(&self) -> Vec<Value> {
        fn numbers<T: Copy + Into<NumberType>>(items: &[T]) -> Vec<Value> {
            items.iter().map(|&n| Value::Number(n.into())).collect()
        }
        fn bigints<T: Copy + Into<BigInt>>(items: &[T]) -> Vec<Value> {
            items.iter().map(|&n| Value::BigInt(n.into())).collect()
        }

        match self {
            TypedArray::Int8(items) => numbers(items),
            TypedArray::Uint8(items) | TypedArray::Uint8Clamped(items) => numbers(items),
            TypedArray::Int16(items) => numbers(items),
            TypedArray::Uint16(items) => numbers(items),
            TypedArray::Int32(items) => numbers(items),
            TypedArray::Uint32(items) => numbers(items),
            TypedArray::Float32(items) => numbers(items),
            TypedArray::Float64(items) => numbers(items),
            TypedArray::BigInt64(items) => bigints(items),
            TypedArray::BigUint64(items) => bigints(items),
        }
    }
}

/// Built-in kind of an object together with its internal slots
#[derive(Debug, Clone)]
pub enum ObjectKind {
    /// Object with no internal slots: object literals, class instances, errors...
    Ordinary,
    /// Array elements, `None` is a hole
    Array(Vec<Option<Value>>),
    Boxed(Boxed),
    RegExp {
        source: String,
        flags: String,
    },
    /// Time value in milliseconds since the epoch
    Date(NumberType),
    Buffer(Vec<u8>),
    TypedArray(TypedArray),
    /// Entries in insertion order, keys unique under SameValueZero
    Map(Vec<(Value, Value)>),
    /// Members in insertion order, unique under SameValueZero
    Set(Vec<Value>),
    /// Parsed URL, serialized by its href
    Url(Url),
    /// Decoded name/value pairs
    UrlSearchParams(Vec<(String, String)>),
    Function {
        name: String,
    },
}

impl ObjectKind {
    /// Name of the constructor whose instances have this kind
    pub fn constructor_name(&self) -> &'static str {
        match self {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Boxed(primitive) => primitive.constructor_name(),
            ObjectKind::RegExp { .. } => "RegExp",
            ObjectKind::Date(_) => "Date",
            ObjectKind::Buffer(_) => "Buffer",
            ObjectKind::TypedArray(array) => array.constructor_name(),
            ObjectKind::Map(_) => "Map",
            ObjectKind::Set(_) => "Set",
            ObjectKind::Url(_) => "URL",
            ObjectKind::UrlSearchParams(_) => "URLSearchParams",
            ObjectKind::Function { .. } => "Function",
        }
    }
}

/// An own property
#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    pub enumerable: bool,
}

/// A heap object
#[derive(Debug)]
pub struct Object {
    kind: ObjectKind,
    prototype: Prototype,
    /// Own string-keyed properties in insertion order
    properties: Vec<(String, Property)>,
}

impl Object {
    /// New object with the prototype its kind's constructor would give it
    pub fn new(kind: ObjectKind) -> Self {
        let prototype = match kind {
            ObjectKind::Ordinary => Prototype::Object,
            ref other => Prototype::Class(other.constructor_name().to_owned()),
        };
        Self::with_prototype(kind, prototype)
    }

    pub fn with_prototype(kind: ObjectKind, prototype: Prototype) -> Self {
        Object {
            kind,
            prototype,
            properties: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn prototype(&self) -> &Prototype {
        &self.prototype
    }

    /// Whether this is a plain data record: an ordinary object whose prototype is
    /// `Object.prototype` or `null`. Class instances and every built-in kind are
    /// not plain.
    pub fn is_plain(&self) -> bool {
        matches!(self.kind, ObjectKind::Ordinary)
            && matches!(self.prototype, Prototype::Object | Prototype::Null)
    }

    /// The value of an own property, enumerable or not
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, property)| &property.value)
    }

    /// Own enumerable string-keyed properties in `Object.entries` order:
    /// array-index keys in ascending numeric order first, then the remaining
    /// keys in insertion order.
    pub fn own_enumerable_entries(&self) -> Vec<(String, Value)> {
        let enumerable = self
            .properties
            .iter()
            .filter(|(_, property)| property.enumerable);

        let mut indices: Vec<(u32, &String, &Property)> = Vec::new();
        let mut named: Vec<(&String, &Property)> = Vec::new();
        for (key, property) in enumerable {
            match array_index(key) {
                Some(index) => indices.push((index, key, property)),
                None => named.push((key, property)),
            }
        }
        indices.sort_by_key(|(index, _, _)| *index);

        indices
            .into_iter()
            .map(|(_, key, property)| (key, property))
            .chain(named)
            .map(|(key, property)| (key.clone(), property.value.clone()))
            .collect()
    }

    fn define(&mut self, key: String, value: Value, enumerable: bool) {
        match self.properties.iter_mut().find(|(name, _)| *name == key) {
            // Redefining keeps the original position, like assignment does
            Some((_, property)) => {
                property.value = value;
                property.enumerable = enumerable;
            }
            None => self
                .properties
                .push((key, Property { value, enumerable })),
        }
    }
}

/// Parse a canonical array index: `"0"`, `"17"`, but not `"01"` or `"-1"`.
/// The largest index is `2^32 - 2`.
fn array_index(key: &str) -> Option<u32> {
    let index: u32 = key.parse().ok()?;
    (index != u32::MAX && index.to_string() == key).then_some(index)
}

/// Shared handle to an [`Object`]; clones refer to the same object
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        ObjectRef(Rc::new(RefCell::new(object)))
    }

    /// Empty plain object, `{}`
    pub fn plain() -> Self {
        Self::new(Object::new(ObjectKind::Ordinary))
    }

    /// Empty array, `[]`
    pub fn array() -> Self {
        Self::new(Object::new(ObjectKind::Array(Vec::new())))
    }

    /// Identity of the referenced object
    pub fn id(&self) -> ObjectId {
        Rc::as_ptr(&self.0).cast::<()>() as ObjectId
    }

    /// Whether both handles refer to the same object
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Immutable access to the object.
    ///
    /// # Panics
    /// If the object is being mutated through this handle at the same time.
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    /// Define or overwrite an enumerable own property
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().define(key.into(), value.into(), true);
    }

    /// Define or overwrite a non-enumerable own property
    pub fn set_hidden(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().define(key.into(), value.into(), false);
    }

    /// Append an element. Returns false (and does nothing) unless this is an array.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        match &mut self.0.borrow_mut().kind {
            ObjectKind::Array(elements) => {
                elements.push(Some(value.into()));
                true
            }
            _ => false,
        }
    }

    /// Store an element at `index`, leaving holes in any gap that opens up.
    /// Returns false (and does nothing) unless this is an array.
    pub fn set_element(&self, index: usize, value: impl Into<Value>) -> bool {
        match &mut self.0.borrow_mut().kind {
            ObjectKind::Array(elements) => {
                if index >= elements.len() {
                    elements.resize(index + 1, None);
                }
                elements[index] = Some(value.into());
                true
            }
            _ => false,
        }
    }

    /// `Map.prototype.set`. Returns false (and does nothing) unless this is a map.
    pub fn map_insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> bool {
        let (key, value) = (key.into(), value.into());
        match &mut self.0.borrow_mut().kind {
            ObjectKind::Map(entries) => {
                match entries.iter_mut().find(|(k, _)| same_value_zero(k, &key)) {
                    Some((_, existing)) => *existing = value,
                    // -0 is normalized to +0 when it becomes a key
                    None => entries.push((normalize_zero(key), value)),
                }
                true
            }
            _ => false,
        }
    }

    /// `Set.prototype.add`. Returns false (and does nothing) unless this is a set.
    pub fn set_add(&self, member: impl Into<Value>) -> bool {
        let member = member.into();
        match &mut self.0.borrow_mut().kind {
            ObjectKind::Set(members) => {
                if !members.iter().any(|m| same_value_zero(m, &member)) {
                    members.push(normalize_zero(member));
                }
                true
            }
            _ => false,
        }
    }

    pub(crate) fn write_js_string(
        &self,
        f: &mut fmt::Formatter<'_>,
        joining: &mut Vec<ObjectId>,
    ) -> fmt::Result {
        let object = self.borrow();
        match &object.kind {
            ObjectKind::Ordinary => write!(f, "[object Object]"),
            ObjectKind::Array(elements) => {
                let id = self.id();
                if joining.contains(&id) {
                    return Ok(());
                }
                joining.push(id);
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    match element {
                        Some(value) if !value.is_nullish() => value.write_js_string(f, joining)?,
                        _ => {}
                    }
                }
                joining.pop();
                Ok(())
            }
            ObjectKind::Boxed(primitive) => primitive.primitive().write_js_string(f, joining),
            ObjectKind::RegExp { source, flags } => write!(f, "/{source}/{flags}"),
            ObjectKind::Date(millis) => write!(f, "{}", date_to_js_string(*millis)),
            ObjectKind::Buffer(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            ObjectKind::TypedArray(array) => {
                let parts: Vec<String> = array.values().iter().map(Value::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
            ObjectKind::Map(_) => write!(f, "[object Map]"),
            ObjectKind::Set(_) => write!(f, "[object Set]"),
            ObjectKind::Url(url) => write!(f, "{url}"),
            ObjectKind::UrlSearchParams(pairs) => write!(f, "{}", form_urlencode(pairs)),
            ObjectKind::Function { name } => {
                write!(f, "function {name}() {{ [native code] }}")
            }
        }
    }
}

fn normalize_zero(value: Value) -> Value {
    match value {
        Value::Number(n) if n == 0.0 => Value::Number(0.0),
        other => other,
    }
}

/// `Date.prototype.toString()` in UTC
fn date_to_js_string(millis: NumberType) -> String {
    if !millis.is_finite() || millis.abs() > MAX_DATE_MILLIS {
        return "Invalid Date".to_owned();
    }
    // Time values are integral; within MAX_DATE_MILLIS the cast is exact
    let whole_millis = millis.trunc() as i64;
    match DateTime::from_timestamp_millis(whole_millis) {
        Some(date) => date
            .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
            .to_string(),
        None => "Invalid Date".to_owned(),
    }
}

/// `application/x-www-form-urlencoded` serialization, as `URLSearchParams.toString()`
pub(crate) fn form_urlencode(pairs: &[(String, String)]) -> String {
    fn encode(text: &str, out: &mut String) {
        for byte in text.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' => {
                    out.push(char::from(byte));
                }
                b' ' => out.push('+'),
                _ => out.push_str(&format!("%{byte:02X}")),
            }
        }
    }

    let mut out = String::new();
    for (i, (name, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        encode(name, &mut out);
        out.push('=');
        encode(value, &mut out);
    }
    out
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: objects may contain themselves
        match self.0.try_borrow() {
            Ok(object) => write!(f, "Object({}@{:#x})", object.kind.constructor_name(), self.id()),
            Err(_) => write!(f, "Object(<borrowed>@{:#x})", self.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object_detection() {
        let cases = vec![
            (Value::object([("a", Value::from(1))]), true),
            (Value::null_prototype_object([("a", Value::from(1))]), true),
            (Value::instance("Point", [("x", Value::from(1))]), false),
            (Value::instance("Error", Vec::<(&str, Value)>::new()), false),
            (Value::from([1, 2]), false),
            (Value::map(Vec::new()), false),
            (Value::date(0.0), false),
            (Value::function("f"), false),
        ];

        for (i, (value, expected)) in cases.iter().enumerate() {
            let obj = value.as_object().expect("test values are objects");
            assert_eq!(
                obj.borrow().is_plain(),
                *expected,
                "Test case {} failed for {:?}",
                i + 1,
                value
            );
        }
    }

    #[test]
    fn test_enumeration_order() {
        let obj = ObjectRef::plain();
        obj.set("b", 1);
        obj.set("10", 2);
        obj.set("a", 3);
        obj.set("2", 4);
        obj.set("01", 5);
        obj.set("-1", 6);
        obj.set("4294967295", 7);
        obj.set_hidden("hidden", 8);
        // Reassignment keeps the original position
        obj.set("b", 9);

        let keys: Vec<String> = obj
            .borrow()
            .own_enumerable_entries()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, ["2", "10", "b", "a", "01", "-1", "4294967295"]);
        assert!(matches!(obj.borrow().get("b"), Some(Value::Number(n)) if *n == 9.0));
        assert!(obj.borrow().get("hidden").is_some());
    }

    #[test]
    fn test_array_mutation() {
        let arr = ObjectRef::array();
        assert!(arr.push("first"));
        assert!(arr.set_element(3, "last"));
        match arr.borrow().kind() {
            ObjectKind::Array(elements) => {
                assert_eq!(elements.len(), 4);
                assert!(elements[1].is_none() && elements[2].is_none());
            }
            other => panic!("expected array, got {other:?}"),
        }
        assert!(!ObjectRef::plain().push(1));
    }

    #[test]
    fn test_map_and_set_keys_use_same_value_zero() {
        let map = Value::map([
            (Value::from(f64::NAN), Value::from("first")),
            (Value::from(-0.0), Value::from("zero")),
            (Value::from(f64::NAN), Value::from("second")),
            (Value::from(0.0), Value::from("zero again")),
        ]);
        let map = map.as_object().expect("map is an object");
        match map.borrow().kind() {
            ObjectKind::Map(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(matches!(&entries[0].1, Value::String(s) if s == "second"));
                assert!(matches!(entries[1].0, Value::Number(n) if n.is_sign_positive()));
            }
            other => panic!("expected map, got {other:?}"),
        }

        let shared = Value::from([1]);
        let set = Value::set([
            shared.clone(),
            shared,
            Value::from([1]),
            Value::from("x"),
            Value::from("x"),
        ]);
        let set = set.as_object().expect("set is an object");
        assert!(matches!(set.borrow().kind(), ObjectKind::Set(members) if members.len() == 3));
    }

    #[test]
    fn test_typed_array_values() {
        let floats = TypedArray::Float32(vec![0.5, -2.0]).values();
        assert!(
            matches!(&floats[..], [Value::Number(a), Value::Number(b)] if *a == 0.5 && *b == -2.0)
        );

        let bigints = TypedArray::BigUint64(vec![u64::MAX]).values();
        assert!(matches!(&bigints[..], [Value::BigInt(b)] if *b == BigInt::from(u64::MAX)));

        assert_eq!(TypedArray::Uint8Clamped(vec![]).constructor_name(), "Uint8ClampedArray");
    }

    #[test]
    fn test_form_urlencode() {
        let pairs = vec![
            ("name".to_owned(), "J\u{fc}rgen & co".to_owned()),
            ("empty".to_owned(), String::new()),
            ("sym*-._~".to_owned(), "a=b".to_owned()),
        ];
        assert_eq!(
            form_urlencode(&pairs),
            "name=J%C3%BCrgen+%26+co&empty=&sym*-._%7E=a%3Db"
        );
    }

    #[test]
    fn test_date_strings() {
        assert_eq!(
            date_to_js_string(1_700_000_000_000.0),
            "Tue Nov 14 2023 22:13:20 GMT+0000 (Coordinated Universal Time)"
        );
        assert_eq!(date_to_js_string(9e15), "Invalid Date");
        assert_eq!(date_to_js_string(f64::INFINITY), "Invalid Date");
    }
}
