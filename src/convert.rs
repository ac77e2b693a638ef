//! Conversion of runtime values into ESTree expressions.
//!
//! [`value_to_estree`] dispatches on the structural kind of a value, in a fixed
//! order where later checks assume earlier ones failed:
//!
//! 1. `undefined`, `null`, `Infinity`, `NaN`
//! 2. booleans, bigints, numbers, strings (negatives become `-<magnitude>`)
//! 3. registry symbols, as `Symbol.for(key)`
//! 4. arrays, boxed primitives, regular expressions, dates, buffers
//! 5. typed arrays, maps, sets, URLs and URLSearchParams
//! 6. plain objects (or any object, with `instance_as_object`)
//! 7. the configured fallback, or [`Error::UnsupportedValue`]

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use num_bigint::Sign;

use crate::Error;
use crate::estree::{Expression, Property};
use crate::object::{ObjectId, ObjectKind, ObjectRef, form_urlencode};
use crate::value::Value;

/// Handler for values no built-in rule accepts; its result is used verbatim
pub type Fallback = Rc<dyn Fn(&Value) -> Result<Expression, Error>>;

/// Converter configuration
#[derive(Clone, Default)]
pub struct Options {
    /// Treat objects with a non-plain prototype (class instances, functions,
    /// unmodeled built-ins) as plain records of their own enumerable properties
    pub instance_as_object: bool,
    /// Track object identity: repeated references reuse the earlier result and
    /// a cycle raises [`Error::CircularReference`]. Without it, a cyclic value
    /// recurses until the stack runs out (or `max_depth` is hit).
    pub preserve_references: bool,
    /// Called with the original value when nothing else applies; its result
    /// (or error) becomes the conversion result
    pub fallback: Option<Fallback>,
    /// Maximum object nesting; `None` is unbounded
    pub max_depth: Option<usize>,
}

impl Options {
    pub fn with_instance_as_object(mut self, enabled: bool) -> Self {
        self.instance_as_object = enabled;
        self
    }

    pub fn with_preserve_references(mut self, enabled: bool) -> Self {
        self.preserve_references = enabled;
        self
    }

    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&Value) -> Result<Expression, Error> + 'static,
    {
        self.fallback = Some(Rc::new(fallback));
        self
    }

    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("instance_as_object", &self.instance_as_object)
            .field("preserve_references", &self.preserve_references)
            .field("fallback", &self.fallback.as_ref().map(|_| "<fn>"))
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Convert a value to an ESTree expression.
///
/// Each call is an independent traversal; nothing is kept between calls.
///
/// # Errors
/// - [`Error::UnsupportedValue`] for local symbols, and for functions and
///   non-plain objects when neither `instance_as_object` nor a fallback applies
/// - [`Error::CircularReference`] when `preserve_references` is set and a value
///   contains itself
/// - [`Error::TooDeeplyNested`] when `max_depth` is exceeded
/// - whatever the fallback returns
///
/// # Example
/// ```
/// use value_to_estree::convert::{Options, value_to_estree};
/// use value_to_estree::estree::Expression;
/// use value_to_estree::value::Value;
///
/// let node = value_to_estree(&Value::from(-2), &Options::default()).unwrap();
/// assert_eq!(node, Expression::negate(Expression::number(2.0)));
/// ```
pub fn value_to_estree(value: &Value, options: &Options) -> Result<Expression, Error> {
    Converter::new(options).convert(value, 0)
}

/// Reference tracking state of an object
enum Visit {
    /// Conversion started and has not finished: meeting it again is a cycle
    InProgress,
    Done(Expression),
}

struct Converter<'a> {
    options: &'a Options,
    /// Keyed by object identity; only filled with `preserve_references`
    visited: HashMap<ObjectId, Visit>,
}

impl<'a> Converter<'a> {
    fn new(options: &'a Options) -> Self {
        Converter {
            options,
            visited: HashMap::new(),
        }
    }

    /// `depth` is the number of objects enclosing `value`
    fn convert(&mut self, value: &Value, depth: usize) -> Result<Expression, Error> {
        match value {
            // `undefined` is a global binding, not a literal
            Value::Undefined => Ok(Expression::identifier("undefined")),
            Value::Null => Ok(Expression::null()),
            Value::Number(n) if *n == f64::INFINITY => Ok(Expression::identifier("Infinity")),
            Value::Number(n) if n.is_nan() => Ok(Expression::identifier("NaN")),
            Value::Bool(b) => Ok(Expression::boolean(*b)),
            // Literals never carry a negative magnitude
            Value::BigInt(b) if b.sign() == Sign::Minus => {
                let magnitude = Value::BigInt(-b);
                Ok(Expression::negate(self.convert(&magnitude, depth)?))
            }
            Value::BigInt(b) => Ok(Expression::bigint(b.clone())),
            Value::Number(n) if *n < 0.0 => {
                let magnitude = Value::Number(-n);
                Ok(Expression::negate(self.convert(&magnitude, depth)?))
            }
            Value::Number(n) => Ok(Expression::number(*n)),
            Value::String(s) => Ok(Expression::string(s.as_str())),
            Value::Symbol(sym) => match sym.key_for() {
                Some(key) => {
                    let key = self.convert(&Value::String(key), depth)?;
                    Ok(Expression::method_call("Symbol", "for", vec![key]))
                }
                None => Err(Error::unsupported_symbol(value)),
            },
            Value::Object(obj) => self.convert_object(value, obj, depth),
        }
    }

    fn convert_object(
        &mut self,
        value: &Value,
        obj: &ObjectRef,
        depth: usize,
    ) -> Result<Expression, Error> {
        if let Some(limit) = self.options.max_depth
            && depth >= limit
        {
            return Err(Error::TooDeeplyNested { limit });
        }

        if !self.options.preserve_references {
            return self.convert_object_contents(value, obj, depth);
        }

        let id = obj.id();
        match self.visited.get(&id) {
            Some(Visit::InProgress) => return Err(Error::circular(value)),
            Some(Visit::Done(earlier)) => return Ok(earlier.clone()),
            None => {}
        }

        self.visited.insert(id, Visit::InProgress);
        let expression = self.convert_object_contents(value, obj, depth)?;
        self.visited.insert(id, Visit::Done(expression.clone()));
        Ok(expression)
    }

    fn convert_object_contents(
        &mut self,
        value: &Value,
        obj: &ObjectRef,
        depth: usize,
    ) -> Result<Expression, Error> {
        // No borrow is held while children convert, so a fallback may mutate any
        // object in the structure
        let kind = obj.borrow().kind().clone();
        if let Some(expression) = self.convert_builtin(&kind, depth + 1)? {
            return Ok(expression);
        }

        let entries = {
            let object = obj.borrow();
            let as_record = self.options.instance_as_object || object.is_plain();
            as_record.then(|| object.own_enumerable_entries())
        };

        match entries {
            Some(entries) => {
                let properties = entries
                    .into_iter()
                    .map(|(key, val)| {
                        let key = self.convert(&Value::String(key), depth + 1)?;
                        Ok::<_, Error>(Property::init(key, self.convert(&val, depth + 1)?))
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(Expression::object(properties))
            }
            None => match &self.options.fallback {
                Some(fallback) => fallback(value),
                None => Err(Error::unsupported(value)),
            },
        }
    }

    /// Objects with a built-in shape; `None` for ordinary objects and functions.
    /// `depth` is the depth of the object's children.
    fn convert_builtin(
        &mut self,
        kind: &ObjectKind,
        depth: usize,
    ) -> Result<Option<Expression>, Error> {
        let expression = match kind {
            ObjectKind::Array(elements) => {
                // Holes stay holes instead of becoming `undefined`
                let elements = elements
                    .iter()
                    .map(|element| {
                        element
                            .as_ref()
                            .map(|item| self.convert(item, depth))
                            .transpose()
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Expression::array(elements)
            }
            ObjectKind::Boxed(primitive) => Expression::new_instance(
                primitive.constructor_name(),
                vec![self.convert(&primitive.primitive(), depth)?],
            ),
            ObjectKind::RegExp { source, flags } => Expression::regex(source.as_str(), flags.as_str()),
            ObjectKind::Date(millis) => {
                Expression::new_instance("Date", vec![self.convert(&Value::Number(*millis), depth)?])
            }
            ObjectKind::Buffer(bytes) => {
                let bytes: Vec<Value> = bytes.iter().map(|&byte| Value::from(byte)).collect();
                Expression::method_call("Buffer", "from", vec![self.convert_list(&bytes, depth)?])
            }
            ObjectKind::TypedArray(array) => Expression::new_instance(
                array.constructor_name(),
                vec![self.convert_list(&array.values(), depth)?],
            ),
            ObjectKind::Map(entries) => {
                // Same shape as `[...map]`: an array of [key, value] pairs
                let pairs = entries
                    .iter()
                    .map(|(key, val)| {
                        let pair = vec![Some(self.convert(key, depth)?), Some(self.convert(val, depth)?)];
                        Ok::<_, Error>(Some(Expression::array(pair)))
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Expression::new_instance("Map", vec![Expression::array(pairs)])
            }
            ObjectKind::Set(members) => {
                Expression::new_instance("Set", vec![self.convert_list(members, depth)?])
            }
            ObjectKind::Url(url) => {
                let href = Value::from(url.as_str());
                Expression::new_instance("URL", vec![self.convert(&href, depth)?])
            }
            ObjectKind::UrlSearchParams(pairs) => {
                let query = Value::String(form_urlencode(pairs));
                Expression::new_instance("URLSearchParams", vec![self.convert(&query, depth)?])
            }
            ObjectKind::Ordinary | ObjectKind::Function { .. } => return Ok(None),
        };
        Ok(Some(expression))
    }

    /// Array expression of converted items, with no holes
    fn convert_list(&mut self, items: &[Value], depth: usize) -> Result<Expression, Error> {
        let elements = items
            .iter()
            .map(|item| self.convert(item, depth).map(Some))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Expression::array(elements))
    }
}
