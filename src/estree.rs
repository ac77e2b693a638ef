//! ESTree node types produced by the converter.
//!
//! Only the expression subset the converter emits is modeled. Field names and
//! the `type` discriminator follow the [ESTree spec](https://github.com/estree/estree)
//! exactly, so the `serde` serialization of a node is ESTree JSON that any
//! ESTree code generator accepts.
//!
//! ```json
//! {"type": "UnaryExpression", "operator": "-", "prefix": true,
//!  "argument": {"type": "Literal", "value": 1}}
//! ```

use num_bigint::BigInt;
use serde::{Serialize, Serializer};

/// Largest integer a double represents exactly (2^53)
const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_992.0;

/// An ESTree expression
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expression {
    Identifier(Identifier),
    Literal(Literal),
    UnaryExpression(UnaryExpression),
    ArrayExpression(ArrayExpression),
    ObjectExpression(ObjectExpression),
    NewExpression(NewExpression),
    CallExpression(CallExpression),
    MemberExpression(MemberExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub value: LiteralValue,
    /// Decimal digits of a bigint literal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bigint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegExpLiteral>,
}

/// The `value` of a [`Literal`]
///
/// Bigints and regular expressions have no JSON form; they serialize as `null`
/// and the literal's `bigint` or `regex` field carries the data instead.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    BigInt(BigInt),
    RegExp(RegExpLiteral),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegExpLiteral {
    pub pattern: String,
    pub flags: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    #[serde(rename = "-")]
    Minus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub prefix: bool,
    pub argument: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayExpression {
    /// `None` is an elision (a hole), serialized as `null`
    pub elements: Vec<Option<Expression>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Plain `key: value`; the converter never emits accessors
    Init,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Property {
    pub method: bool,
    pub shorthand: bool,
    pub computed: bool,
    pub kind: PropertyKind,
    pub key: Expression,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Box<Expression>,
    pub computed: bool,
    pub optional: bool,
}

impl Serialize for LiteralValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LiteralValue::Null | LiteralValue::BigInt(_) | LiteralValue::RegExp(_) => {
                serializer.serialize_none()
            }
            LiteralValue::Boolean(b) => serializer.serialize_bool(*b),
            // Integral values print as `1`, not `1.0`
            LiteralValue::Number(n)
                if n.fract() == 0.0 && (0.0..=MAX_SAFE_INTEGER_F64).contains(n) =>
            {
                serializer.serialize_u64(*n as u64)
            }
            LiteralValue::Number(n) => serializer.serialize_f64(*n),
            LiteralValue::String(s) => serializer.serialize_str(s),
        }
    }
}

// Builders used by the converter, and handy in tests

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier { name: name.into() })
    }

    fn literal(value: LiteralValue) -> Self {
        Expression::Literal(Literal {
            value,
            bigint: None,
            regex: None,
        })
    }

    pub fn null() -> Self {
        Self::literal(LiteralValue::Null)
    }

    pub fn boolean(b: bool) -> Self {
        Self::literal(LiteralValue::Boolean(b))
    }

    /// Number literal; `-0` becomes `0`
    pub fn number(n: f64) -> Self {
        Self::literal(LiteralValue::Number(if n == 0.0 { 0.0 } else { n }))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::literal(LiteralValue::String(s.into()))
    }

    pub fn bigint(b: BigInt) -> Self {
        Expression::Literal(Literal {
            bigint: Some(b.to_string()),
            value: LiteralValue::BigInt(b),
            regex: None,
        })
    }

    pub fn regex(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        let regex = RegExpLiteral {
            pattern: pattern.into(),
            flags: flags.into(),
        };
        Expression::Literal(Literal {
            value: LiteralValue::RegExp(regex.clone()),
            bigint: None,
            regex: Some(regex),
        })
    }

    /// `-argument`
    pub fn negate(argument: Expression) -> Self {
        Expression::UnaryExpression(UnaryExpression {
            operator: UnaryOperator::Minus,
            prefix: true,
            argument: Box::new(argument),
        })
    }

    pub fn array(elements: Vec<Option<Expression>>) -> Self {
        Expression::ArrayExpression(ArrayExpression { elements })
    }

    pub fn object(properties: Vec<Property>) -> Self {
        Expression::ObjectExpression(ObjectExpression { properties })
    }

    /// `new Constructor(arguments)`
    pub fn new_instance(constructor: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::NewExpression(NewExpression {
            callee: Box::new(Self::identifier(constructor)),
            arguments,
        })
    }

    /// `object.method(arguments)`
    pub fn method_call(
        object: impl Into<String>,
        method: impl Into<String>,
        arguments: Vec<Expression>,
    ) -> Self {
        Expression::CallExpression(CallExpression {
            callee: Box::new(Expression::MemberExpression(MemberExpression {
                object: Box::new(Self::identifier(object)),
                property: Box::new(Self::identifier(method)),
                computed: false,
                optional: false,
            })),
            arguments,
            optional: false,
        })
    }
}

impl Property {
    /// `key: value` as written in an object literal
    pub fn init(key: Expression, value: Expression) -> Self {
        Property {
            method: false,
            shorthand: false,
            computed: false,
            kind: PropertyKind::Init,
            key,
            value,
        }
    }
}
