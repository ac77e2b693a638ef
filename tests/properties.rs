// Property-based tests for the numeric sign-splitting laws
use num_bigint::BigInt;
use proptest::prelude::*;
use value_to_estree::convert::{Options, value_to_estree};
use value_to_estree::estree::{Expression, LiteralValue, UnaryOperator};
use value_to_estree::value::Value;

fn convert(value: &Value) -> Expression {
    value_to_estree(value, &Options::default()).expect("numbers always convert")
}

/// Every literal reachable from `expression`
fn collect_literals<'a>(expression: &'a Expression, out: &mut Vec<&'a LiteralValue>) {
    match expression {
        Expression::Literal(literal) => out.push(&literal.value),
        Expression::UnaryExpression(unary) => collect_literals(&unary.argument, out),
        Expression::ArrayExpression(array) => {
            for element in array.elements.iter().flatten() {
                collect_literals(element, out);
            }
        }
        Expression::ObjectExpression(object) => {
            for property in &object.properties {
                collect_literals(&property.key, out);
                collect_literals(&property.value, out);
            }
        }
        Expression::NewExpression(call) => {
            call.arguments.iter().for_each(|arg| collect_literals(arg, out));
        }
        Expression::CallExpression(call) => {
            call.arguments.iter().for_each(|arg| collect_literals(arg, out));
        }
        Expression::Identifier(_) | Expression::MemberExpression(_) => {}
    }
}

fn nested_numbers() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<f64>().prop_map(Value::from),
        any::<i64>().prop_map(|n| Value::from(BigInt::from(n))),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop::collection::vec(inner, 0..8).prop_map(Value::array)
    })
}

proptest! {
    #[test]
    fn test_negative_number_is_negated_magnitude(n in any::<f64>().prop_filter("negative", |n| *n < 0.0)) {
        let expression = convert(&Value::from(n));
        match &expression {
            Expression::UnaryExpression(unary) => {
                prop_assert_eq!(unary.operator, UnaryOperator::Minus);
                prop_assert!(unary.prefix);
                prop_assert_eq!(unary.argument.as_ref(), &convert(&Value::from(-n)));
            }
            other => prop_assert!(false, "expected unary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_non_negative_finite_number_is_literal(n in 0.0f64..f64::MAX) {
        prop_assert_eq!(convert(&Value::from(n)), Expression::number(n));
    }

    #[test]
    fn test_bigint_sign_splitting(n in any::<i128>()) {
        let big = BigInt::from(n);
        let expression = convert(&Value::from(big.clone()));
        if n < 0 {
            prop_assert_eq!(expression, Expression::negate(Expression::bigint(-big)));
        } else {
            match &expression {
                Expression::Literal(literal) => {
                    let decimal = n.to_string();
                    prop_assert_eq!(literal.bigint.as_deref(), Some(decimal.as_str()));
                }
                other => prop_assert!(false, "expected literal, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_no_literal_is_negative(value in nested_numbers()) {
        let expression = convert(&value);
        let mut literals = Vec::new();
        collect_literals(&expression, &mut literals);
        for literal in literals {
            match literal {
                LiteralValue::Number(n) => prop_assert!(*n >= 0.0 && n.is_sign_positive(), "negative literal {}", n),
                LiteralValue::BigInt(b) => prop_assert!(b.sign() != num_bigint::Sign::Minus, "negative literal {}", b),
                _ => {}
            }
        }
    }
}
