//! Registered value-kind conversions.
//!
//! A conversion either has a registered path or it does not; an unregistered
//! pair yields an unknown-conversion exception, never a silent coercion.

use rill_ir::TypeTag;

use crate::exception::{type_mismatch, unknown_conversion, Exception};
use crate::value::Value;

/// Convert a value to the target kind.
///
/// A value already of the target kind converts to itself. Registered paths:
/// number→text, text→number, boolean→text, list→set, set→list.
pub fn convert(value: &Value, target: TypeTag) -> Result<Value, Exception> {
    if value.matches_tag(target) {
        return Ok(value.clone());
    }
    match (value, target) {
        (Value::Number(n), TypeTag::Text) => Ok(Value::text(n.to_string())),
        (Value::Text(s), TypeTag::Number) => s
            .trim()
            .parse::<f64>()
            .map(Value::number)
            .map_err(|_| type_mismatch("numeric text", format!("'{s}'"))),
        (Value::Bool(b), TypeTag::Text) => Ok(Value::text(if *b { "⊤" } else { "⊥" })),
        (Value::List(items), TypeTag::Set) => Ok(Value::set((**items).clone())),
        (Value::Set(items), TypeTag::List) => Ok(Value::list((**items).clone())),
        _ => Err(unknown_conversion(value.kind_label(), target.label())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identity() {
        let v = Value::number(2.0);
        assert_eq!(convert(&v, TypeTag::Number).unwrap(), v);
    }

    #[test]
    fn test_number_to_text() {
        assert_eq!(
            convert(&Value::number(2.0), TypeTag::Text).unwrap(),
            Value::text("2")
        );
        assert_eq!(
            convert(&Value::number_with_unit(5.0, "ms"), TypeTag::Text).unwrap(),
            Value::text("5ms")
        );
    }

    #[test]
    fn test_text_to_number() {
        assert_eq!(
            convert(&Value::text(" 3.5 "), TypeTag::Number).unwrap(),
            Value::number(3.5)
        );
        assert!(convert(&Value::text("abc"), TypeTag::Number).is_err());
    }

    #[test]
    fn test_list_set_roundtrip() {
        let list = Value::list(vec![Value::number(1.0), Value::number(1.0)]);
        let set = convert(&list, TypeTag::Set).unwrap();
        assert_eq!(set, Value::set(vec![Value::number(1.0)]));
        let back = convert(&set, TypeTag::List).unwrap();
        assert_eq!(back, Value::list(vec![Value::number(1.0)]));
    }

    #[test]
    fn test_unregistered_pair() {
        let err = convert(&Value::bool(true), TypeTag::Map).unwrap_err();
        assert_eq!(err.to_string(), "no conversion from boolean to map");
    }
}
