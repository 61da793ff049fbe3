//! Scalar codec: one relational value to one runtime element and back.
//!
//! Both directions go through text. Inbound, the relational output function
//! renders the datum and the text is parsed according to the type's
//! classification. Outbound, the runtime element is rendered in the runtime's
//! character form and handed to the relational input function.

use rbridge_api::relational::Datum;
use rbridge_api::runtime::{Elements, RuntimeScalar, RuntimeValue, Vector};
use rbridge_api::types::{TypeClass, TypeInfo};

use crate::error::ConversionError;
use crate::vector::new_vector;

/// Parse relational output text into a runtime scalar of the given class.
pub fn decode_scalar(text: Option<&str>, class: TypeClass) -> Result<RuntimeScalar, ConversionError> {
    let Some(text) = text else {
        return Ok(RuntimeScalar::Missing);
    };
    match class {
        TypeClass::SmallInt => text
            .trim()
            .parse::<i32>()
            .map(RuntimeScalar::Integer)
            .map_err(|_| ConversionError::MalformedElement(format!("invalid integer \"{text}\""))),
        TypeClass::Numeric64 => parse_real(text)
            .map(RuntimeScalar::Real)
            .ok_or_else(|| ConversionError::MalformedElement(format!("invalid number \"{text}\""))),
        TypeClass::Boolean => Ok(RuntimeScalar::Logical(text.starts_with('t'))),
        TypeClass::Text => Ok(RuntimeScalar::Character(text.to_string())),
    }
}

/// Float text, or the money display form (`$1,234.50`, `-$0.07`, `($5.00)`).
fn parse_real(text: &str) -> Option<f64> {
    let t = text.trim();
    if let Ok(v) = t.parse::<f64>() {
        return Some(v);
    }
    let (negative, body) = if let Some(inner) = t.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        (true, inner)
    } else if let Some(rest) = t.strip_prefix('-') {
        (true, rest)
    } else {
        (false, t)
    };
    let digits: String = body.strip_prefix('$')?.chars().filter(|c| *c != ',').collect();
    let v = digits.parse::<f64>().ok()?;
    Some(if negative { -v } else { v })
}

/// Render a runtime scalar in the runtime's character form. `Missing` has none.
pub fn scalar_to_text(value: &RuntimeScalar) -> Option<String> {
    match value {
        RuntimeScalar::Integer(v) => Some(v.to_string()),
        RuntimeScalar::Real(v) => Some(format_real(*v)),
        RuntimeScalar::Logical(true) => Some("TRUE".into()),
        RuntimeScalar::Logical(false) => Some("FALSE".into()),
        RuntimeScalar::Character(s) => Some(s.clone()),
        RuntimeScalar::Missing => None,
    }
}

/// Reals print in the shortest form that parses back to the same value;
/// whole values print without a fraction.
pub fn format_real(v: f64) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Inf".into() } else { "-Inf".into() };
    }
    if v == 0.0 {
        // -0.0 prints as 0
        return "0".into();
    }
    v.to_string()
}

/// Element `index` of `vector` in character form.
///
/// Factor codes resolve through the label table. List cells must hold a
/// single atomic element (or be null).
pub fn element_text(vector: &Vector, index: usize) -> Result<Option<String>, ConversionError> {
    let out_of_bounds = || {
        ConversionError::BadInternalRepresentation(format!(
            "index {index} out of bounds for {} vector of length {}",
            vector.kind(),
            vector.len()
        ))
    };
    match vector.elements() {
        Elements::Factor { codes, levels } => match codes.get(index).ok_or_else(out_of_bounds)? {
            None => Ok(None),
            Some(code) => usize::try_from(*code)
                .ok()
                .and_then(|c| c.checked_sub(1))
                .and_then(|c| levels.get(c))
                .cloned()
                .map(Some)
                .ok_or_else(|| {
                    ConversionError::BadInternalRepresentation(format!(
                        "factor code {code} has no label ({} levels)",
                        levels.len()
                    ))
                }),
        },
        Elements::List(cells) => match cells.get(index).ok_or_else(out_of_bounds)? {
            RuntimeValue::Null => Ok(None),
            RuntimeValue::Vector(cell) if cell.len() == 1 && cell.kind() != rbridge_api::runtime::VectorKind::List => {
                element_text(cell, 0)
            }
            RuntimeValue::Vector(cell) => Err(ConversionError::BadInternalRepresentation(format!(
                "list cell {index} holds a {} vector of length {}, expected a single value",
                cell.kind(),
                cell.len()
            ))),
            RuntimeValue::Frame(_) => Err(ConversionError::BadInternalRepresentation(format!(
                "list cell {index} holds a data frame, expected a single value"
            ))),
        },
        _ => {
            let scalar = vector.scalar_at(index).ok_or_else(out_of_bounds)?;
            Ok(scalar_to_text(&scalar))
        }
    }
}

/// Encode one runtime scalar through the target type's input function.
pub fn encode_scalar(value: &RuntimeScalar, target: &TypeInfo) -> Result<Option<Datum>, ConversionError> {
    text_to_datum(scalar_to_text(value).as_deref(), target)
}

pub(crate) fn text_to_datum(text: Option<&str>, target: &TypeInfo) -> Result<Option<Datum>, ConversionError> {
    text.map(|t| input_datum(t, target)).transpose()
}

pub(crate) fn input_datum(text: &str, target: &TypeInfo) -> Result<Datum, ConversionError> {
    target
        .input
        .input(text, -1)
        .map_err(|e| ConversionError::from(e).with_context(format!("type {}", target.name)))
}

/// Decode one relational datum of type `info` into a runtime scalar.
pub(crate) fn datum_to_scalar(datum: Option<&Datum>, info: &TypeInfo) -> Result<RuntimeScalar, ConversionError> {
    match datum {
        None => Ok(RuntimeScalar::Missing),
        Some(d) => {
            let text = info
                .output
                .output(d)
                .map_err(|e| ConversionError::from(e).with_context(format!("type {}", info.name)))?;
            decode_scalar(Some(&text), info.class)
        }
    }
}

/// A scalar argument becomes a length-1 vector. Null becomes a missing character element.
pub fn pg_scalar_to_runtime(datum: Option<&Datum>, info: &TypeInfo) -> Result<Vector, ConversionError> {
    let Some(datum) = datum else {
        return Ok(Vector::missing());
    };
    let mut out = new_vector(info.class, 1);
    out.set(0, datum_to_scalar(Some(datum), info)?)?;
    Ok(out)
}

/// Scalar result: the first element, coerced to character, through the input function.
pub fn scalar_result(value: &RuntimeValue, info: &TypeInfo) -> Result<Option<Datum>, ConversionError> {
    let text = match value {
        RuntimeValue::Null => None,
        RuntimeValue::Vector(v) if v.is_empty() => None,
        RuntimeValue::Vector(v) => element_text(v, 0)?,
        RuntimeValue::Frame(f) => match f.column(0) {
            Some(col) if !col.is_empty() => element_text(col, 0)?,
            _ => None,
        },
    };
    tracing::trace!(result = %info.name, missing = text.is_none(), "scalar result");
    text_to_datum(text.as_deref(), info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;
    use rbridge_api::oid::*;
    use rbridge_api::types::TypeCatalog;

    fn info(oid: u32) -> TypeInfo {
        BuiltinCatalog::new().lookup(oid).unwrap()
    }

    #[test]
    fn decodes_by_class() {
        assert_eq!(decode_scalar(Some("42"), TypeClass::SmallInt).unwrap(), RuntimeScalar::Integer(42));
        assert_eq!(decode_scalar(Some("2.5"), TypeClass::Numeric64).unwrap(), RuntimeScalar::Real(2.5));
        assert_eq!(decode_scalar(Some("t"), TypeClass::Boolean).unwrap(), RuntimeScalar::Logical(true));
        assert_eq!(decode_scalar(Some("f"), TypeClass::Boolean).unwrap(), RuntimeScalar::Logical(false));
        assert_eq!(
            decode_scalar(Some("abc"), TypeClass::Text).unwrap(),
            RuntimeScalar::Character("abc".into())
        );
        for class in [TypeClass::SmallInt, TypeClass::Numeric64, TypeClass::Boolean, TypeClass::Text] {
            assert_eq!(decode_scalar(None, class).unwrap(), RuntimeScalar::Missing);
        }
    }

    #[test]
    fn decodes_money_display_form() {
        assert_eq!(parse_real("$1,234.50"), Some(1234.5));
        assert_eq!(parse_real("-$0.07"), Some(-0.07));
        assert_eq!(parse_real("($5.00)"), Some(-5.0));
        assert_eq!(parse_real("Infinity"), Some(f64::INFINITY));
        assert!(parse_real("1,234").is_none());
    }

    #[test]
    fn malformed_numbers_fail() {
        assert!(matches!(
            decode_scalar(Some("x1"), TypeClass::SmallInt),
            Err(ConversionError::MalformedElement(_))
        ));
        assert!(matches!(
            decode_scalar(Some("1.2.3"), TypeClass::Numeric64),
            Err(ConversionError::MalformedElement(_))
        ));
    }

    #[test]
    fn real_formatting() {
        assert_eq!(format_real(3.0), "3");
        assert_eq!(format_real(-0.0), "0");
        assert_eq!(format_real(2.5), "2.5");
        assert_eq!(format_real(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_real(1_234_567_890_123_456.0), "1234567890123456");
        assert_eq!(format_real(1e-7), "0.0000001");
        assert_eq!(format_real(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_real(f64::NAN), "NaN");
    }

    #[test]
    fn encodes_through_input_function() {
        assert_eq!(
            encode_scalar(&RuntimeScalar::Integer(7), &info(INT4OID)).unwrap(),
            Some(Datum::Int4(7))
        );
        assert_eq!(
            encode_scalar(&RuntimeScalar::Logical(true), &info(BOOLOID)).unwrap(),
            Some(Datum::Bool(true))
        );
        assert_eq!(
            encode_scalar(&RuntimeScalar::Real(1.5), &info(FLOAT8OID)).unwrap(),
            Some(Datum::Float8(1.5))
        );
        assert_eq!(encode_scalar(&RuntimeScalar::Missing, &info(TEXTOID)).unwrap(), None);
        assert!(matches!(
            encode_scalar(&RuntimeScalar::Character("abc".into()), &info(INT4OID)),
            Err(ConversionError::MalformedElement(_))
        ));
    }

    #[test]
    fn factor_elements_resolve_labels() {
        let f = Vector::factor(vec![Some(2), None, Some(1)], vec!["lo".into(), "hi".into()]);
        assert_eq!(element_text(&f, 0).unwrap().as_deref(), Some("hi"));
        assert_eq!(element_text(&f, 1).unwrap(), None);
        assert_eq!(element_text(&f, 2).unwrap().as_deref(), Some("lo"));

        let bad = Vector::factor(vec![Some(3)], vec!["a".into()]);
        assert!(element_text(&bad, 0).is_err());
    }

    #[test]
    fn list_cells_must_be_single_values() {
        let l = Vector::list(vec![
            Vector::integer(vec![Some(5)]).into(),
            RuntimeValue::Null,
            Vector::integer(vec![Some(1), Some(2)]).into(),
        ]);
        assert_eq!(element_text(&l, 0).unwrap().as_deref(), Some("5"));
        assert_eq!(element_text(&l, 1).unwrap(), None);
        assert!(matches!(element_text(&l, 2), Err(ConversionError::BadInternalRepresentation(_))));
    }

    #[test]
    fn scalar_argument_round_trip() {
        for (oid, datum) in [
            (INT2OID, Datum::Int2(-3)),
            (INT4OID, Datum::Int4(123)),
            (INT8OID, Datum::Int8(1 << 40)),
            (FLOAT8OID, Datum::Float8(0.25)),
            (NUMERICOID, Datum::Numeric("12.5".into())),
            (BOOLOID, Datum::Bool(false)),
            (TEXTOID, Datum::Text("héllo".into())),
        ] {
            let ti = info(oid);
            let v = pg_scalar_to_runtime(Some(&datum), &ti).unwrap();
            assert_eq!(v.len(), 1);
            let back = scalar_result(&v.into(), &ti).unwrap();
            assert_eq!(back, Some(datum), "type {}", ti.name);
        }
    }

    #[test]
    fn encode_inverts_decode() {
        for (oid, text) in [(INT2OID, "-7"), (FLOAT8OID, "1e-3"), (BOOLOID, "t"), (TEXTOID, "x y")] {
            let ti = info(oid);
            let scalar = decode_scalar(Some(text), ti.class).unwrap();
            let expected = ti.input.input(text, -1).unwrap();
            assert_eq!(encode_scalar(&scalar, &ti).unwrap(), Some(expected), "type {}", ti.name);
        }
    }

    #[test]
    fn nulls_are_preserved() {
        for oid in [INT4OID, FLOAT8OID, BOOLOID, TEXTOID] {
            let ti = info(oid);
            let v = pg_scalar_to_runtime(None, &ti).unwrap();
            assert_eq!(v, Vector::missing());
            assert_eq!(scalar_result(&v.into(), &ti).unwrap(), None);
        }
        assert_eq!(scalar_result(&RuntimeValue::Null, &info(INT4OID)).unwrap(), None);
    }

    #[test]
    fn money_argument_decodes_to_real() {
        let v = pg_scalar_to_runtime(Some(&Datum::Money(123_450)), &info(CASHOID)).unwrap();
        assert_eq!(v.scalar_at(0), Some(RuntimeScalar::Real(1234.5)));
    }
}
