//! Parsing and validation of monetary amounts in request bodies.
//!
//! Amounts may arrive as JSON numbers or as numeric strings (e.g. from HTML
//! number inputs), so request structs take them as [serde_json::Value] and
//! convert them with the functions here.

use serde_json::Value;

use crate::Error;

/// Convert a JSON value into a finite `f64`.
///
/// Numbers are taken as-is and strings are trimmed and parsed. Anything else,
/// including `NaN` and infinities spelled out as strings, is rejected.
pub fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    number.is_finite().then_some(number)
}

/// Parse a required amount that must be strictly greater than zero.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `value` is missing, not numeric or not positive.
pub fn parse_positive_amount(field_name: &str, value: Option<&Value>) -> Result<f64, Error> {
    match value.and_then(parse_number) {
        Some(amount) if amount > 0.0 => Ok(amount),
        _ => Err(Error::InvalidAmount(format!(
            "{field_name} must be a number greater than zero"
        ))),
    }
}

/// Parse a required amount that must be zero or greater.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `value` is missing, not numeric or negative.
pub fn parse_non_negative_amount(field_name: &str, value: Option<&Value>) -> Result<f64, Error> {
    match value.and_then(parse_number) {
        Some(amount) if amount >= 0.0 => Ok(amount),
        _ => Err(Error::InvalidAmount(format!(
            "{field_name} must be a number that is zero or greater"
        ))),
    }
}

/// Parse a required amount that may take any finite value, including negatives.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `value` is missing or not numeric.
pub fn parse_finite_amount(field_name: &str, value: Option<&Value>) -> Result<f64, Error> {
    value
        .and_then(parse_number)
        .ok_or_else(|| Error::InvalidAmount(format!("{field_name} must be a number")))
}

/// Parse an optional amount, treating JSON `null` the same as a missing field.
///
/// # Errors
/// Returns [Error::InvalidAmount] if a value is present but is not numeric.
pub fn parse_optional_amount(field_name: &str, value: Option<&Value>) -> Result<Option<f64>, Error> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_finite_amount(field_name, Some(value)).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::Error;

    use super::{
        parse_finite_amount, parse_non_negative_amount, parse_number, parse_optional_amount,
        parse_positive_amount,
    };

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_number(&json!(12.5)), Some(12.5));
        assert_eq!(parse_number(&json!(30)), Some(30.0));
        assert_eq!(parse_number(&json!(" 42.10 ")), Some(42.1));
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&json!(null)), None);
        assert_eq!(parse_number(&json!([1])), None);
        assert_eq!(parse_number(&json!("NaN")), None);
        assert_eq!(parse_number(&json!("inf")), None);
    }

    #[test]
    fn positive_amount_rejects_zero_and_negatives() {
        assert!(matches!(
            parse_positive_amount("amount", Some(&json!(0))),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_positive_amount("amount", Some(&json!(-5))),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_positive_amount("amount", None),
            Err(Error::InvalidAmount(_))
        ));
        assert_eq!(parse_positive_amount("amount", Some(&json!("0.01"))), Ok(0.01));
    }

    #[test]
    fn non_negative_amount_accepts_zero() {
        assert_eq!(parse_non_negative_amount("amount", Some(&json!(0))), Ok(0.0));
        assert!(parse_non_negative_amount("amount", Some(&json!(-0.5))).is_err());
    }

    #[test]
    fn finite_amount_accepts_negatives() {
        assert_eq!(parse_finite_amount("totalBalance", Some(&json!(-50))), Ok(-50.0));
    }

    #[test]
    fn optional_amount_treats_null_as_missing() {
        assert_eq!(parse_optional_amount("increment", None), Ok(None));
        assert_eq!(parse_optional_amount("increment", Some(&json!(null))), Ok(None));
        assert_eq!(
            parse_optional_amount("increment", Some(&json!(-20))),
            Ok(Some(-20.0))
        );
        assert!(parse_optional_amount("increment", Some(&json!("x"))).is_err());
    }
}
