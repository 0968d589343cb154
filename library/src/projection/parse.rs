use serde_json::Value;

use crate::error::LibraryError;
use crate::locale::Locale;
use crate::model::property::PropertyType;

/// A value entered by the user, already parsed for its property type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl TypedValue {
    /// Numeric form used for keyframe points.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Int(i) => Some(*i as f64),
            TypedValue::Float(f) => Some(*f),
            TypedValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            TypedValue::Text(_) => None,
        }
    }

    /// Converts a choice or other override value.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(TypedValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(TypedValue::Int(i)),
                None => n.as_f64().map(TypedValue::Float),
            },
            Value::String(s) => Some(TypedValue::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Int(i) => Value::from(*i),
            TypedValue::Float(f) => Value::from(*f),
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// Parses user text for a property. Empty text means "no value".
pub fn parse_input(
    property: &str,
    property_type: PropertyType,
    text: &str,
    locale: &Locale,
) -> Result<Option<TypedValue>, LibraryError> {
    if text.is_empty() {
        return Ok(None);
    }
    let parse_error = |expected: &'static str| LibraryError::Parse {
        property: property.to_string(),
        input: text.to_string(),
        expected,
    };

    let value = match property_type {
        PropertyType::Int => {
            let value = locale.parse_int(text).ok_or_else(|| parse_error("an integer"))?;
            TypedValue::Int(value)
        }
        PropertyType::Float => {
            let value = locale.parse_float(text).ok_or_else(|| parse_error("a number"))?;
            TypedValue::Float(value)
        }
        PropertyType::Bool => {
            let value = locale
                .parse_bool(text)
                .ok_or_else(|| parse_error("True or False"))?;
            TypedValue::Bool(value)
        }
        PropertyType::String | PropertyType::Font | PropertyType::Caption | PropertyType::Reader => {
            TypedValue::Text(text.to_string())
        }
        PropertyType::Color => return Err(parse_error("a color from the color editor")),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_types_report_parse_errors() {
        let locale = Locale::default();
        let err = parse_input("layer", PropertyType::Int, "two", &locale).unwrap_err();
        assert!(matches!(err, LibraryError::Parse { expected: "an integer", .. }));
        assert!(parse_input("alpha", PropertyType::Float, "0.5x", &locale).is_err());
        assert_eq!(
            parse_input("alpha", PropertyType::Float, "1,000.5", &locale).unwrap(),
            Some(TypedValue::Float(1000.5))
        );
    }

    #[test]
    fn empty_text_is_no_value() {
        let locale = Locale::default();
        assert_eq!(parse_input("alpha", PropertyType::Float, "", &locale).unwrap(), None);
    }

    #[test]
    fn text_types_pass_through() {
        let locale = Locale::default();
        assert_eq!(
            parse_input("text", PropertyType::Caption, "Hello, world", &locale).unwrap(),
            Some(TypedValue::Text("Hello, world".into()))
        );
        assert_eq!(
            parse_input("visible", PropertyType::Bool, "false", &locale).unwrap(),
            Some(TypedValue::Bool(false))
        );
    }
}
