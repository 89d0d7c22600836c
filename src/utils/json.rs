use serde_json::Value;

/// Distinguishes an omitted JSON field from an explicit `null` so PUT handlers
/// can treat "leave unchanged" and "clear" differently.
pub enum NullableValue<T> {
    Omitted,
    Null,
    Value(T),
}

pub fn classify_string(optional_value: Option<&Value>) -> Result<NullableValue<String>, String> {
    match optional_value {
        None => Ok(NullableValue::Omitted),
        Some(Value::Null) => Ok(NullableValue::Null),
        Some(Value::String(s)) => Ok(NullableValue::Value(s.to_owned())),
        Some(other) => Err(format!("expected string or null, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_omitted_null_and_value() {
        assert!(matches!(classify_string(None), Ok(NullableValue::Omitted)));
        assert!(matches!(
            classify_string(Some(&Value::Null)),
            Ok(NullableValue::Null)
        ));
        match classify_string(Some(&json!("hi"))) {
            Ok(NullableValue::Value(s)) => assert_eq!(s, "hi"),
            _ => panic!("expected value"),
        }
        assert!(classify_string(Some(&json!(42))).is_err());
    }
}
