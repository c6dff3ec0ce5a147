//! Feedback payload checks against the channel's field definitions.

use serde_json::{Map, Value};

use models::field::{self, FieldFormat, FieldType};
use crate::errors::ServiceError;
use crate::query::{format_datetime, parse_datetime};

fn invalid(field: &field::Model, expected: &str) -> ServiceError {
    ServiceError::bad_request(format!("invalid value for {}: expected {}", field.key, expected))
}

/// Check `value` against the field format. Dates come back in canonical
/// form; everything else is returned unchanged. `null` is always accepted.
pub fn validate_value(field: &field::Model, value: &Value) -> Result<Value, ServiceError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let format = field.format()?;
    match format {
        FieldFormat::Text | FieldFormat::Keyword => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(invalid(field, "string")),
        },
        FieldFormat::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            _ => Err(invalid(field, "number")),
        },
        FieldFormat::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(invalid(field, "boolean")),
        },
        FieldFormat::Select => {
            let options = field.option_list();
            match value {
                Value::String(s) if options.contains(s) => Ok(value.clone()),
                _ => Err(invalid(field, "one of the field options")),
            }
        }
        FieldFormat::MultiSelect => {
            let options = field.option_list();
            let items = value.as_array().ok_or_else(|| invalid(field, "array of options"))?;
            let all_known = items
                .iter()
                .all(|item| item.as_str().is_some_and(|s| options.iter().any(|o| o == s)));
            if all_known {
                Ok(value.clone())
            } else {
                Err(invalid(field, "array of options"))
            }
        }
        FieldFormat::Date => value
            .as_str()
            .and_then(parse_datetime)
            .map(|dt| Value::String(format_datetime(&dt)))
            .ok_or_else(|| invalid(field, "date")),
    }
}

/// Validate a whole payload; every key must name a field of type `allowed`.
pub fn validate_payload(
    fields: &[field::Model],
    data: &Map<String, Value>,
    allowed: FieldType,
) -> Result<Map<String, Value>, ServiceError> {
    let mut out = Map::with_capacity(data.len());
    for (key, value) in data {
        let def = fields
            .iter()
            .find(|f| &f.key == key)
            .ok_or_else(|| ServiceError::bad_request(format!("unknown field: {key}")))?;
        if def.kind()? != allowed {
            return Err(ServiceError::bad_request(format!(
                "field {key} is not writable here ({} field)",
                def.field_type
            )));
        }
        out.insert(key.clone(), validate_value(def, value)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn def(key: &str, format: FieldFormat, kind: FieldType, options: Option<Value>) -> field::Model {
        field::Model {
            id: 1,
            channel_id: 1,
            key: key.into(),
            name: key.into(),
            format: format.as_str().into(),
            field_type: kind.as_str().into(),
            options,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn formats_are_enforced() {
        let text = def("m", FieldFormat::Text, FieldType::Api, None);
        assert!(validate_value(&text, &json!("hi")).is_ok());
        assert!(validate_value(&text, &json!(1)).is_err());

        let num = def("n", FieldFormat::Number, FieldType::Api, None);
        assert!(validate_value(&num, &json!(3.5)).is_ok());
        assert!(validate_value(&num, &json!("3")).is_err());

        let flag = def("b", FieldFormat::Boolean, FieldType::Api, None);
        assert!(validate_value(&flag, &json!(false)).is_ok());
        assert!(validate_value(&flag, &json!("false")).is_err());
    }

    #[test]
    fn select_values_must_be_options() {
        let os = def("os", FieldFormat::Select, FieldType::Api, Some(json!(["ios", "android"])));
        assert!(validate_value(&os, &json!("ios")).is_ok());
        assert!(validate_value(&os, &json!("web")).is_err());

        let tags = def("tags", FieldFormat::MultiSelect, FieldType::Api, Some(json!(["a", "b"])));
        assert!(validate_value(&tags, &json!(["a", "b"])).is_ok());
        assert!(validate_value(&tags, &json!(["a", "c"])).is_err());
        assert!(validate_value(&tags, &json!("a")).is_err());
    }

    #[test]
    fn dates_are_canonicalised() {
        let d = def("when", FieldFormat::Date, FieldType::Api, None);
        assert_eq!(validate_value(&d, &json!("2024-05-01")).unwrap(), json!("2024-05-01T00:00:00.000Z"));
        assert!(validate_value(&d, &json!("May 1st")).is_err());
    }

    #[test]
    fn payload_keys_must_match_field_type() {
        let fields = vec![
            def("message", FieldFormat::Text, FieldType::Api, None),
            def("memo", FieldFormat::Text, FieldType::Admin, None),
        ];
        let api = json!({"message": "hi"});
        assert!(validate_payload(&fields, api.as_object().unwrap(), FieldType::Api).is_ok());

        let admin_via_api = json!({"memo": "x"});
        assert!(validate_payload(&fields, admin_via_api.as_object().unwrap(), FieldType::Api).is_err());

        let unknown = json!({"nope": 1});
        assert!(validate_payload(&fields, unknown.as_object().unwrap(), FieldType::Api).is_err());
    }
}
