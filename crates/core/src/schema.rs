//! Declarative payload validation.
//!
//! Templates may declare a schema for their payload; a violating payload is
//! rejected before any drawing or temp artifact. The validator covers the
//! declarative subset stored template schemas actually use: `type`,
//! `required`, `properties`, `items`, and `enum`. Schema keywords outside
//! that subset are ignored rather than rejected, so a richer schema from an
//! external authoring tool still gets its core constraints enforced.

use crate::error::RenderError;
use serde_json::Value;

/// Checks `payload` against `schema`, reporting the first violation.
pub fn validate(payload: &Value, schema: &Value) -> Result<(), RenderError> {
    check(payload, schema, "$").map_err(RenderError::SchemaValidation)
}

fn check(value: &Value, schema: &Value, path: &str) -> Result<(), String> {
    let Some(schema) = schema.as_object() else {
        // A non-object schema constrains nothing.
        return Ok(());
    };

    if let Some(expected) = schema.get("type") {
        check_type(value, expected, path)?;
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array)
        && !allowed.contains(value)
    {
        return Err(format!("{}: value not in enum", path));
    }

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        let obj = value.as_object();
        for name in required.iter().filter_map(Value::as_str) {
            if obj.is_none_or(|o| !o.contains_key(name)) {
                return Err(format!("{}: missing required property '{}'", path, name));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object)
        && let Some(obj) = value.as_object()
    {
        for (name, subschema) in properties {
            if let Some(found) = obj.get(name) {
                check(found, subschema, &format!("{}.{}", path, name))?;
            }
        }
    }

    if let Some(items) = schema.get("items")
        && let Some(array) = value.as_array()
    {
        for (index, item) in array.iter().enumerate() {
            check(item, items, &format!("{}[{}]", path, index))?;
        }
    }

    Ok(())
}

fn check_type(value: &Value, expected: &Value, path: &str) -> Result<(), String> {
    let matches = |name: &str| match name {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    };

    let ok = match expected {
        Value::String(name) => matches(name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(matches),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("{}: expected type {}", path, expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_conforming_payload() {
        let schema = json!({
            "type": "object",
            "required": ["customer"],
            "properties": {
                "customer": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                },
                "items": {
                    "type": "array",
                    "items": { "type": "object", "required": ["qty"] }
                }
            }
        });
        let payload = json!({
            "customer": { "name": "ACME" },
            "items": [ { "qty": 1 }, { "qty": 2 } ]
        });
        assert!(validate(&payload, &schema).is_ok());
    }

    #[test]
    fn rejects_missing_required() {
        let schema = json!({ "type": "object", "required": ["customer"] });
        let err = validate(&json!({}), &schema).unwrap_err();
        assert!(matches!(err, RenderError::SchemaValidation(_)));
        assert!(err.to_string().contains("customer"));
    }

    #[test]
    fn rejects_wrong_type_with_path() {
        let schema = json!({
            "properties": { "total": { "type": "number" } }
        });
        let err = validate(&json!({ "total": "12" }), &schema).unwrap_err();
        assert!(err.to_string().contains("$.total"));
    }

    #[test]
    fn rejects_bad_array_item() {
        let schema = json!({
            "properties": {
                "rows": { "items": { "type": "object", "required": ["id"] } }
            }
        });
        let err = validate(&json!({ "rows": [ { "id": 1 }, {} ] }), &schema).unwrap_err();
        assert!(err.to_string().contains("rows[1]"));
    }

    #[test]
    fn integer_type_excludes_fractions() {
        let schema = json!({ "properties": { "n": { "type": "integer" } } });
        assert!(validate(&json!({ "n": 3 }), &schema).is_ok());
        assert!(validate(&json!({ "n": 3.5 }), &schema).is_err());
    }

    #[test]
    fn enum_membership() {
        let schema = json!({ "properties": { "lang": { "enum": ["es", "en"] } } });
        assert!(validate(&json!({ "lang": "es" }), &schema).is_ok());
        assert!(validate(&json!({ "lang": "fr" }), &schema).is_err());
    }

    #[test]
    fn unknown_keywords_are_ignored() {
        let schema = json!({ "properties": { "x": { "format": "email" } } });
        assert!(validate(&json!({ "x": "whatever" }), &schema).is_ok());
    }
}
