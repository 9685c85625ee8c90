//! Conversion between `serde_json::Value` and the AWS SDK `Document` type
//!
//! Tool schemas, tool inputs and additional model request fields cross the
//! Bedrock SDK boundary as `Document`s.

use aws_smithy_types::{Document, Number};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub fn json_to_document(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                n.as_f64()
                    .map(|f| Document::Number(Number::Float(f)))
                    .unwrap_or(Document::Null)
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(json_to_document).collect()),
        Value::Object(obj) => Document::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

pub fn document_to_json(doc: &Document) -> Value {
    match doc {
        Document::Null => Value::Null,
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(Number::PosInt(u)) => Value::from(*u),
        Document::Number(Number::NegInt(i)) => Value::from(*i),
        // NaN and infinities have no JSON form and become null
        Document::Number(Number::Float(f)) => Value::from(*f),
        Document::String(s) => Value::String(s.clone()),
        Document::Array(items) => Value::Array(items.iter().map(document_to_json).collect()),
        Document::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_schema_survives_conversion() {
        let schema = json!({
            "type": "object",
            "properties": {
                "person_names": {"type": "array", "items": {"type": "string"}},
                "limit": {"type": "integer", "default": 10}
            },
            "required": ["person_names"]
        });

        assert_eq!(document_to_json(&json_to_document(&schema)), schema);
    }

    #[test]
    fn test_number_variants() {
        assert!(matches!(
            json_to_document(&json!(5)),
            Document::Number(Number::PosInt(5))
        ));
        assert!(matches!(
            json_to_document(&json!(-3)),
            Document::Number(Number::NegInt(-3))
        ));
        assert!(matches!(
            json_to_document(&json!(0.25)),
            Document::Number(Number::Float(f)) if f == 0.25
        ));
    }
}
