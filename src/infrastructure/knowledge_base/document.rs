//! Conversion of Smithy documents (chunk metadata) to JSON

use std::collections::HashMap;

use aws_smithy_types::Document as SmithyDocument;

/// Convert a metadata map returned by the runtime API
pub fn metadata_to_json(
    metadata: &HashMap<String, SmithyDocument>,
) -> HashMap<String, serde_json::Value> {
    metadata
        .iter()
        .map(|(key, doc)| (key.clone(), doc_to_json(doc)))
        .collect()
}

/// Convert a Smithy Document to serde_json::Value
pub fn doc_to_json(doc: &SmithyDocument) -> serde_json::Value {
    match doc {
        SmithyDocument::String(s) => serde_json::Value::String(s.clone()),
        SmithyDocument::Number(n) => number_to_json(n),
        SmithyDocument::Bool(b) => serde_json::Value::Bool(*b),
        SmithyDocument::Null => serde_json::Value::Null,
        SmithyDocument::Array(arr) => serde_json::Value::Array(arr.iter().map(doc_to_json).collect()),
        SmithyDocument::Object(obj) => {
            let map: serde_json::Map<String, serde_json::Value> = obj
                .iter()
                .map(|(k, v)| (k.clone(), doc_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

// Integers keep their exact value; floats go through f64
fn number_to_json(n: &aws_smithy_types::Number) -> serde_json::Value {
    match n {
        aws_smithy_types::Number::PosInt(v) => serde_json::json!(v),
        aws_smithy_types::Number::NegInt(v) => serde_json::json!(v),
        other => serde_json::json!(other.to_f64_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_smithy_types::Number;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(
            doc_to_json(&SmithyDocument::String("s3://bucket/a.pdf".to_string())),
            serde_json::json!("s3://bucket/a.pdf")
        );
        assert_eq!(
            doc_to_json(&SmithyDocument::Number(Number::PosInt(3))),
            serde_json::json!(3)
        );
        assert_eq!(
            doc_to_json(&SmithyDocument::Number(Number::NegInt(-2))),
            serde_json::json!(-2)
        );
        assert_eq!(
            doc_to_json(&SmithyDocument::Number(Number::Float(1.5))),
            serde_json::json!(1.5)
        );
        assert_eq!(doc_to_json(&SmithyDocument::Null), serde_json::Value::Null);
    }

    #[test]
    fn test_nested_conversion() {
        let mut inner = HashMap::new();
        inner.insert("page".to_string(), SmithyDocument::Number(Number::PosInt(7)));

        let mut metadata = HashMap::new();
        metadata.insert(
            "x-amz-bedrock-kb-source-uri".to_string(),
            SmithyDocument::String("s3://docs/report.pdf".to_string()),
        );
        metadata.insert(
            "tags".to_string(),
            SmithyDocument::Array(vec![
                SmithyDocument::String("a".to_string()),
                SmithyDocument::Bool(true),
            ]),
        );
        metadata.insert("location".to_string(), SmithyDocument::Object(inner));

        let json = metadata_to_json(&metadata);

        assert_eq!(json["x-amz-bedrock-kb-source-uri"], "s3://docs/report.pdf");
        assert_eq!(json["tags"], serde_json::json!(["a", true]));
        assert_eq!(json["location"]["page"], 7);
    }
}
