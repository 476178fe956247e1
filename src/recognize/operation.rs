use serde::{Deserialize, Serialize};

/// Long-running recognition operation as reported by the provider.
///
/// Once `done` is true the operation is terminal: it carries either a
/// top-level error, or a response whose per-file entries may themselves
/// carry errors. Failures must be checked at both levels.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<OperationResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

impl OperationError {
    /// Human-readable message, with a fallback when the provider sent none.
    pub fn describe(&self) -> String {
        if self.message.trim().is_empty() {
            match self.code {
                Some(code) => format!("recognition failed with code {}", code),
                None => "recognition failed without an error message".to_string(),
            }
        } else {
            self.message.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationResponse {
    /// Per-file results keyed by input URI. Kept as ordered pairs so that
    /// "first error encountered wins" follows the provider's map order.
    #[serde(default, deserialize_with = "ordered_results")]
    pub results: Vec<(String, FileResult)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub uri: Option<String>,
}

fn ordered_results<'de, D>(deserializer: D) -> Result<Vec<(String, FileResult)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct ResultsVisitor;

    impl<'de> serde::de::Visitor<'de> for ResultsVisitor {
        type Value = Vec<(String, FileResult)>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a map of input uri to per-file result")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut entries = Vec::new();
            while let Some(entry) = map.next_entry::<String, FileResult>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(ResultsVisitor)
}

/// The provider returns an operation either as a bare object or as a
/// one-element array wrapping it; both shapes are accepted and normalized
/// here, at the boundary.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OperationEnvelope {
    One(Operation),
    Many(Vec<Operation>),
}

impl OperationEnvelope {
    pub fn into_operation(self) -> anyhow::Result<Operation> {
        match self {
            OperationEnvelope::One(operation) => Ok(operation),
            OperationEnvelope::Many(mut operations) => {
                if operations.is_empty() {
                    anyhow::bail!("provider returned an empty operation list");
                }
                Ok(operations.remove(0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_object_shape() {
        let json = r#"{"name": "operations/abc123", "done": false}"#;
        let operation = serde_json::from_str::<OperationEnvelope>(json)
            .unwrap()
            .into_operation()
            .unwrap();
        assert_eq!(operation.name, "operations/abc123");
        assert!(!operation.done);
        assert!(operation.error.is_none());
        assert!(operation.response.is_none());
    }

    #[test]
    fn test_operation_array_shape() {
        let json = r#"[{"name": "operations/abc123", "done": true}]"#;
        let operation = serde_json::from_str::<OperationEnvelope>(json)
            .unwrap()
            .into_operation()
            .unwrap();
        assert_eq!(operation.name, "operations/abc123");
        assert!(operation.done);
    }

    #[test]
    fn test_empty_operation_array_errors() {
        let envelope = serde_json::from_str::<OperationEnvelope>("[]").unwrap();
        assert!(envelope.into_operation().is_err());
    }

    #[test]
    fn test_top_level_error_parsed() {
        let json = r#"{
            "name": "operations/abc123",
            "done": true,
            "error": {"code": 3, "message": "audio file is unreadable"}
        }"#;
        let operation: Operation = serde_json::from_str(json).unwrap();
        let error = operation.error.unwrap();
        assert_eq!(error.code, Some(3));
        assert_eq!(error.describe(), "audio file is unreadable");
    }

    #[test]
    fn test_per_file_results_preserve_document_order() {
        let json = r#"{
            "name": "operations/abc123",
            "done": true,
            "response": {
                "results": {
                    "store://uploads/b.wav": {"error": {"message": "first"}},
                    "store://uploads/a.wav": {"error": {"message": "second"}}
                }
            }
        }"#;
        let operation: Operation = serde_json::from_str(json).unwrap();
        let results = &operation.response.unwrap().results;
        assert_eq!(results.len(), 2);
        // Document order, not key order
        assert_eq!(results[0].0, "store://uploads/b.wav");
        assert_eq!(results[0].1.error.as_ref().unwrap().message, "first");
        assert_eq!(results[1].0, "store://uploads/a.wav");
    }

    #[test]
    fn test_response_without_results() {
        let json = r#"{"name": "operations/abc123", "done": true, "response": {}}"#;
        let operation: Operation = serde_json::from_str(json).unwrap();
        assert!(operation.response.unwrap().results.is_empty());
    }

    #[test]
    fn test_describe_fallbacks() {
        let error = OperationError {
            code: Some(13),
            message: String::new(),
        };
        assert_eq!(error.describe(), "recognition failed with code 13");

        let error = OperationError {
            code: None,
            message: "  ".to_string(),
        };
        assert_eq!(error.describe(), "recognition failed without an error message");
    }
}
