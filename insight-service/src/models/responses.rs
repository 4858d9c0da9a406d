//! Outgoing response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reply of the summary endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryResponse {
    /// The payload exactly as received.
    pub entrada: Map<String, Value>,
    /// Model text, verbatim.
    pub resumo_gerado: String,
}

impl SummaryResponse {
    pub fn new(entrada: Map<String, Value>, resumo_gerado: String) -> Self {
        Self {
            entrada,
            resumo_gerado,
        }
    }
}

/// Model output for the generation endpoint: parsed JSON when possible,
/// otherwise the raw text. Serialized without a tag.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum GeneratedData {
    Structured(Value),
    Raw(String),
}

impl GeneratedData {
    /// Best-effort parse of model text; never fails.
    pub fn from_model_output(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => GeneratedData::Structured(value),
            Err(_) => GeneratedData::Raw(text),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GeneratedData::Structured(_) => "structured",
            GeneratedData::Raw(_) => "raw",
        }
    }
}

/// Reply of the generation endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeneratedResponse {
    pub json_para_envio: GeneratedData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_becomes_structured() {
        let data = GeneratedData::from_model_output(r#"[{"a":1}]"#.to_string());
        assert_eq!(data, GeneratedData::Structured(json!([{ "a": 1 }])));
        assert_eq!(data.kind(), "structured");
    }

    #[test]
    fn invalid_json_stays_raw() {
        let data = GeneratedData::from_model_output("not json".to_string());
        assert_eq!(data, GeneratedData::Raw("not json".to_string()));
        assert_eq!(data.kind(), "raw");
    }

    #[test]
    fn fenced_json_is_not_unwrapped() {
        let text = "```json\n[1]\n```".to_string();
        assert_eq!(
            GeneratedData::from_model_output(text.clone()),
            GeneratedData::Raw(text)
        );
    }

    #[test]
    fn serializes_without_tag() {
        let structured = GeneratedResponse {
            json_para_envio: GeneratedData::Structured(json!([{ "a": 1 }])),
        };
        assert_eq!(
            serde_json::to_value(&structured).unwrap(),
            json!({ "json_para_envio": [{ "a": 1 }] })
        );

        let raw = GeneratedResponse {
            json_para_envio: GeneratedData::Raw("not json".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&raw).unwrap(),
            json!({ "json_para_envio": "not json" })
        );
    }
}
