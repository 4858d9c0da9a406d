//! Inbound webhook payload validation.

use serde_json::{Map, Value};
use thiserror::Error;

/// Why an inbound body was rejected.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Precisa ser um JSON válido")]
    NotAnObject,
}

/// Decode `body` and accept it only if it is a JSON object.
///
/// Arrays, scalars, `null`, empty bodies and invalid JSON are all rejected.
/// The content type is not consulted.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, PayloadError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(PayloadError::NotAnObject),
    }
}
