//! Capture envelope decoding.
//!
//! The transport-level proxy replays one side's real traffic as a nested
//! JSON envelope: `{request: {..., body: "<json string>"}, response:
//! {status_code, ..., body: "<json string>"}}`. Embedded body strings may
//! carry a UTF-8 BOM prefix; both are parsed before any state is touched
//! so a malformed record is dropped whole.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::RelayError;
use crate::persistence::{CapturedRequest, CapturedResponse};

/// Wire shape of a capture envelope.
#[derive(Debug, Deserialize)]
pub struct CaptureEnvelope {
    /// Proxy-side flow identifier, informational only.
    #[serde(default)]
    pub flow_id: Option<String>,
    /// Captured request half.
    pub request: CaptureRequestPart,
    /// Captured response half.
    pub response: CaptureResponsePart,
}

/// Request half of the envelope; `body` is an embedded JSON string.
#[derive(Debug, Deserialize)]
pub struct CaptureRequestPart {
    /// HTTP method of the captured call.
    pub method: String,
    /// Full URL of the captured call.
    pub url: String,
    /// Headers, last-write-wins per name.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Embedded JSON body string, optionally BOM-prefixed.
    #[serde(default)]
    pub body: String,
}

/// Response half of the envelope; `body` is an embedded JSON string.
#[derive(Debug, Deserialize)]
pub struct CaptureResponsePart {
    /// HTTP status code of the captured response.
    pub status_code: u16,
    /// Headers, last-write-wins per name.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Embedded JSON body string, optionally BOM-prefixed.
    #[serde(default)]
    pub body: String,
}

impl CaptureEnvelope {
    /// Parses an envelope from an already-deserialized JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedEnvelope`] when the value does not
    /// have the envelope shape.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, RelayError> {
        serde_json::from_value(value.clone())
            .map_err(|e| RelayError::MalformedEnvelope(e.to_string()))
    }

    /// Decodes both embedded bodies into normalized request/response
    /// halves. Nothing is returned unless both parse.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedEnvelope`] if either embedded body
    /// string is not valid JSON after BOM stripping.
    pub fn decode(self) -> Result<(CapturedRequest, CapturedResponse), RelayError> {
        let request_body = parse_embedded_body(&self.request.body)
            .map_err(|e| RelayError::MalformedEnvelope(format!("request body: {e}")))?;
        let response_body = parse_embedded_body(&self.response.body)
            .map_err(|e| RelayError::MalformedEnvelope(format!("response body: {e}")))?;

        Ok((
            CapturedRequest {
                method: self.request.method,
                url: self.request.url,
                headers: self.request.headers,
                body: request_body,
            },
            CapturedResponse {
                status_code: self.response.status_code,
                headers: self.response.headers,
                body: response_body,
            },
        ))
    }
}

/// Strips a leading UTF-8 BOM, if present.
#[must_use]
pub fn strip_bom(raw: &str) -> &str {
    raw.strip_prefix('\u{feff}').unwrap_or(raw)
}

/// Parses an embedded body string. An empty body decodes to JSON null.
fn parse_embedded_body(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    let stripped = strip_bom(raw);
    if stripped.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(stripped)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope_value(response_body: &str) -> serde_json::Value {
        json!({
            "flow_id": "f-1",
            "request": {
                "method": "POST",
                "url": "https://gateway.example/xml/v1",
                "headers": {"x-request-id": "r1"},
                "body": "{\"createTransactionRequest\": {\"refId\": \"r1\"}}",
            },
            "response": {
                "status_code": 200,
                "headers": {"x-request-id": "r1"},
                "body": response_body,
            },
        })
    }

    #[test]
    fn strips_bom_before_parsing() {
        let value = envelope_value("\u{feff}{\"transactionResponse\": {\"responseCode\": \"1\"}}");
        let envelope = CaptureEnvelope::from_value(&value);
        let Ok(envelope) = envelope else {
            panic!("envelope parse failed");
        };
        let decoded = envelope.decode();
        let Ok((request, response)) = decoded else {
            panic!("decode failed");
        };
        assert!(request.body.get("createTransactionRequest").is_some());
        assert_eq!(
            response.body.pointer("/transactionResponse/responseCode").and_then(|v| v.as_str()),
            Some("1")
        );
    }

    #[test]
    fn malformed_embedded_body_fails_whole_record() {
        let value = envelope_value("{not json");
        let envelope = CaptureEnvelope::from_value(&value);
        let Ok(envelope) = envelope else {
            panic!("envelope parse failed");
        };
        assert!(matches!(envelope.decode(), Err(RelayError::MalformedEnvelope(_))));
    }

    #[test]
    fn missing_halves_are_malformed() {
        let value = json!({"request": {"method": "POST", "url": "u"}});
        assert!(matches!(
            CaptureEnvelope::from_value(&value),
            Err(RelayError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn empty_body_decodes_to_null() {
        let value = envelope_value("");
        let envelope = CaptureEnvelope::from_value(&value);
        let Ok(envelope) = envelope else {
            panic!("envelope parse failed");
        };
        let decoded = envelope.decode();
        let Ok((_, response)) = decoded else {
            panic!("decode failed");
        };
        assert!(response.body.is_null());
    }
}
