//! Message classification heuristics.
//!
//! Classification is an ordered table of named predicate rules evaluated
//! first-match-wins. Order matters: some bodies satisfy several heuristics
//! (a gateway transaction request also carries generic request-shape
//! fields), so earlier rules are the more specific ones. The table is a
//! plain slice so new rules slot in without touching the evaluator.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Source;

/// Classified shape of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Generic outbound request shape.
    Request,
    /// Generic response shape.
    Response,
    /// Gateway transaction-creation request: the pairable payment call
    /// both systems under test are expected to make.
    PaymentRequest,
    /// Webhook-style notification from the gateway back to a merchant.
    WebhookResponse,
    /// Capture envelope holding both a request and a response, produced
    /// by the transport-level proxy replaying one side's real traffic.
    RequestResponsePair,
    /// No heuristic matched. Never an error; logged and retained.
    Unknown,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::PaymentRequest => "payment_request",
            Self::WebhookResponse => "webhook_response",
            Self::RequestResponsePair => "request_response_pair",
            Self::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Everything a classification rule may inspect.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    /// Parsed message body.
    pub body: &'a Value,
    /// Lowercased header map.
    pub headers: &'a HashMap<String, String>,
    /// HTTP method of the inbound call.
    pub method: &'a str,
}

/// One entry in the ordered rule table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    /// Rule name, used in trace output when the rule fires.
    pub name: &'static str,
    /// Returns `Some(kind)` when the rule matches.
    pub apply: fn(&ClassifierInput<'_>) -> Option<MessageKind>,
}

/// Fixed-priority rule table. First match wins.
const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "explicit_type_field",
        apply: explicit_type_field,
    },
    ClassificationRule {
        name: "webhook_fields",
        apply: webhook_fields,
    },
    ClassificationRule {
        name: "gateway_transaction_fields",
        apply: gateway_transaction_fields,
    },
    ClassificationRule {
        name: "status_fields",
        apply: status_fields,
    },
    ClassificationRule {
        name: "request_shape_fields",
        apply: request_shape_fields,
    },
    ClassificationRule {
        name: "capture_envelope_shape",
        apply: capture_envelope_shape,
    },
    ClassificationRule {
        name: "header_hints",
        apply: header_hints,
    },
];

fn explicit_type_field(input: &ClassifierInput<'_>) -> Option<MessageKind> {
    match input.body.get("type").and_then(Value::as_str) {
        Some(t) if t.eq_ignore_ascii_case("request") => Some(MessageKind::Request),
        Some(t) if t.eq_ignore_ascii_case("response") => Some(MessageKind::Response),
        _ => None,
    }
}

fn webhook_fields(input: &ClassifierInput<'_>) -> Option<MessageKind> {
    let body = input.body;
    let has_event = body.get("eventType").is_some() || body.get("webhookId").is_some();
    let merchant_event = body.get("merchantId").is_some() && body.get("eventId").is_some();
    (has_event || merchant_event).then_some(MessageKind::WebhookResponse)
}

fn gateway_transaction_fields(input: &ClassifierInput<'_>) -> Option<MessageKind> {
    let body = input.body;
    (body.get("createTransactionRequest").is_some() || body.get("transactionRequest").is_some())
        .then_some(MessageKind::PaymentRequest)
}

fn status_fields(input: &ClassifierInput<'_>) -> Option<MessageKind> {
    let body = input.body;
    let has_status = body.get("status").is_some()
        || body.get("statusCode").is_some()
        || body.get("responseCode").is_some()
        || body.get("transactionResponse").is_some();
    has_status.then_some(MessageKind::Response)
}

fn request_shape_fields(input: &ClassifierInput<'_>) -> Option<MessageKind> {
    let body = input.body;
    let has_shape =
        body.get("method").is_some() || body.get("url").is_some() || body.get("endpoint").is_some();
    has_shape.then_some(MessageKind::Request)
}

fn capture_envelope_shape(input: &ClassifierInput<'_>) -> Option<MessageKind> {
    let request = input.body.get("request");
    let response = input.body.get("response");
    matches!((request, response), (Some(Value::Object(_)), Some(Value::Object(_))))
        .then_some(MessageKind::RequestResponsePair)
}

fn header_hints(input: &ClassifierInput<'_>) -> Option<MessageKind> {
    let find = |name: &str| {
        input
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.to_ascii_lowercase())
    };

    for header in ["x-message-type", "x-state", "content-type"] {
        if let Some(value) = find(header) {
            if value.contains("response") {
                return Some(MessageKind::Response);
            }
            if value.contains("request") {
                return Some(MessageKind::Request);
            }
        }
    }

    if let Some(agent) = find("user-agent")
        && (agent.contains("webhook") || agent.contains("gateway-backend"))
    {
        return Some(MessageKind::WebhookResponse);
    }

    None
}

/// Stateless classifier for inbound messages.
///
/// Holds only the configured header names; every method is deterministic
/// and side-effect free.
#[derive(Debug, Clone)]
pub struct MessageClassifier {
    correlation_header: String,
    source_header: String,
    connector_source_value: String,
}

impl MessageClassifier {
    /// Creates a classifier with the given header configuration.
    #[must_use]
    pub fn new(
        correlation_header: impl Into<String>,
        source_header: impl Into<String>,
        connector_source_value: impl Into<String>,
    ) -> Self {
        Self {
            correlation_header: correlation_header.into().to_ascii_lowercase(),
            source_header: source_header.into().to_ascii_lowercase(),
            connector_source_value: connector_source_value.into(),
        }
    }

    /// Classifies a message by running the rule table in priority order.
    #[must_use]
    pub fn classify(&self, body: &Value, headers: &HashMap<String, String>, method: &str) -> MessageKind {
        let input = ClassifierInput { body, headers, method };
        for rule in RULES {
            if let Some(kind) = (rule.apply)(&input) {
                tracing::debug!(rule = rule.name, kind = %kind, "classified message");
                return kind;
            }
        }
        MessageKind::Unknown
    }

    /// Determines which system produced a message.
    ///
    /// The designated source header marks the new connector service;
    /// everything else is attributed to the legacy orchestrator.
    #[must_use]
    pub fn detect_source(&self, headers: &HashMap<String, String>) -> Source {
        let marked = headers
            .iter()
            .any(|(k, v)| {
                k.eq_ignore_ascii_case(&self.source_header) && v == &self.connector_source_value
            });
        if marked { Source::Connector } else { Source::Orchestrator }
    }

    /// Extracts the correlation ID for pairing.
    ///
    /// Priority: the correlation header, then gateway-specific body fields
    /// in fixed order. Returns `None` when no explicit ID is present; the
    /// caller may substitute [`MessageClassifier::generate_fallback_id`]
    /// for record keeping, but a fallback ID can never pair (both sides
    /// would generate different ones).
    #[must_use]
    pub fn extract_correlation_id(
        &self,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> Option<String> {
        if let Some(id) = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&self.correlation_header))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
        {
            return Some(id.to_string());
        }

        const BODY_FIELDS: &[&[&str]] = &[
            &["refId"],
            &["createTransactionRequest", "refId"],
            &["transactionResponse", "transId"],
        ];
        for path in BODY_FIELDS {
            let mut cursor = body;
            let mut found = true;
            for segment in *path {
                match cursor.get(segment) {
                    Some(next) => cursor = next,
                    None => {
                        found = false;
                        break;
                    }
                }
            }
            if found && let Some(id) = cursor.as_str().map(str::trim).filter(|v| !v.is_empty()) {
                return Some(id.to_string());
            }
        }

        None
    }

    /// Generates a unique fallback identifier (millis timestamp plus a
    /// random suffix). Never collides with a real header-based ID and
    /// never used for pairing.
    #[must_use]
    pub fn generate_fallback_id(&self) -> String {
        format!(
            "gen-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().simple()
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classifier() -> MessageClassifier {
        MessageClassifier::new("x-request-id", "x-source", "connector-service")
    }

    fn no_headers() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn explicit_type_wins_over_everything() {
        // Body also satisfies the status heuristic; rule order decides.
        let body = json!({"type": "Request", "status": "ok"});
        let kind = classifier().classify(&body, &no_headers(), "POST");
        assert_eq!(kind, MessageKind::Request);
    }

    #[test]
    fn webhook_fields_beat_gateway_fields() {
        let body = json!({"eventType": "net.payment.created", "createTransactionRequest": {}});
        let kind = classifier().classify(&body, &no_headers(), "POST");
        assert_eq!(kind, MessageKind::WebhookResponse);
    }

    #[test]
    fn gateway_transaction_is_payment_request() {
        let body = json!({"createTransactionRequest": {"refId": "r1"}});
        let kind = classifier().classify(&body, &no_headers(), "POST");
        assert_eq!(kind, MessageKind::PaymentRequest);
    }

    #[test]
    fn status_fields_classify_as_response() {
        let body = json!({"responseCode": "1"});
        let kind = classifier().classify(&body, &no_headers(), "POST");
        assert_eq!(kind, MessageKind::Response);
    }

    #[test]
    fn request_shape_classifies_as_request() {
        let body = json!({"method": "POST", "endpoint": "/v1/charges"});
        let kind = classifier().classify(&body, &no_headers(), "POST");
        assert_eq!(kind, MessageKind::Request);
    }

    #[test]
    fn nested_request_response_is_capture_envelope() {
        let body = json!({"request": {"method": "POST"}, "response": {"status_code": 200}});
        // Note: the embedded request carries no top-level request-shape or
        // status fields, so earlier rules pass it by.
        let kind = classifier().classify(&body, &no_headers(), "POST");
        assert_eq!(kind, MessageKind::RequestResponsePair);
    }

    #[test]
    fn header_hint_fallback() {
        let headers =
            HashMap::from([("x-state".to_string(), "response".to_string())]);
        let kind = classifier().classify(&json!({}), &headers, "POST");
        assert_eq!(kind, MessageKind::Response);

        let headers =
            HashMap::from([("user-agent".to_string(), "gateway-webhook/2.1".to_string())]);
        let kind = classifier().classify(&json!({}), &headers, "POST");
        assert_eq!(kind, MessageKind::WebhookResponse);
    }

    #[test]
    fn unmatched_body_is_unknown() {
        let kind = classifier().classify(&json!({"foo": 1}), &no_headers(), "GET");
        assert_eq!(kind, MessageKind::Unknown);
    }

    #[test]
    fn source_detection_requires_exact_value() {
        let c = classifier();
        let connector =
            HashMap::from([("x-source".to_string(), "connector-service".to_string())]);
        assert_eq!(c.detect_source(&connector), Source::Connector);

        let other = HashMap::from([("x-source".to_string(), "something-else".to_string())]);
        assert_eq!(c.detect_source(&other), Source::Orchestrator);
        assert_eq!(c.detect_source(&no_headers()), Source::Orchestrator);
    }

    #[test]
    fn correlation_id_prefers_header() {
        let c = classifier();
        let headers = HashMap::from([("X-Request-Id".to_string(), "hdr-1".to_string())]);
        let body = json!({"refId": "body-1"});
        assert_eq!(c.extract_correlation_id(&headers, &body).as_deref(), Some("hdr-1"));
    }

    #[test]
    fn correlation_id_falls_back_to_body_fields_in_order() {
        let c = classifier();
        let body = json!({"createTransactionRequest": {"refId": "nested-1"}});
        assert_eq!(
            c.extract_correlation_id(&no_headers(), &body).as_deref(),
            Some("nested-1")
        );

        let body = json!({"refId": "flat-1", "createTransactionRequest": {"refId": "nested-1"}});
        assert_eq!(
            c.extract_correlation_id(&no_headers(), &body).as_deref(),
            Some("flat-1")
        );

        let body = json!({"transactionResponse": {"transId": "t-9"}});
        assert_eq!(
            c.extract_correlation_id(&no_headers(), &body).as_deref(),
            Some("t-9")
        );
    }

    #[test]
    fn missing_correlation_id_is_none() {
        let c = classifier();
        assert_eq!(c.extract_correlation_id(&no_headers(), &json!({})), None);
        // Blank header values do not count as IDs.
        let headers = HashMap::from([("x-request-id".to_string(), "  ".to_string())]);
        assert_eq!(c.extract_correlation_id(&headers, &json!({})), None);
    }

    #[test]
    fn fallback_ids_never_collide() {
        let c = classifier();
        assert_ne!(c.generate_fallback_id(), c.generate_fallback_id());
    }
}
