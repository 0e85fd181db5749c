//! Relay service: the ingestion pipeline and management operations.
//!
//! [`RelayService`] is the coordination layer: it classifies inbound
//! messages, drives the pairing check through the pending table, persists
//! capture envelopes into the correlation store (which is what wakes a
//! blocked counterpart), and serves compare/clear/stats management calls.
//! Constructed once per process and injected everywhere; no ambient
//! singletons, so tests get clean isolated instances.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::config::RelayConfig;
use crate::diff::{DiffEngine, DiffReport};
use crate::domain::{
    Message, MessageClassifier, MessageId, MessageKind, MessageLog, Offer, Pair, PairId,
    PairRegistry, PendingRequestTable, Source,
};
use crate::error::RelayError;
use crate::persistence::{CorrelationRecord, CorrelationStore};
use crate::service::capture::CaptureEnvelope;
use crate::service::waiter::ResponseWaiter;

/// Summary of one ingested message, echoed back to the sender.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    /// Ingestion identifier of the recorded message.
    pub message_id: MessageId,
    /// Classified kind.
    pub kind: MessageKind,
    /// Detected source system.
    pub source: Source,
    /// Correlation ID used for pairing, if one was extracted. When
    /// absent, `display_id` carries a generated token instead.
    pub correlation_id: Option<String>,
    /// Identifier for log correlation; a generated fallback when no real
    /// correlation ID exists (never used for pairing).
    pub display_id: String,
    /// Whether this ingestion completed a pair.
    pub paired: bool,
    /// The completed pair's ID, when one was formed.
    pub pair_id: Option<PairId>,
}

/// What the ingestion endpoint should do next.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Acknowledge immediately.
    Acknowledged(IngestSummary),
    /// The message is a blocked connector-side payment call: suspend the
    /// caller on the [`ResponseWaiter`] for this correlation ID.
    AwaitCounterpart {
        /// ID to wait on.
        correlation_id: String,
        /// Ingestion summary for the ack path.
        summary: IngestSummary,
    },
}

/// Equality comparison of the paired messages' transport metadata.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataComparison {
    /// Both sides used the same HTTP method.
    pub method_matches: bool,
    /// Both sides called the same URL.
    pub url_matches: bool,
    /// Both sides classified to the same kind.
    pub kind_matches: bool,
}

/// Output of comparing a pair on demand.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    /// The compared pair (with `compared` set).
    pub pair: Pair,
    /// Structural diff of the two sides' headers.
    pub headers: DiffReport,
    /// Structural diff of the two sides' bodies.
    pub body: DiffReport,
    /// Transport metadata equality.
    pub metadata: MetadataComparison,
    /// Match percentage folded across headers and body.
    pub match_percentage: u8,
    /// `true` when headers and body are structurally identical and all
    /// metadata matches.
    pub identical: bool,
}

/// Bulk counters for the management surface.
#[derive(Debug, Clone, Serialize)]
pub struct RelayStats {
    /// Total ingested messages.
    pub messages: usize,
    /// Messages not consumed into a pair this epoch.
    pub unpaired: usize,
    /// Live pending entries awaiting a counterpart.
    pub pending: usize,
    /// Completed pairs.
    pub pairs: usize,
    /// Pairs that have been diffed.
    pub compared: usize,
}

/// Coordination layer over the pairing pipeline and the diff engine.
#[derive(Debug)]
pub struct RelayService {
    classifier: MessageClassifier,
    pending: PendingRequestTable,
    registry: PairRegistry,
    log: MessageLog,
    store: Arc<dyn CorrelationStore>,
    waiter: ResponseWaiter,
    diff: DiffEngine,
}

impl RelayService {
    /// Builds a service from configuration and an injected store.
    #[must_use]
    pub fn new(config: &RelayConfig, store: Arc<dyn CorrelationStore>) -> Self {
        let classifier = MessageClassifier::new(
            &config.correlation_header,
            &config.source_header,
            &config.connector_source_value,
        );
        let waiter = ResponseWaiter::new(
            Arc::clone(&store),
            config.wait_poll_interval,
            config.wait_poll_attempts,
            &config.correlation_header,
        );
        Self {
            classifier,
            pending: PendingRequestTable::new(config.pending_ttl),
            registry: PairRegistry::new(),
            log: MessageLog::new(),
            store,
            waiter,
            diff: DiffEngine::new(&config.ignored_fields),
        }
    }

    /// Returns the waiter used for blocked connector-side requests.
    #[must_use]
    pub fn waiter(&self) -> &ResponseWaiter {
        &self.waiter
    }

    /// Ingests one inbound message from either system.
    ///
    /// Classifies the message, records it, runs the pairing check, and
    /// tells the caller whether to acknowledge immediately or suspend on
    /// the counterpart.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedEnvelope`] for capture envelopes
    /// whose embedded bodies do not parse or carry no correlation ID.
    pub async fn ingest(
        &self,
        method: &str,
        path: &str,
        headers: HashMap<String, String>,
        body: Value,
    ) -> Result<IngestOutcome, RelayError> {
        let kind = self.classifier.classify(&body, &headers, method);

        if kind == MessageKind::RequestResponsePair {
            let summary = self.ingest_capture(&body).await?;
            return Ok(IngestOutcome::Acknowledged(summary));
        }

        let source = self.classifier.detect_source(&headers);
        let correlation_id = self.classifier.extract_correlation_id(&headers, &body);
        let url = body
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or(path)
            .to_string();

        let message = Message {
            id: MessageId::new(),
            correlation_id: correlation_id.clone(),
            timestamp: Utc::now(),
            method: method.to_string(),
            url,
            headers,
            body,
            kind,
            source,
            paired: false,
        };

        let summary = self.record_and_offer(message).await?;

        if source == Source::Connector && kind == MessageKind::PaymentRequest {
            if let Some(correlation_id) = correlation_id {
                return Ok(IngestOutcome::AwaitCounterpart {
                    correlation_id,
                    summary,
                });
            }
            // Without a correlation ID there is nothing to wait on.
            tracing::info!(
                message_id = %summary.message_id,
                "connector payment request has no correlation id; acknowledging"
            );
        }

        Ok(IngestOutcome::Acknowledged(summary))
    }

    /// Ingests a capture envelope: persists the record (the store write
    /// is what wakes any in-flight waiter) and offers the captured
    /// request side for pairing.
    async fn ingest_capture(&self, body: &Value) -> Result<IngestSummary, RelayError> {
        let envelope = CaptureEnvelope::from_value(body)?;
        let flow_id = envelope.flow_id.clone();
        let (request, response) = envelope.decode()?;

        let correlation_id = self
            .classifier
            .extract_correlation_id(&request.headers, &request.body)
            .ok_or_else(|| {
                RelayError::MalformedEnvelope(format!(
                    "no correlation id in captured request (flow {})",
                    flow_id.as_deref().unwrap_or("<unknown>")
                ))
            })?;

        let record = CorrelationRecord {
            correlation_id: correlation_id.clone(),
            request: request.clone(),
            response,
            stored_at: Utc::now(),
        };
        // Store failure degrades persistence for this record only; the
        // captured request can still pair in memory.
        if let Err(err) = self.store.put(record).await {
            tracing::error!(%correlation_id, error = %err, "failed to persist capture record");
        } else {
            tracing::info!(%correlation_id, "capture record stored");
        }

        let kind = self
            .classifier
            .classify(&request.body, &request.headers, &request.method);
        let source = self.classifier.detect_source(&request.headers);
        let message = Message {
            id: MessageId::new(),
            correlation_id: Some(correlation_id),
            timestamp: Utc::now(),
            method: request.method,
            url: request.url,
            headers: request.headers,
            body: request.body,
            kind,
            source,
            paired: false,
        };

        self.record_and_offer(message).await
    }

    /// Records a message in the log and runs the pairing check.
    async fn record_and_offer(&self, message: Message) -> Result<IngestSummary, RelayError> {
        let message_id = message.id;
        let kind = message.kind;
        let source = message.source;
        let correlation_id = message.correlation_id.clone();
        let display_id = correlation_id
            .clone()
            .unwrap_or_else(|| self.classifier.generate_fallback_id());

        self.log.record(message.clone()).await;

        let (paired, pair_id) = match self.pending.offer(message).await {
            Offer::Matched { counterpart, offered } => {
                let id = self.finalize_pair(counterpart, offered).await?;
                (true, Some(id))
            }
            Offer::Pending | Offer::Unpairable => (false, None),
        };

        Ok(IngestSummary {
            message_id,
            kind,
            source,
            correlation_id,
            display_id,
            paired,
            pair_id,
        })
    }

    /// Builds and registers a pair from two matched messages.
    async fn finalize_pair(
        &self,
        counterpart: Message,
        offered: Message,
    ) -> Result<PairId, RelayError> {
        let correlation_id = offered
            .correlation_id
            .clone()
            .ok_or_else(|| RelayError::Internal("matched message without correlation id".to_string()))?;

        let counterpart_id = counterpart.id;
        let offered_id = offered.id;
        let sequence = self.registry.next_sequence();
        let pair = Pair::from_sides(correlation_id, sequence, counterpart, offered)
            .map_err(RelayError::Internal)?;
        let pair_id = pair.id;

        self.log.mark_paired(counterpart_id).await;
        self.log.mark_paired(offered_id).await;
        self.registry.register(pair).await;
        Ok(pair_id)
    }

    /// Returns all pairs in creation order.
    pub async fn list_pairs(&self) -> Vec<Pair> {
        self.registry.list_all().await
    }

    /// Returns one pair.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PairNotFound`] if the ID is unknown.
    pub async fn get_pair(&self, id: PairId) -> Result<Pair, RelayError> {
        self.registry
            .find(id)
            .await
            .ok_or_else(|| RelayError::PairNotFound(id.to_string()))
    }

    /// Diffs a pair's two sides on demand.
    ///
    /// Headers and bodies are compared structurally through the ignore
    /// list; method, URL, and kind are compared for equality. Marks the
    /// pair compared.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PairNotFound`] if the ID is unknown.
    pub async fn compare_pair(&self, id: PairId) -> Result<ComparisonResult, RelayError> {
        let pair = self.registry.mark_compared(id).await?;

        let headers = self.diff.compare(
            &headers_to_value(&pair.side_a.headers),
            &headers_to_value(&pair.side_b.headers),
            "headers",
        );
        let body = self
            .diff
            .compare(&pair.side_a.body, &pair.side_b.body, "body");

        let metadata = MetadataComparison {
            method_matches: pair.side_a.method.eq_ignore_ascii_case(&pair.side_b.method),
            url_matches: pair.side_a.url == pair.side_b.url,
            kind_matches: pair.side_a.kind == pair.side_b.kind,
        };

        let mut folded = DiffReport::new();
        folded.absorb(headers.clone());
        folded.absorb(body.clone());
        let match_percentage = folded.match_percentage();
        let identical = folded.identical()
            && metadata.method_matches
            && metadata.url_matches
            && metadata.kind_matches;

        tracing::info!(pair_id = %id, match_percentage, identical, "pair compared");

        Ok(ComparisonResult {
            pair,
            headers,
            body,
            metadata,
            match_percentage,
            identical,
        })
    }

    /// Destroys all pairs and resets `paired` flags on retained raw
    /// messages, starting a fresh pairing epoch. Pending entries and
    /// stored records survive.
    pub async fn clear_pairs(&self) {
        self.registry.clear().await;
        self.log.reset_paired_flags().await;
        tracing::info!("pairs cleared; new pairing epoch");
    }

    /// Clears every piece of relay state: messages, pending entries,
    /// pairs, and stored correlation records.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StoreUnavailable`] if the store clear fails;
    /// in-memory state is cleared regardless.
    pub async fn clear_all(&self) -> Result<(), RelayError> {
        self.registry.clear().await;
        self.log.clear().await;
        self.pending.clear().await;
        self.store.clear().await?;
        tracing::info!("all relay state cleared");
        Ok(())
    }

    /// Returns bulk counters.
    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            messages: self.log.len().await,
            unpaired: self.log.unpaired_count().await,
            pending: self.pending.len().await,
            pairs: self.registry.len().await,
            compared: self.registry.compared_count().await,
        }
    }

    /// Returns all ingested messages in arrival order.
    pub async fn list_messages(&self) -> Vec<Message> {
        self.log.list().await
    }

    /// Returns all live correlation records, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StoreUnavailable`] on store failure.
    pub async fn list_records(&self) -> Result<Vec<CorrelationRecord>, RelayError> {
        self.store.list_all().await
    }

    /// Returns one correlation record.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RecordNotFound`] if absent or expired, or
    /// [`RelayError::StoreUnavailable`] on store failure.
    pub async fn get_record(&self, correlation_id: &str) -> Result<CorrelationRecord, RelayError> {
        self.store
            .get(correlation_id)
            .await?
            .ok_or_else(|| RelayError::RecordNotFound(correlation_id.to_string()))
    }

    /// Removes one correlation record.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RecordNotFound`] if absent or expired, or
    /// [`RelayError::StoreUnavailable`] on store failure.
    pub async fn remove_record(&self, correlation_id: &str) -> Result<(), RelayError> {
        if self.store.remove(correlation_id).await? {
            Ok(())
        } else {
            Err(RelayError::RecordNotFound(correlation_id.to_string()))
        }
    }
}

/// Lowers a header map into a JSON object for structural comparison.
fn headers_to_value(headers: &HashMap<String, String>) -> Value {
    Value::Object(
        headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
