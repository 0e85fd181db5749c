//! Service layer: ingestion pipeline, capture decoding, and the
//! response waiter protocol.

pub mod capture;
pub mod relay_service;
pub mod waiter;

pub use capture::CaptureEnvelope;
pub use relay_service::{
    ComparisonResult, IngestOutcome, IngestSummary, MetadataComparison, RelayService, RelayStats,
};
pub use waiter::{ResponseWaiter, WaitOutcome};
