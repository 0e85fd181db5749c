//! # parity-relay
//!
//! Correlation relay for verifying that two payment-gateway connector
//! implementations produce equivalent HTTP traffic.
//!
//! Both systems under test point their gateway traffic at this service.
//! Each inbound message is classified, matched against its counterpart
//! from the other system by correlation ID, and retained as a pair.
//! Pairs can then be diffed field by field to surface behavioral drift
//! between the implementations. Captured gateway responses are stored
//! so a blocked connector-side call can be answered with the response
//! the legacy side actually received.
//!
//! ## Architecture
//!
//! ```text
//! Legacy orchestrator ──┐
//!                       ├── POST /receive (api/)
//! Connector service ────┘
//!     │
//!     ├── MessageClassifier (domain/)
//!     ├── PendingRequestTable → PairRegistry (domain/)
//!     ├── RelayService + ResponseWaiter (service/)
//!     ├── DiffEngine (diff/)
//!     │
//!     └── CorrelationStore: memory or PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod diff;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
