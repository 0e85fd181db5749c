//! Domain layer: messages, classification, pairing, and registries.
//!
//! This module contains the relay's core model: observed messages and
//! their identity, the classification rule table, the pending table that
//! performs the atomic pairing check-and-insert, and the registries that
//! hold raw messages and completed pairs.

pub mod classifier;
pub mod message;
pub mod message_log;
pub mod pair;
pub mod pair_registry;
pub mod pending;

pub use classifier::{ClassificationRule, ClassifierInput, MessageClassifier, MessageKind};
pub use message::{Message, MessageId, Source};
pub use message_log::MessageLog;
pub use pair::{Pair, PairId, PairMetadata};
pub use pair_registry::PairRegistry;
pub use pending::{Offer, PendingEntry, PendingRequestTable};
