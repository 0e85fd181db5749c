//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod ingest_dto;
pub mod pair_dto;
pub mod record_dto;

pub use common_dto::*;
pub use ingest_dto::*;
pub use pair_dto::*;
pub use record_dto::*;
