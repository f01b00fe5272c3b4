//! v1 API Data Transfer Objects.
//!
//! These types define the wire format for the v1 REST API. They are kept
//! separate from the internal domain models in `src/models/` and handle
//! serialization, request validation, and domain-model conversion.

pub mod analysis;
pub mod jobs;

// Re-export all public types for convenient access via `dto::*`.
pub use analysis::*;
pub use jobs::*;
