//! EVNEX Core Library
//!
//! Wire schema, envelope decoding and the error taxonomy for the EVNEX
//! charge point API. Nothing in this crate performs I/O; the HTTP client
//! lives in `evnexctl`.

pub mod envelope;
pub mod error;
pub mod model;
pub mod schema;
pub mod status;

// Re-export commonly used types
pub use envelope::{decode, decode_collection, decode_resource, Envelope, Items, Resource};
pub use error::*;
pub use model::{parse_model, ModelInfo};
pub use schema::v3::ChargePointDetailV3;
pub use schema::*;
pub use status::DeviceStatus;
