//! Typed records for EVNEX API payloads
//!
//! Field names follow Rust conventions; the wire uses camelCase. Optional
//! wire fields are `Option`s, everything else is required so that a payload
//! with missing data fails validation instead of decoding to defaults.

pub mod charge_point;
pub mod command;
pub mod cost;
pub mod org;
pub mod schedule;
pub mod session;
pub mod user;
pub mod v3;

pub use charge_point::*;
pub use command::*;
pub use cost::*;
pub use org::*;
pub use schedule::*;
pub use session::*;
pub use user::*;
