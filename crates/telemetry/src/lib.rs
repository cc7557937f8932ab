//! # Telemetry
//!
//! Fetches device lists and per-device telemetry snapshots from the
//! telemetry source and normalizes them into canonical vehicle records.
//!
//! Every public fetch in this crate is best-effort: failures are logged and
//! replaced by fallback records rather than returned to the caller.

mod fallback;
mod model;
mod normalize;
mod raw;
mod source;

pub use self::fallback::*;
pub use self::model::*;
pub use self::normalize::*;
pub use self::raw::*;
pub use self::source::*;
pub use realtime::{Config, Error, HttpRequest, Identity, Provider, Result};
