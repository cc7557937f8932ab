//! # Realtime Core
//!
//! Error taxonomy and external data interfaces shared by the fleet dashboard
//! crates.

mod error;
mod provider;

pub use crate::error::*;
pub use crate::provider::*;
