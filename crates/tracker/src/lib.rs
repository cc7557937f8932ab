//! # Tracker
//!
//! Keeps the fleet and the selected vehicle up to date.
//!
//! [`FleetStream`] polls the whole fleet on a fixed interval, estimates
//! headings from consecutive positions and publishes the result through a
//! `watch` channel. [`DetailStream`] does the same for the one vehicle the
//! operator has selected, discarding responses that arrive after the
//! selection changed.

mod detail;
mod fleet;
mod heading;
mod memory;
mod settings;

pub use self::detail::*;
pub use self::fleet::*;
pub use self::heading::*;
pub use self::memory::*;
pub use self::settings::*;
