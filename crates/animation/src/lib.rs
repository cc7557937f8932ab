//! # Animation
//!
//! Moves vehicle markers smoothly between polled samples.
//!
//! Each fleet poll is handed to [`MapLayer::update`], which mounts and
//! unmounts markers and asks the [`AnimationEngine`] to start an
//! [`AnimationTask`] for every vehicle that moved or turned. The host calls
//! [`MapLayer::tick`] once per frame; each tick advances every active task
//! by at most one step and pushes the interpolated position and rotated icon
//! to the marker.

mod easing;
mod engine;
mod icon;
mod layer;
mod marker;
mod task;

pub use self::easing::*;
pub use self::engine::*;
pub use self::icon::*;
pub use self::layer::*;
pub use self::marker::*;
pub use self::task::*;
