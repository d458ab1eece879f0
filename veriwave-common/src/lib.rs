//! # Veriwave Common Library
//!
//! Shared code for the veriwave playback-review service:
//! - Event types (PlayerEvent enum)
//! - Playback tuning parameters
//! - Time and clock-display utilities
//! - Shared error type

pub mod error;
pub mod events;
pub mod params;
pub mod time;

pub use error::{Error, Result};
pub use params::PlaybackTuning;
