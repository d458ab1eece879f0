//! # Veriwave Player Library
//!
//! Exclusive playback coordination for reviewing an analyzed recording.
//!
//! **Purpose:** turn one audio recording plus an upstream synthetic-speech
//! analysis report into a set of playable units (the whole track and one
//! unit per suspicious segment) that share a single transport under a
//! strict one-active-unit rule, with continuous progress sampling and an
//! HTTP/SSE control surface for host views.

pub mod analysis;
pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
pub use playback::{PlaybackCoordinator, PlayerSession};
