//! Audio decode, resample and device output

pub mod decoder;
pub mod output;
pub mod resample;
pub mod transport;

pub use decoder::DecodedAudio;
pub use transport::{AudioTransport, OpenedMedia};
