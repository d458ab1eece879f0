//! Exclusive playback coordination

pub mod boundary;
pub mod coordinator;
pub mod scheduler;
pub mod session;
pub mod transport;
pub mod unit;
pub mod waveform;

pub use boundary::Window;
pub use coordinator::PlaybackCoordinator;
pub use scheduler::ProgressScheduler;
pub use session::PlayerSession;
pub use transport::{ManualTransport, Transport};
pub use unit::MediaUnit;
pub use waveform::WaveformPresenter;
