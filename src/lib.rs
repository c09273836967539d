//! Frame-driven square-wave feeder for queued audio outputs
//!
//! Each frame the feeder tops the device queue back up to a target depth, so a
//! variable-rate display loop keeps a fixed-rate audio device neither starved nor
//! overfilled.

pub mod buffer;
pub mod config;
pub mod error;
pub mod feeder;
pub mod frame_loop;
pub mod gen;

// Platform abstraction layer
pub mod platform;

pub mod utils;

#[cfg(feature = "cli")]
pub mod input;

// Offline render to WAV
#[cfg(feature = "bounce")]
pub mod bounce;

pub use buffer::{SampleBuffer, BYTES_PER_SAMPLE};
pub use config::ToneConfig;
pub use error::{AudioError, ConfigError};
pub use feeder::{AudioFeeder, FeedState};
pub use frame_loop::{Action, FrameClock, FrameLoop, FrameReport};
pub use platform::{AudioDevice, DeviceSpec, SimulatedDevice};
