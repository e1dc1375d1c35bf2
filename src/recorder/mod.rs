//! Recording orchestration
//!
//! The coordinator drives platform capture channels, the mixer combines
//! audio tracks, and the muxer assembles the final container.

pub mod channel;
pub mod coordinator;
pub mod mixer;
pub mod muxer;
pub mod state;

pub use channel::{ChannelKind, RecordingChannel, RecordingError, RecordingResult};
pub use coordinator::{RecordingCoordinator, RecordingEvent};
pub use state::{RecordedBlob, RecordingConfig, RecordingOutput, RecordingState};
