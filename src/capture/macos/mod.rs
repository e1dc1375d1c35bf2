//! macOS capture implementations

pub mod permissions;
pub mod screen;
pub mod system_audio;
