//! Windows capture implementations

pub mod screen;
pub mod system_audio;
