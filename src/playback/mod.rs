pub mod controller;

pub use controller::{PlaybackController, PlaybackSession, PlaybackState};

use crate::{Result, VoiceCheckError};
use std::path::Path;

/// Something that can turn a file into a playable sound
pub trait SoundBackend {
    /// Acquire a sound resource for `path`, positioned at zero and paused
    fn load(&mut self, path: &Path) -> Result<Box<dyn SoundHandle>>;
}

/// An acquired sound resource. Dropping the handle releases it.
pub trait SoundHandle {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;

    /// Return to position zero, paused
    fn rewind(&mut self) -> Result<()>;

    /// True once playback reached the natural end of the stream
    fn is_finished(&self) -> bool;
}

/// Stand-in used when the crate is built without device support
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableOutput;

impl SoundBackend for UnavailableOutput {
    fn load(&mut self, _path: &Path) -> Result<Box<dyn SoundHandle>> {
        Err(VoiceCheckError::AudioDeviceError(
            "Built without audio-io support".into(),
        ))
    }
}
