//! Platform collaborators behind the audio lifecycle
//!
//! Document pickers, decoders, microphones and clocks are supplied by the
//! host platform. The lifecycle code only talks to these traits so the same
//! state machines run against real devices or in-memory fakes.

use crate::config::RecordingConfig;
use crate::{Result, VoiceCheckError};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One entry returned by a document picker
#[derive(Debug, Clone, PartialEq)]
pub struct PickedFile {
    pub path: PathBuf,
    pub name: Option<String>,
    pub size: Option<u64>,
}

impl PickedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let size = std::fs::metadata(&path).ok().map(|m| m.len());
        Self {
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            path,
            size,
        }
    }
}

/// Document picker
pub trait FilePicker {
    /// Returns `None` when the user dismisses the dialog
    fn pick(&mut self, filter_audio: bool, allow_multiple: bool) -> Option<Vec<PickedFile>>;
}

/// Reads a clip's length by briefly opening a decoder on it
pub trait DurationProbe {
    fn duration_millis(&self, path: &Path) -> Result<Option<u64>>;
}

/// Microphone permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Microphone access
pub trait Microphone {
    fn request_permission(&mut self) -> Permission;

    /// Open a capture stream; the returned handle is the only owner of it
    fn open(&mut self, config: &RecordingConfig) -> Result<Box<dyn CaptureHandle>>;
}

/// A live capture stream. Dropping it releases the device.
pub trait CaptureHandle {
    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;

    /// Stop capturing and write everything captured to `path`
    fn finish(self: Box<Self>, path: &Path) -> Result<()>;
}

/// Monotonic time source for the recording timer
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Picker that hands out a fixed list of paths, as given on a command line.
/// An empty list behaves like a dismissed dialog.
#[derive(Debug, Clone, Default)]
pub struct PathListPicker {
    paths: Vec<PathBuf>,
}

impl PathListPicker {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl FilePicker for PathListPicker {
    fn pick(&mut self, _filter_audio: bool, allow_multiple: bool) -> Option<Vec<PickedFile>> {
        if self.paths.is_empty() {
            return None;
        }

        let taken: Vec<PathBuf> = if allow_multiple {
            std::mem::take(&mut self.paths)
        } else {
            vec![self.paths.remove(0)]
        };

        Some(taken.into_iter().map(PickedFile::from_path).collect())
    }
}

/// Stand-in used when the crate is built without device support
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableMicrophone;

impl Microphone for UnavailableMicrophone {
    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn open(&mut self, _config: &RecordingConfig) -> Result<Box<dyn CaptureHandle>> {
        Err(VoiceCheckError::AudioDeviceError(
            "Built without audio-io support".into(),
        ))
    }
}
