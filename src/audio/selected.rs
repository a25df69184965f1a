//! The audio clip a user has chosen to preview or submit

use crate::{Result, VoiceCheckError};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Label shown when the duration could not be determined
pub const UNKNOWN_DURATION: &str = "00:00";

/// Where a clip came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOrigin {
    Picked,
    Recorded,
    Downloaded,
}

/// An immutable reference to a local audio resource.
///
/// A new pick or recording always produces a new value; fields are only
/// readable.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedAudio {
    uri: PathBuf,
    display_name: String,
    duration_label: String,
    origin: AudioOrigin,
}

impl SelectedAudio {
    /// Build a clip, rejecting an empty uri
    pub fn new(
        uri: impl Into<PathBuf>,
        display_name: impl Into<String>,
        duration_label: impl Into<String>,
        origin: AudioOrigin,
    ) -> Result<Self> {
        let uri = uri.into();
        if uri.as_os_str().is_empty() {
            return Err(VoiceCheckError::IOError("Audio uri must not be empty".into()));
        }

        let mut display_name = display_name.into();
        if display_name.is_empty() {
            display_name = uri
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Unnamed file".to_string());
        }

        Ok(Self {
            uri,
            display_name,
            duration_label: duration_label.into(),
            origin,
        })
    }

    pub fn uri(&self) -> &Path {
        &self.uri
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn duration_label(&self) -> &str {
        &self.duration_label
    }

    pub fn origin(&self) -> AudioOrigin {
        self.origin
    }
}

/// Generated name for a live recording: `recorded_audio_<timestamp>.<ext>`
pub fn recording_name(at: DateTime<Local>, extension: &str) -> String {
    format!("recorded_audio_{}.{}", at.format("%Y%m%d_%H%M%S_%3f"), extension)
}

/// `dir/name`, or `dir/<stem>_<n>.<ext>` for the first `n` not yet taken.
/// Existing clips are never overwritten.
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    let ext = name.extension().map(|e| e.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| match &ext {
            Some(ext) => dir.join(format!("{}_{}.{}", stem, n, ext)),
            None => dir.join(format!("{}_{}", stem, n)),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Format whole seconds as `m:ss`
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Format a probed duration, `00:00` when unknown
pub fn millis_to_label(millis: Option<u64>) -> String {
    match millis {
        Some(ms) if ms > 0 => format_time(ms / 1000),
        _ => UNKNOWN_DURATION.to_string(),
    }
}
