pub mod audio;
pub mod config;
pub mod flow;
pub mod playback;
pub mod present;
pub mod upload;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoiceCheckError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Cancelled by user")]
    Cancelled,

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Recording failed: {0}")]
    RecordingFailed(String),

    #[error("A recording is already in progress")]
    RecordingInProgress,

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for VoiceCheckError {
    fn from(e: std::io::Error) -> Self {
        VoiceCheckError::IOError(e.to_string())
    }
}

impl VoiceCheckError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // User must grant access before anything else works
            VoiceCheckError::PermissionDenied(_) => false,
            VoiceCheckError::Cancelled => true,
            VoiceCheckError::PlaybackFailed(_) => true,
            VoiceCheckError::RecordingFailed(_) => true,
            VoiceCheckError::RecordingInProgress => true,
            // The selected audio stays available for a manual retry
            VoiceCheckError::UploadFailed(_) => true,
            VoiceCheckError::MalformedResponse(_) => true,
            VoiceCheckError::Navigation(_) => true,
            VoiceCheckError::AudioDeviceError(_) => false,
            VoiceCheckError::IOError(_) => false,
            VoiceCheckError::ConfigError(_) => false,
        }
    }

    /// True for every failure of a server round trip
    pub fn is_upload_failure(&self) -> bool {
        matches!(
            self,
            VoiceCheckError::UploadFailed(_) | VoiceCheckError::MalformedResponse(_)
        )
    }

    /// Short alert title
    pub fn title(&self) -> &'static str {
        match self {
            VoiceCheckError::PermissionDenied(_) => "Permission Required",
            VoiceCheckError::Cancelled => "Cancelled",
            VoiceCheckError::MalformedResponse(_) => "Unexpected Response",
            _ => "Error",
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            VoiceCheckError::PermissionDenied(_) => {
                "This app needs access to your microphone and audio files.".to_string()
            }
            VoiceCheckError::Cancelled => "No file selected.".to_string(),
            VoiceCheckError::PlaybackFailed(_) => "Failed to play the recording.".to_string(),
            VoiceCheckError::RecordingFailed(_) => {
                "Recording failed. Please try again.".to_string()
            }
            VoiceCheckError::RecordingInProgress => {
                "Stop the current recording before starting a new one.".to_string()
            }
            VoiceCheckError::UploadFailed(_) => "Failed to send audio to server.".to_string(),
            VoiceCheckError::MalformedResponse(_) => {
                "Unexpected response format from the server.".to_string()
            }
            VoiceCheckError::Navigation(_) => "That screen is not available here.".to_string(),
            VoiceCheckError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            VoiceCheckError::IOError(_) => "File system error occurred.".to_string(),
            VoiceCheckError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, VoiceCheckError>;
