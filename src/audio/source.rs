//! Audio selection and capture
//!
//! `AudioSource` produces `SelectedAudio` values, either by picking files
//! (probing each one's duration once) or by running a microphone recording
//! session with a pausable timer.

use crate::audio::platform::{
    CaptureHandle, Clock, DurationProbe, FilePicker, Microphone, Permission, PickedFile,
};
use crate::audio::selected::{
    format_time, millis_to_label, recording_name, unique_path, AudioOrigin,
    SelectedAudio,
};
use crate::config::RecordingConfig;
use crate::{Result, VoiceCheckError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Recording session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Not recording
    Idle,
    /// Capturing audio, timer running
    Recording,
    /// Capture suspended, timer frozen
    Paused,
    /// Capture finalized
    Stopped,
}

/// Timer bookkeeping for one recording
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSession {
    pub state: RecordingState,
    /// Start of the current running stretch; `None` while paused
    pub started_at: Option<Instant>,
    /// Time accumulated by earlier running stretches
    pub accumulated: Duration,
}

impl RecordingSession {
    fn start(now: Instant) -> Self {
        Self {
            state: RecordingState::Recording,
            started_at: Some(now),
            accumulated: Duration::ZERO,
        }
    }

    /// Elapsed capture time; advances only while recording
    pub fn elapsed(&self, now: Instant) -> Duration {
        match (self.state, self.started_at) {
            (RecordingState::Recording, Some(start)) => {
                self.accumulated + now.saturating_duration_since(start)
            }
            _ => self.accumulated,
        }
    }

    pub fn accumulated_seconds(&self, now: Instant) -> u64 {
        self.elapsed(now).as_secs()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, RecordingState::Recording | RecordingState::Paused)
    }

    fn pause(&mut self, now: Instant) {
        self.accumulated = self.elapsed(now);
        self.started_at = None;
        self.state = RecordingState::Paused;
    }

    fn resume(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.state = RecordingState::Recording;
    }

    fn stop(&mut self, now: Instant) {
        self.accumulated = self.elapsed(now);
        self.started_at = None;
        self.state = RecordingState::Stopped;
    }
}

struct ActiveRecording {
    session: RecordingSession,
    capture: Box<dyn CaptureHandle>,
}

/// File picking and microphone capture for one screen
pub struct AudioSource {
    picker: Box<dyn FilePicker>,
    probe: Box<dyn DurationProbe>,
    microphone: Box<dyn Microphone>,
    clock: Arc<dyn Clock>,
    config: RecordingConfig,
    active: Option<ActiveRecording>,
    permission_error: bool,
}

impl AudioSource {
    pub fn new(
        picker: Box<dyn FilePicker>,
        probe: Box<dyn DurationProbe>,
        microphone: Box<dyn Microphone>,
        clock: Arc<dyn Clock>,
        config: RecordingConfig,
    ) -> Self {
        Self {
            picker,
            probe,
            microphone,
            clock,
            config,
            active: None,
            permission_error: false,
        }
    }

    /// Set after a dismissed picker; blocks picking until acknowledged
    pub fn has_permission_error(&self) -> bool {
        self.permission_error
    }

    pub fn acknowledge_permission_error(&mut self) {
        self.permission_error = false;
    }

    /// Let the user choose one or more audio files
    pub fn pick_file(&mut self, allow_multiple: bool) -> Result<Vec<SelectedAudio>> {
        if self.permission_error {
            return Err(VoiceCheckError::PermissionDenied(
                "Audio file access was refused; acknowledge before retrying".into(),
            ));
        }

        let picked = match self.picker.pick(true, allow_multiple) {
            Some(files) if !files.is_empty() => files,
            _ => {
                self.permission_error = true;
                info!("Picker was cancelled by the user");
                return Err(VoiceCheckError::Cancelled);
            }
        };

        let selected = picked
            .into_iter()
            .map(|file| self.select(file))
            .collect::<Result<Vec<_>>>()?;

        self.permission_error = false;
        info!("Selected {} audio file(s)", selected.len());
        Ok(selected)
    }

    /// Turn a picked file into a `SelectedAudio`, probing its duration once
    pub fn select(&self, file: PickedFile) -> Result<SelectedAudio> {
        let millis = match self.probe.duration_millis(&file.path) {
            Ok(millis) => millis,
            Err(e) => {
                warn!("Could not read duration of {:?}: {}", file.path, e);
                None
            }
        };

        let name = file.name.unwrap_or_else(|| "Unnamed file".to_string());
        debug!("Picked {} ({:?} bytes, {:?} ms)", name, file.size, millis);

        SelectedAudio::new(file.path, name, millis_to_label(millis), AudioOrigin::Picked)
    }

    pub fn probe(&self) -> &dyn DurationProbe {
        self.probe.as_ref()
    }

    /// Current recording session, if any
    pub fn session(&self) -> Option<&RecordingSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    pub fn recording_state(&self) -> RecordingState {
        self.session()
            .map(|session| session.state)
            .unwrap_or(RecordingState::Idle)
    }

    /// Live `m:ss` display of the running recording
    pub fn live_duration_label(&self) -> Option<String> {
        let now = self.clock.now();
        self.session()
            .map(|session| format_time(session.accumulated_seconds(now)))
    }

    /// Begin a recording; rejected while another one is active
    pub fn start_recording(&mut self) -> Result<&RecordingSession> {
        if self.active.is_some() {
            return Err(VoiceCheckError::RecordingInProgress);
        }

        if self.microphone.request_permission() == Permission::Denied {
            return Err(VoiceCheckError::PermissionDenied(
                "Permission to access microphone was denied".into(),
            ));
        }

        let capture = self
            .microphone
            .open(&self.config)
            .map_err(|e| VoiceCheckError::RecordingFailed(format!("Failed to start recording: {}", e)))?;

        let session = RecordingSession::start(self.clock.now());
        info!("Started recording");
        let active = self.active.insert(ActiveRecording { session, capture });
        Ok(&active.session)
    }

    pub fn pause_recording(&mut self) -> Result<()> {
        let now = self.clock.now();
        match self.active.as_mut() {
            Some(active) if active.session.state == RecordingState::Recording => {
                if let Err(e) = active.capture.pause() {
                    self.active = None;
                    return Err(VoiceCheckError::RecordingFailed(e.to_string()));
                }
                active.session.pause(now);
                debug!("Recording paused");
            }
            _ => warn!("Pause ignored: not recording"),
        }
        Ok(())
    }

    pub fn resume_recording(&mut self) -> Result<()> {
        let now = self.clock.now();
        match self.active.as_mut() {
            Some(active) if active.session.state == RecordingState::Paused => {
                if let Err(e) = active.capture.resume() {
                    self.active = None;
                    return Err(VoiceCheckError::RecordingFailed(e.to_string()));
                }
                active.session.resume(now);
                debug!("Recording resumed");
            }
            _ => warn!("Resume ignored: not paused"),
        }
        Ok(())
    }

    /// Record button: start, or toggle pause while a session is live
    pub fn toggle_recording(&mut self) -> Result<RecordingState> {
        match self.recording_state() {
            RecordingState::Recording => self.pause_recording()?,
            RecordingState::Paused => self.resume_recording()?,
            RecordingState::Idle | RecordingState::Stopped => {
                self.start_recording()?;
            }
        }
        Ok(self.recording_state())
    }

    /// Finalize the capture. The duration comes from the session timer.
    pub fn stop_recording(&mut self) -> Result<SelectedAudio> {
        let mut active = self
            .active
            .take()
            .ok_or_else(|| VoiceCheckError::RecordingFailed("No recording in progress".into()))?;

        active.session.stop(self.clock.now());
        let elapsed = active.session.accumulated_seconds(self.clock.now());

        let name = recording_name(chrono::Local::now(), &self.config.extension);
        let path = unique_path(&self.config.output_dir(), &name);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(name);

        active
            .capture
            .finish(&path)
            .map_err(|e| VoiceCheckError::RecordingFailed(format!("Failed to stop recording: {}", e)))?;

        info!("Recording saved to {:?} ({}s)", path, elapsed);
        SelectedAudio::new(path, name, format_time(elapsed), AudioOrigin::Recorded)
    }

    /// Drop any live capture without producing audio
    pub fn cancel_recording(&mut self) {
        if self.active.take().is_some() {
            info!("Recording cancelled");
        }
    }
}

impl Drop for AudioSource {
    fn drop(&mut self) {
        self.cancel_recording();
    }
}
