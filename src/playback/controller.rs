//! Single-sound playback
//!
//! The controller owns at most one sound handle. Loading a new clip drops
//! the previous handle before the backend acquires the next one, and the
//! handle is also dropped on `release()` and when the controller itself is
//! dropped.

use crate::audio::SelectedAudio;
use crate::playback::{SoundBackend, SoundHandle};
use crate::{Result, VoiceCheckError};
use tracing::{debug, info, warn};

/// Audio playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded
    Idle,
    /// Loaded, never started
    Loaded,
    /// Audio is playing
    Playing,
    /// Audio is paused mid-stream
    Paused,
    /// Stopped and rewound
    Stopped,
    /// Reached the end on its own; still loaded for replay
    Finished,
}

/// What the player currently holds
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub state: PlaybackState,
    pub source: Option<SelectedAudio>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            source: None,
        }
    }
}

pub struct PlaybackController {
    backend: Box<dyn SoundBackend>,
    sound: Option<Box<dyn SoundHandle>>,
    session: PlaybackSession,
}

impl PlaybackController {
    pub fn new(backend: Box<dyn SoundBackend>) -> Self {
        Self {
            backend,
            sound: None,
            session: PlaybackSession::default(),
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state
    }

    pub fn is_loaded(&self) -> bool {
        self.sound.is_some()
    }

    /// Load a clip, releasing whatever was held first
    pub fn load(&mut self, audio: &SelectedAudio) -> Result<&PlaybackSession> {
        self.release();

        let sound = self.backend.load(audio.uri()).map_err(|e| {
            warn!("Failed to load {:?}: {}", audio.uri(), e);
            VoiceCheckError::PlaybackFailed(e.to_string())
        })?;

        self.sound = Some(sound);
        self.session = PlaybackSession {
            state: PlaybackState::Loaded,
            source: Some(audio.clone()),
        };

        info!("Loaded {} for playback", audio.display_name());
        Ok(&self.session)
    }

    /// Start playing; a stopped or finished sound restarts from zero
    pub fn play(&mut self) -> Result<()> {
        let state = self.poll();
        let sound = match self.sound.as_mut() {
            Some(sound) => sound,
            None => {
                return Err(VoiceCheckError::PlaybackFailed("No audio loaded".into()));
            }
        };

        let result = match state {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Finished | PlaybackState::Stopped => {
                sound.rewind().and_then(|_| sound.play())
            }
            _ => sound.play(),
        };

        self.settle(result, PlaybackState::Playing)
    }

    /// Pause a playing sound; no-op otherwise
    pub fn pause(&mut self) -> Result<()> {
        if self.session.state != PlaybackState::Playing {
            debug!("Pause ignored in state {:?}", self.session.state);
            return Ok(());
        }

        let result = match self.sound.as_mut() {
            Some(sound) => sound.pause(),
            None => Ok(()),
        };
        self.settle(result, PlaybackState::Paused)
    }

    /// Stop and rewind. Stopping an idle or stopped player does nothing.
    pub fn stop(&mut self) -> Result<()> {
        match self.session.state {
            PlaybackState::Idle | PlaybackState::Stopped | PlaybackState::Loaded => return Ok(()),
            _ => {}
        }

        let result = match self.sound.as_mut() {
            Some(sound) => sound.pause().and_then(|_| sound.rewind()),
            None => Ok(()),
        };
        self.settle(result, PlaybackState::Stopped)
    }

    /// Play button: pause while playing, otherwise play
    pub fn toggle_play_pause(&mut self) -> Result<PlaybackState> {
        if self.poll() == PlaybackState::Playing {
            self.pause()?;
        } else {
            self.play()?;
        }
        Ok(self.session.state)
    }

    /// Notice a natural end of stream. Call from the UI tick.
    pub fn poll(&mut self) -> PlaybackState {
        if self.session.state == PlaybackState::Playing {
            if let Some(sound) = &self.sound {
                if sound.is_finished() {
                    debug!("Playback finished");
                    self.session.state = PlaybackState::Finished;
                }
            }
        }
        self.session.state
    }

    /// Drop the sound resource and forget the source
    pub fn release(&mut self) {
        if let Some(sound) = self.sound.take() {
            drop(sound);
            info!("Released playback resource");
        }
        self.session = PlaybackSession::default();
    }

    /// Commit `next` on success; on failure discard the session
    fn settle(&mut self, result: Result<()>, next: PlaybackState) -> Result<()> {
        match result {
            Ok(()) => {
                self.session.state = next;
                Ok(())
            }
            Err(e) => {
                warn!("Playback error: {}", e);
                self.release();
                Err(VoiceCheckError::PlaybackFailed(e.to_string()))
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.release();
    }
}
