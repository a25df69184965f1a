//! Navigation-owning driver of the capture → preview → upload → result flow
//!
//! `Workflow` owns the only `AudioSource`, `PlaybackController` and
//! `UploadClient` of the app. Every screen change goes through it, and each
//! one tears down the recording and the loaded sound before the next screen
//! becomes current.

use crate::audio::{self, AudioSource, FilePicker, RecordingState, SelectedAudio, SystemClock};
use crate::config::AppConfig;
use crate::flow::navigator::Navigator;
use crate::flow::route::{Route, Screen};
use crate::playback::{PlaybackController, PlaybackState};
use crate::present::{Notification, Presentation, ResultPresenter};
use crate::upload::{DetectionRequest, DetectionResult, Operation, UploadClient};
use crate::{Result, VoiceCheckError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Screens that own a microphone
const RECORDING_SCREENS: [Screen; 2] = [Screen::Recording, Screen::Watermark];

/// Screens with a preview player
const PLAYER_SCREENS: [Screen; 3] = [Screen::Recording, Screen::Playback, Screen::Watermark];

pub struct Workflow {
    navigator: Navigator,
    source: AudioSource,
    player: PlaybackController,
    client: UploadClient,
    download_dir: PathBuf,

    /// Clip the next submit sends
    selected: Option<SelectedAudio>,

    /// Most recent alert, until taken by the UI
    notification: Option<Notification>,
}

impl Workflow {
    pub fn new(
        source: AudioSource,
        player: PlaybackController,
        client: UploadClient,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            navigator: Navigator::new(),
            source,
            player,
            client,
            download_dir,
            selected: None,
            notification: None,
        }
    }

    /// Wire the configured server and this build's audio devices
    pub fn from_config(config: &AppConfig, picker: Box<dyn FilePicker>) -> Result<Self> {
        config.validate()?;

        let devices = audio::default_devices();
        let source = AudioSource::new(
            picker,
            devices.probe,
            devices.microphone,
            Arc::new(SystemClock),
            config.recording.clone(),
        );

        Ok(Self::new(
            source,
            PlaybackController::new(devices.output),
            UploadClient::new(&config.server)?,
            config.download_dir(),
        ))
    }

    pub fn route(&self) -> &Route {
        self.navigator.current()
    }

    pub fn screen(&self) -> Screen {
        self.navigator.screen()
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    pub fn player(&self) -> &PlaybackController {
        &self.player
    }

    pub fn client(&self) -> &UploadClient {
        &self.client
    }

    pub fn selected(&self) -> Option<&SelectedAudio> {
        self.selected.as_ref()
    }

    /// Replace the clip the next submit sends
    pub fn select(&mut self, audio: SelectedAudio) {
        self.player.release();
        self.selected = Some(audio);
    }

    /// Open a screen. The current screen's audio is released first.
    pub fn navigate(&mut self, route: Route) -> Result<()> {
        self.navigator.ensure_allowed(route.screen())?;
        self.teardown();

        if let Some(audio) = route.audio() {
            self.selected = Some(audio.clone());
        }
        self.navigator.navigate(route)?;
        Ok(())
    }

    /// Open the preview screen for the current clip
    pub fn open_playback(&mut self) -> Result<()> {
        let audio = self.require_selected()?.clone();
        self.navigate(Route::Playback(audio))
    }

    /// Return to the previous screen; leaving for `Home` forgets the clip
    pub fn back(&mut self) -> Result<()> {
        if !self.navigator.can_go_back() {
            return Err(VoiceCheckError::Navigation(
                "Already at the first screen".into(),
            ));
        }

        self.teardown();
        self.navigator.back()?;
        if self.screen() == Screen::Home {
            self.selected = None;
        }
        Ok(())
    }

    /// Stop whatever the current screen holds
    fn teardown(&mut self) {
        self.source.cancel_recording();
        self.player.release();
    }

    /// Pick one file and make it the current clip
    pub fn pick(&mut self) -> Result<SelectedAudio> {
        let audio = self
            .source
            .pick_file(false)?
            .into_iter()
            .next()
            .ok_or(VoiceCheckError::Cancelled)?;
        self.select(audio.clone());
        Ok(audio)
    }

    /// Pick several files without changing the current clip
    pub fn pick_batch(&mut self) -> Result<Vec<SelectedAudio>> {
        self.source.pick_file(true)
    }

    pub fn acknowledge_permission_error(&mut self) {
        self.source.acknowledge_permission_error();
    }

    pub fn start_recording(&mut self) -> Result<()> {
        self.require_screen(&RECORDING_SCREENS)?;
        // Microphone and speaker are never held together
        self.player.release();
        self.source.start_recording()?;
        Ok(())
    }

    pub fn toggle_recording(&mut self) -> Result<RecordingState> {
        self.require_screen(&RECORDING_SCREENS)?;
        self.player.release();
        self.source.toggle_recording()
    }

    /// Finish the recording and make it the current clip
    pub fn stop_recording(&mut self) -> Result<SelectedAudio> {
        let audio = self.source.stop_recording()?;
        self.select(audio.clone());
        Ok(audio)
    }

    pub fn recording_label(&self) -> Option<String> {
        self.source.live_duration_label()
    }

    /// Load the current clip if needed and start it
    pub fn preview(&mut self) -> Result<PlaybackState> {
        self.require_screen(&PLAYER_SCREENS)?;
        if self.source.session().is_some() {
            return Err(VoiceCheckError::RecordingInProgress);
        }

        let audio = self.require_selected()?.clone();
        let loaded = self.player.session().source.as_ref() == Some(&audio);
        if !loaded {
            self.player.load(&audio)?;
        }
        self.player.play()?;
        Ok(self.player.state())
    }

    pub fn toggle_playback(&mut self) -> Result<PlaybackState> {
        if self.player.is_loaded() {
            self.player.toggle_play_pause()
        } else {
            self.preview()
        }
    }

    pub fn stop_playback(&mut self) -> Result<()> {
        self.player.stop()
    }

    /// UI tick: notice the end of a clip
    pub fn poll_playback(&mut self) -> PlaybackState {
        self.player.poll()
    }

    /// Send the current clip and show the answer.
    ///
    /// On failure the screen and the clip stay as they were, so the same
    /// submit can be retried.
    pub async fn submit(&mut self, operation: Operation) -> Result<&DetectionResult> {
        self.navigator.ensure_allowed(Screen::Result)?;
        if self.source.session().is_some() {
            return Err(VoiceCheckError::RecordingInProgress);
        }

        let audio = self.require_selected()?.clone();
        // Playback stops before the upload starts
        self.player.stop()?;

        let request = DetectionRequest::new(audio, operation);
        match self.client.submit(&request).await {
            Ok(result) => {
                info!("{} finished for {}", operation.label(), request.audio.display_name());
                self.show_result(result)
            }
            Err(e) => {
                warn!("{} failed: {}", operation.label(), e);
                Err(e)
            }
        }
    }

    /// Show the server's stored classification
    pub async fn poll(&mut self) -> Result<&DetectionResult> {
        self.navigator.ensure_allowed(Screen::Result)?;
        let result = self.client.fetch_classification().await?;
        self.show_result(result)
    }

    fn show_result(&mut self, result: DetectionResult) -> Result<&DetectionResult> {
        self.navigate(Route::Result(result))?;
        self.navigator
            .current()
            .result()
            .ok_or_else(|| VoiceCheckError::Navigation("Result screen without a result".into()))
    }

    /// Rendered text of the result screen
    pub fn presentation(&self) -> Option<Presentation> {
        self.navigator.current().result().map(ResultPresenter::present)
    }

    /// Fetch the file produced by a watermark or protect result and make it
    /// the current clip
    pub async fn download(&mut self) -> Result<SelectedAudio> {
        let output_ref = self
            .navigator
            .current()
            .result()
            .and_then(DetectionResult::output_ref)
            .ok_or_else(|| VoiceCheckError::Navigation("No downloadable result on screen".into()))?
            .to_string();

        let audio = self
            .client
            .download(&output_ref, &self.download_dir, self.source.probe())
            .await?;
        self.selected = Some(audio.clone());
        Ok(audio)
    }

    /// Record an error as the single pending alert
    pub fn notify(&mut self, err: &VoiceCheckError) -> &Notification {
        if err.is_recoverable() {
            warn!("{}", err);
        } else {
            error!("{}", err);
        }
        self.notification.insert(Notification::from_error(err))
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    fn require_selected(&self) -> Result<&SelectedAudio> {
        self.selected
            .as_ref()
            .ok_or_else(|| VoiceCheckError::IOError("No audio selected".into()))
    }

    fn require_screen(&self, allowed: &[Screen]) -> Result<()> {
        let screen = self.screen();
        if allowed.contains(&screen) {
            Ok(())
        } else {
            Err(VoiceCheckError::Navigation(format!(
                "Not available on the {} screen",
                screen
            )))
        }
    }
}
