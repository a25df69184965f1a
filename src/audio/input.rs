use crate::audio::platform::{CaptureHandle, Microphone, Permission};
use crate::audio::wav::write_wav;
use crate::config::RecordingConfig;
use crate::{Result, VoiceCheckError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{unbounded, Receiver};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default system microphone via cpal
pub struct CpalMicrophone {
    host: cpal::Host,
}

impl CpalMicrophone {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn device(&self) -> Result<Device> {
        self.host
            .default_input_device()
            .ok_or_else(|| VoiceCheckError::AudioDeviceError("No input device available".into()))
    }
}

impl Default for CpalMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

impl Microphone for CpalMicrophone {
    /// Desktop hosts have no runtime prompt; a missing device is the only refusal
    fn request_permission(&mut self) -> Permission {
        match self.host.default_input_device() {
            Some(_) => Permission::Granted,
            None => {
                warn!("No input device, treating microphone as unavailable");
                Permission::Denied
            }
        }
    }

    fn open(&mut self, config: &RecordingConfig) -> Result<Box<dyn CaptureHandle>> {
        let device = self.device()?;
        info!("Using input device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));
        Ok(Box::new(CpalCapture::start(device, config)?))
    }
}

/// A running cpal input stream. Samples arrive over a channel and are
/// collected until `finish`.
pub struct CpalCapture {
    stream: Option<Stream>,
    config: StreamConfig,
    is_recording: Arc<Mutex<bool>>,
    samples_rx: Receiver<Vec<f32>>,
}

impl CpalCapture {
    fn start(device: Device, requested: &RecordingConfig) -> Result<Self> {
        let default_config: StreamConfig = device
            .default_input_config()
            .map_err(|e| VoiceCheckError::AudioDeviceError(format!("Failed to get input config: {}", e)))?
            .into();

        // Prefer the configured layout, fall back to what the device reports
        let config = StreamConfig {
            channels: requested.channels,
            sample_rate: cpal::SampleRate(requested.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        match Self::build(&device, &config) {
            Ok(capture) => Ok(capture),
            Err(e) => {
                warn!("Requested input config rejected ({}), using device default", e);
                Self::build(&device, &default_config)
            }
        }
    }

    fn build(device: &Device, config: &StreamConfig) -> Result<Self> {
        let (samples_tx, samples_rx) = unbounded();
        let is_recording = Arc::new(Mutex::new(true));
        let flag = Arc::clone(&is_recording);

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        let stream = device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*flag.lock() {
                        return;
                    }
                    if let Err(e) = samples_tx.send(data.to_vec()) {
                        debug!("Failed to send audio data: {}", e);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| VoiceCheckError::AudioDeviceError(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| VoiceCheckError::AudioDeviceError(format!("Failed to start input stream: {}", e)))?;

        info!("Started audio capture: {:?}", config);
        Ok(Self {
            stream: Some(stream),
            config: config.clone(),
            is_recording,
            samples_rx,
        })
    }
}

impl CaptureHandle for CpalCapture {
    fn pause(&mut self) -> Result<()> {
        *self.is_recording.lock() = false;
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| VoiceCheckError::AudioDeviceError(format!("Failed to pause input stream: {}", e)))?;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| VoiceCheckError::AudioDeviceError(format!("Failed to resume input stream: {}", e)))?;
        }
        *self.is_recording.lock() = true;
        Ok(())
    }

    fn finish(mut self: Box<Self>, path: &Path) -> Result<()> {
        *self.is_recording.lock() = false;
        // Dropping the stream also drops the callback's sender
        drop(self.stream.take());

        let samples: Vec<f32> = self.samples_rx.try_iter().flatten().collect();
        write_wav(path, &samples, self.config.sample_rate.0, self.config.channels)
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        *self.is_recording.lock() = false;
        if self.stream.take().is_some() {
            info!("Stopped audio capture");
        }
    }
}
