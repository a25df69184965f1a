use crate::audio::platform::DurationProbe;
use crate::audio::wav::WavProbe;
use crate::playback::{SoundBackend, SoundHandle};
use crate::{Result, VoiceCheckError};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn decode(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file))
        .map_err(|e| VoiceCheckError::PlaybackFailed(format!("Failed to decode {:?}: {}", path, e)))
}

/// Plays files on the default output device
pub struct RodioBackend;

impl RodioBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundBackend for RodioBackend {
    fn load(&mut self, path: &Path) -> Result<Box<dyn SoundHandle>> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| VoiceCheckError::AudioDeviceError(format!("No output device available: {}", e)))?;

        let mut sound = RodioSound {
            path: path.to_path_buf(),
            _stream: stream,
            handle,
            sink: None,
        };
        sound.rewind()?;

        info!("Loaded sound {:?}", path);
        Ok(Box::new(sound))
    }
}

/// One loaded sound. Holds the output stream open until dropped.
pub struct RodioSound {
    path: PathBuf,
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl SoundHandle for RodioSound {
    fn play(&mut self) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.play();
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        Ok(())
    }

    /// Queue the file again from the start, paused
    fn rewind(&mut self) -> Result<()> {
        // Dropping a sink stops whatever it was playing
        self.sink = None;

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| VoiceCheckError::PlaybackFailed(format!("Failed to open sink: {}", e)))?;
        sink.pause();
        sink.append(decode(&self.path)?);
        self.sink = Some(sink);

        debug!("Rewound {:?}", self.path);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().map(|sink| sink.empty()).unwrap_or(true)
    }
}

impl Drop for RodioSound {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        debug!("Released sound {:?}", self.path);
    }
}

/// Probes any format rodio can decode, falling back to the WAV header
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderProbe;

impl DurationProbe for DecoderProbe {
    fn duration_millis(&self, path: &Path) -> Result<Option<u64>> {
        // The decoder lives only for this call
        let reported = decode(path)?.total_duration();
        match reported {
            Some(duration) => Ok(Some(duration.as_millis() as u64)),
            None => WavProbe.duration_millis(path),
        }
    }
}
