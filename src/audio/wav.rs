use crate::audio::platform::DurationProbe;
use crate::{Result, VoiceCheckError};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::{debug, info};

/// Write audio samples to a WAV file
///
/// # Arguments
/// * `path` - Path to the output WAV file
/// * `samples` - Interleaved audio samples (f32, range -1.0 to 1.0)
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of channels
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| VoiceCheckError::IOError(format!("Failed to create WAV writer: {}", e)))?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| VoiceCheckError::IOError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| VoiceCheckError::IOError(format!("Failed to finalize WAV file: {}", e)))?;

    info!("Wrote {} samples to WAV file: {:?}", samples.len(), path.as_ref());
    Ok(())
}

/// Length of a WAV file in milliseconds, read from its header
pub fn wav_duration_millis<P: AsRef<Path>>(path: P) -> Result<u64> {
    let reader = WavReader::open(path.as_ref())
        .map_err(|e| VoiceCheckError::IOError(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    // duration() counts frames, not interleaved samples
    let frames = reader.duration() as u64;

    debug!(
        "Probed WAV file: {} Hz, {} channels, {} frames",
        spec.sample_rate, spec.channels, frames
    );

    if spec.sample_rate == 0 {
        return Ok(0);
    }
    Ok(frames * 1000 / spec.sample_rate as u64)
}

/// Duration probe that understands WAV headers only; other formats are
/// reported as unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavProbe;

impl DurationProbe for WavProbe {
    fn duration_millis(&self, path: &Path) -> Result<Option<u64>> {
        let is_wav = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);

        if !is_wav {
            return Ok(None);
        }
        wav_duration_millis(path).map(Some)
    }
}
