pub mod platform;
pub mod selected;
pub mod source;
pub mod wav;
#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;

pub use platform::{
    CaptureHandle, Clock, DurationProbe, FilePicker, Microphone, PathListPicker, Permission,
    PickedFile, SystemClock, UnavailableMicrophone,
};
pub use selected::{format_time, millis_to_label, AudioOrigin, SelectedAudio};
pub use source::{AudioSource, RecordingSession, RecordingState};
pub use wav::{wav_duration_millis, write_wav, WavProbe};
#[cfg(feature = "audio-io")]
pub use input::CpalMicrophone;
#[cfg(feature = "audio-io")]
pub use output::{DecoderProbe, RodioBackend};

use crate::playback::SoundBackend;

/// Device-backed collaborators for this build
pub struct Devices {
    pub microphone: Box<dyn Microphone>,
    pub probe: Box<dyn DurationProbe>,
    pub output: Box<dyn SoundBackend>,
}

/// Real devices when built with `audio-io`, stand-ins otherwise
pub fn default_devices() -> Devices {
    #[cfg(feature = "audio-io")]
    {
        Devices {
            microphone: Box::new(CpalMicrophone::new()),
            probe: Box::new(DecoderProbe),
            output: Box::new(RodioBackend::new()),
        }
    }

    #[cfg(not(feature = "audio-io"))]
    {
        Devices {
            microphone: Box::new(UnavailableMicrophone),
            probe: Box::new(WavProbe),
            output: Box::new(crate::playback::UnavailableOutput),
        }
    }
}
