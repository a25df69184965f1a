//! Remote detection and watermarking
//!
//! One client serves every server operation; each operation has its own
//! response normalizer producing a tagged `DetectionResult`.

pub mod client;
pub mod mime;
pub mod response;

pub use client::UploadClient;
pub use response::{parse_response, Vocoder};

use crate::audio::SelectedAudio;

/// Server operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Real / fake classification
    Classify,
    /// Embed a watermark
    WatermarkAdd,
    /// Check for a watermark
    WatermarkDetect,
    /// Adversarial perturbation plus watermark
    Protect,
}

impl Operation {
    /// Multipart field carrying the audio
    pub fn field_name(&self) -> &'static str {
        match self {
            Operation::Protect => "file",
            _ => "audio",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Operation::Classify => "classify",
            Operation::WatermarkAdd => "watermark add",
            Operation::WatermarkDetect => "watermark detect",
            Operation::Protect => "protect",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRequest {
    pub audio: SelectedAudio,
    pub operation: Operation,
}

impl DetectionRequest {
    pub fn new(audio: SelectedAudio, operation: Operation) -> Self {
        Self { audio, operation }
    }
}

/// Share of one generator in the attribution breakdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribution {
    pub vocoder: Vocoder,
    pub percentage: f64,
}

/// Normalized server answer, one variant per operation
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    Classification {
        real_percentage: f64,
        fake_percentage: f64,
        /// Which generator most likely produced the clip, when reported
        attribution: Option<Vec<Attribution>>,
    },
    Watermarked {
        output_ref: String,
    },
    WatermarkDetection {
        detected: bool,
        message_bits: Option<Vec<u8>>,
    },
    Protected {
        output_ref: String,
    },
}

impl DetectionResult {
    /// Server reference to a produced audio file, if the operation made one
    pub fn output_ref(&self) -> Option<&str> {
        match self {
            DetectionResult::Watermarked { output_ref }
            | DetectionResult::Protected { output_ref } => Some(output_ref),
            _ => None,
        }
    }
}
