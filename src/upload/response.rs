//! Response normalizers
//!
//! The server answers each operation with a different JSON shape. Every
//! shape is validated here before anything reaches the presenter.

use crate::upload::{Attribution, DetectionResult, Operation};
use crate::{Result, VoiceCheckError};
use serde_json::Value;
use std::fmt;

/// Score at or above which a numeric `watermark_detected` counts as detected
pub const WATERMARK_THRESHOLD: f64 = 0.5;

/// Generators in the order of the server's `result_multi` vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocoder {
    GroundTruth,
    WaveGrad,
    DiffWave,
    ParallelWaveGan,
    WaveRnn,
    WaveNet,
    MelGan,
}

impl Vocoder {
    pub const ALL: [Vocoder; 7] = [
        Vocoder::GroundTruth,
        Vocoder::WaveGrad,
        Vocoder::DiffWave,
        Vocoder::ParallelWaveGan,
        Vocoder::WaveRnn,
        Vocoder::WaveNet,
        Vocoder::MelGan,
    ];
}

impl fmt::Display for Vocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vocoder::GroundTruth => "Genuine",
            Vocoder::WaveGrad => "WaveGrad",
            Vocoder::DiffWave => "DiffWave",
            Vocoder::ParallelWaveGan => "Parallel WaveGAN",
            Vocoder::WaveRnn => "WaveRNN",
            Vocoder::WaveNet => "WaveNet",
            Vocoder::MelGan => "MelGAN",
        };
        f.write_str(name)
    }
}

fn malformed(msg: impl Into<String>) -> VoiceCheckError {
    VoiceCheckError::MalformedResponse(msg.into())
}

fn probability(value: &Value, field: &str) -> Result<f64> {
    let p = value
        .as_f64()
        .ok_or_else(|| malformed(format!("{} is not a number", field)))?;
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(malformed(format!("{} = {} is outside [0, 1]", field, p)));
    }
    Ok(p)
}

/// Parse a JSON body for the given operation
pub fn parse_response(operation: Operation, body: &Value) -> Result<DetectionResult> {
    if !body.is_object() {
        return Err(malformed("Response is not a JSON object"));
    }

    match operation {
        Operation::Classify => parse_classification(body),
        Operation::WatermarkAdd => Ok(DetectionResult::Watermarked {
            output_ref: output_ref(body, "filePath")?,
        }),
        Operation::WatermarkDetect => parse_watermark_detection(body),
        Operation::Protect => Ok(DetectionResult::Protected {
            output_ref: output_ref(body, "file_path")?,
        }),
    }
}

/// Accepts `{ result_binary: [fake, real] }` or `{ real, fake }`
pub fn parse_classification(body: &Value) -> Result<DetectionResult> {
    let (fake, real) = match body.get("result_binary") {
        Some(Value::Array(pair)) if pair.len() == 2 => (
            probability(&pair[0], "result_binary[0]")?,
            probability(&pair[1], "result_binary[1]")?,
        ),
        Some(Value::Array(pair)) => {
            return Err(malformed(format!(
                "result_binary has {} elements, expected 2",
                pair.len()
            )));
        }
        Some(_) => return Err(malformed("result_binary is not an array")),
        None => match (body.get("fake"), body.get("real")) {
            (Some(fake), Some(real)) => (probability(fake, "fake")?, probability(real, "real")?),
            _ => return Err(malformed("Missing result_binary or real/fake fields")),
        },
    };

    Ok(DetectionResult::Classification {
        real_percentage: real * 100.0,
        fake_percentage: fake * 100.0,
        attribution: body.get("result_multi").and_then(parse_attribution),
    })
}

/// Optional breakdown; anything but seven probabilities is ignored
fn parse_attribution(value: &Value) -> Option<Vec<Attribution>> {
    let scores = value.as_array()?;
    if scores.len() != Vocoder::ALL.len() {
        return None;
    }

    Vocoder::ALL
        .iter()
        .zip(scores)
        .map(|(&vocoder, score)| {
            probability(score, "result_multi").ok().map(|p| Attribution {
                vocoder,
                percentage: p * 100.0,
            })
        })
        .collect()
}

fn parse_watermark_detection(body: &Value) -> Result<DetectionResult> {
    let detected = match body.get("watermark_detected") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(score)) => {
            let score = score
                .as_f64()
                .ok_or_else(|| malformed("watermark_detected is not a finite number"))?;
            score >= WATERMARK_THRESHOLD
        }
        Some(_) => return Err(malformed("watermark_detected is not a boolean")),
        None => return Err(malformed("Missing watermark_detected field")),
    };

    let message_bits = body
        .get("binary_message")
        .and_then(Value::as_array)
        .and_then(|bits| {
            bits.iter()
                .map(|bit| bit.as_u64().filter(|b| *b <= 1).map(|b| b as u8))
                .collect::<Option<Vec<u8>>>()
        });

    Ok(DetectionResult::WatermarkDetection {
        detected,
        message_bits,
    })
}

fn output_ref(body: &Value, field: &str) -> Result<String> {
    match body.get(field).and_then(Value::as_str) {
        Some(path) if !path.trim().is_empty() => Ok(path.to_string()),
        Some(_) => Err(malformed(format!("{} is empty", field))),
        None => match body.get("error").and_then(Value::as_str) {
            Some(error) => Err(VoiceCheckError::UploadFailed(error.to_string())),
            None => Err(malformed(format!("Missing {} field", field))),
        },
    }
}
