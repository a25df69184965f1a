//! Result and alert rendering
//!
//! Pure formatting of a `DetectionResult` or an error into text a screen
//! (or the terminal) can show.

use crate::upload::{Attribution, DetectionResult};
use crate::VoiceCheckError;
use std::fmt;

/// Rendered result screen
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub title: String,
    pub lines: Vec<String>,
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for line in &self.lines {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}

/// Modal alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn from_error(error: &VoiceCheckError) -> Self {
        Self {
            title: error.title().to_string(),
            message: error.user_message(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

pub struct ResultPresenter;

impl ResultPresenter {
    pub fn present(result: &DetectionResult) -> Presentation {
        match result {
            DetectionResult::Classification {
                real_percentage,
                fake_percentage,
                attribution,
            } => {
                let mut lines = vec![
                    format!("REAL {}", percent(*real_percentage)),
                    format!("FAKE {}", percent(*fake_percentage)),
                ];
                if let Some(top) = attribution.as_deref().and_then(most_likely) {
                    lines.push(format!(
                        "Most likely source: {} ({})",
                        top.vocoder,
                        percent(top.percentage)
                    ));
                }
                Presentation {
                    title: "Detection Result".to_string(),
                    lines,
                }
            }
            DetectionResult::WatermarkDetection { detected, message_bits } => {
                let mut lines = vec![if *detected {
                    "Watermark detected".to_string()
                } else {
                    "No watermark detected".to_string()
                }];
                if let (true, Some(bits)) = (*detected, message_bits) {
                    let bits: String = bits.iter().map(|b| if *b == 1 { '1' } else { '0' }).collect();
                    lines.push(format!("Message: {}", bits));
                }
                Presentation {
                    title: "Watermark Detection".to_string(),
                    lines,
                }
            }
            DetectionResult::Watermarked { output_ref } => Presentation {
                title: "Add Watermark".to_string(),
                lines: vec![format!("Watermarked audio: {}", output_ref)],
            },
            DetectionResult::Protected { output_ref } => Presentation {
                title: "Protect".to_string(),
                lines: vec![format!("Protected audio: {}", output_ref)],
            },
        }
    }
}

/// Two decimal places with a percent sign
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

fn most_likely(shares: &[Attribution]) -> Option<&Attribution> {
    shares
        .iter()
        .max_by(|a, b| a.percentage.total_cmp(&b.percentage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::Vocoder;

    #[test]
    fn test_classification_two_decimals() {
        let result = DetectionResult::Classification {
            real_percentage: 80.0,
            fake_percentage: 19.99999,
            attribution: None,
        };
        let shown = ResultPresenter::present(&result);
        assert_eq!(shown.lines, vec!["REAL 80.00%", "FAKE 20.00%"]);
    }

    #[test]
    fn test_attribution_shows_top_generator() {
        let shares = Vocoder::ALL
            .iter()
            .enumerate()
            .map(|(i, &vocoder)| Attribution {
                vocoder,
                percentage: if i == 4 { 70.0 } else { 5.0 },
            })
            .collect();
        let result = DetectionResult::Classification {
            real_percentage: 10.0,
            fake_percentage: 90.0,
            attribution: Some(shares),
        };
        let shown = ResultPresenter::present(&result);
        assert_eq!(shown.lines[2], "Most likely source: WaveRNN (70.00%)");
    }

    #[test]
    fn test_watermark_strings() {
        let yes = DetectionResult::WatermarkDetection {
            detected: true,
            message_bits: Some(vec![1, 0, 1]),
        };
        let no = DetectionResult::WatermarkDetection {
            detected: false,
            message_bits: None,
        };
        assert_eq!(ResultPresenter::present(&yes).lines, vec!["Watermark detected", "Message: 101"]);
        assert_eq!(ResultPresenter::present(&no).lines, vec!["No watermark detected"]);
    }

    #[test]
    fn test_notification_from_error() {
        let note = Notification::from_error(&VoiceCheckError::UploadFailed("HTTP 500".into()));
        assert_eq!(note.title, "Error");
        assert_eq!(note.message, "Failed to send audio to server.");
    }
}
