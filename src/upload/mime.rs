//! Content type of an uploaded clip

use std::path::Path;

pub const DEFAULT_AUDIO_MIME: &str = "audio/wav";

/// MIME type from a file extension
pub fn from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "wav" | "wave" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        "3gp" => "audio/3gpp",
        "amr" => "audio/amr",
        _ => return None,
    };
    Some(mime)
}

/// Content type for an upload: extension first, then the file's magic
/// bytes, then `audio/wav`
pub fn content_type(path: &Path, bytes: &[u8]) -> &'static str {
    path.extension()
        .and_then(|ext| from_extension(&ext.to_string_lossy()))
        .or_else(|| {
            infer::get(bytes)
                .filter(|kind| kind.matcher_type() == infer::MatcherType::Audio)
                .map(|kind| kind.mime_type())
        })
        .unwrap_or(DEFAULT_AUDIO_MIME)
}
