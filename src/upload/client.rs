//! HTTP client for the detection server
//!
//! Uploads are single multipart POSTs with a bounded timeout. There is no
//! retry: every failure goes back to the caller, and the clip stays
//! available for a manual re-attempt.

use crate::audio::{AudioOrigin, DurationProbe, SelectedAudio};
use crate::audio::selected::{millis_to_label, unique_path};
use crate::config::ServerConfig;
use crate::upload::response::{parse_classification, parse_response};
use crate::upload::{mime, DetectionRequest, DetectionResult, Operation};
use crate::{Result, VoiceCheckError};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("voicecheck/", env!("CARGO_PKG_VERSION"));

/// Endpoint for every operation, parsed once
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub classify: Url,
    pub poll: Url,
    pub watermark_add: Url,
    pub watermark_detect: Url,
    pub protect: Url,
}

impl Endpoints {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let parse = |name: &str, url: &str| {
            Url::parse(url)
                .map_err(|e| VoiceCheckError::ConfigError(format!("Invalid {} '{}': {}", name, url, e)))
        };

        Ok(Self {
            classify: parse("classify_url", &config.classify_url)?,
            poll: parse("poll_url", &config.poll_url)?,
            watermark_add: parse("watermark_add_url", &config.watermark_add_url)?,
            watermark_detect: parse("watermark_detect_url", &config.watermark_detect_url)?,
            protect: parse("protect_url", &config.protect_url)?,
        })
    }

    pub fn for_operation(&self, operation: Operation) -> &Url {
        match operation {
            Operation::Classify => &self.classify,
            Operation::WatermarkAdd => &self.watermark_add,
            Operation::WatermarkDetect => &self.watermark_detect,
            Operation::Protect => &self.protect,
        }
    }
}

pub struct UploadClient {
    http_client: reqwest::Client,
    endpoints: Endpoints,
}

impl UploadClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| VoiceCheckError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoints: Endpoints::from_config(config)?,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Submit to the configured endpoint for the request's operation
    pub async fn submit(&self, request: &DetectionRequest) -> Result<DetectionResult> {
        let endpoint = self.endpoints.for_operation(request.operation).clone();
        self.submit_to(request, &endpoint).await
    }

    /// Upload the clip as multipart form data and normalize the answer
    pub async fn submit_to(&self, request: &DetectionRequest, endpoint: &Url) -> Result<DetectionResult> {
        let audio = &request.audio;
        let bytes = tokio::fs::read(audio.uri()).await.map_err(|e| {
            VoiceCheckError::UploadFailed(format!("Cannot read {:?}: {}", audio.uri(), e))
        })?;

        let content_type = mime::content_type(audio.uri(), &bytes);
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(audio.display_name().to_string())
            .mime_str(content_type)
            .map_err(|e| VoiceCheckError::UploadFailed(e.to_string()))?;
        let form = Form::new().part(request.operation.field_name(), part);

        debug!(
            operation = request.operation.label(),
            endpoint = %endpoint,
            content_type,
            size,
            "Uploading audio"
        );

        let response = self
            .http_client
            .post(endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_json(response).await?;
        let result = parse_response(request.operation, &body)?;

        info!(operation = request.operation.label(), "Server accepted {}", audio.display_name());
        Ok(result)
    }

    /// Fetch the last classification with a GET on the poll endpoint
    pub async fn fetch_classification(&self) -> Result<DetectionResult> {
        debug!(endpoint = %self.endpoints.poll, "Polling classification result");

        let response = self
            .http_client
            .get(self.endpoints.poll.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_json(response).await?;
        parse_classification(&body)
    }

    /// Save a server-produced file into `dir` and select it
    pub async fn download(
        &self,
        output_ref: &str,
        dir: &Path,
        probe: &dyn DurationProbe,
    ) -> Result<SelectedAudio> {
        let url = Url::parse(output_ref)
            .map_err(|e| VoiceCheckError::MalformedResponse(format!("Bad output reference '{}': {}", output_ref, e)))?;

        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .unwrap_or("output.wav")
            .to_string();

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;
        let response = require_success(response).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;

        tokio::fs::create_dir_all(dir).await?;
        let path = unique_path(dir, &name);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(name);
        tokio::fs::write(&path, &bytes).await?;
        info!("Downloaded {} ({} bytes) to {:?}", name, bytes.len(), path);

        let millis = probe.duration_millis(&path).unwrap_or_else(|e| {
            warn!("Could not read duration of {:?}: {}", path, e);
            None
        });
        SelectedAudio::new(path, name, millis_to_label(millis), AudioOrigin::Downloaded)
    }
}

fn transport_error(e: reqwest::Error) -> VoiceCheckError {
    if e.is_timeout() {
        VoiceCheckError::UploadFailed("Request timed out".to_string())
    } else {
        VoiceCheckError::UploadFailed(format!("Network error: {}", e))
    }
}

/// Non-2xx becomes `UploadFailed`, carrying the server's `error` text
async fn require_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);

    warn!(status = status.as_u16(), "Server rejected request: {}", detail);
    Err(VoiceCheckError::UploadFailed(format!("HTTP {}: {}", status.as_u16(), detail)))
}

async fn read_json(response: Response) -> Result<Value> {
    let response = require_success(response).await?;
    let text = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&text)
        .map_err(|e| VoiceCheckError::MalformedResponse(format!("Body is not JSON: {}", e)))
}
