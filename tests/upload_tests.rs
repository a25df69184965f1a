//! Upload client tests against an in-process detection server
//!
//! The server mimics the real endpoints closely enough to check multipart
//! field names, content types and every response shape.

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use voicecheck::audio::{
    write_wav, AudioOrigin, AudioSource, PathListPicker, SelectedAudio, SystemClock,
    UnavailableMicrophone, WavProbe,
};
use voicecheck::config::{RecordingConfig, ServerConfig};
use voicecheck::flow::{Route, Screen, Workflow};
use voicecheck::playback::{PlaybackController, UnavailableOutput};
use voicecheck::upload::{DetectionRequest, DetectionResult, Operation, UploadClient};
use voicecheck::VoiceCheckError;

/// One multipart part as the server saw it
#[derive(Debug, Clone)]
struct ReceivedPart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    len: usize,
}

#[derive(Clone)]
struct ServerState {
    base: String,
    received: Arc<Mutex<Vec<ReceivedPart>>>,
    wav: Arc<Vec<u8>>,
}

async fn record_parts(state: &ServerState, mut multipart: Multipart) {
    while let Ok(Some(field)) = multipart.next_field().await {
        let part = ReceivedPart {
            field: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            len: 0,
        };
        let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        state.received.lock().push(ReceivedPart { len, ..part });
    }
}

async fn upload_audio(State(state): State<ServerState>, multipart: Multipart) -> Json<Value> {
    record_parts(&state, multipart).await;
    Json(json!({
        "result_binary": [0.2, 0.8],
        "result_multi": [0.8, 0.05, 0.05, 0.02, 0.03, 0.03, 0.02],
    }))
}

async fn generate(State(state): State<ServerState>, multipart: Multipart) -> Json<Value> {
    record_parts(&state, multipart).await;
    Json(json!({
        "message": "Watermark added",
        "filePath": format!("{}/get_audio/watermarked_clip.wav", state.base),
    }))
}

async fn detect(State(state): State<ServerState>, multipart: Multipart) -> Json<Value> {
    record_parts(&state, multipart).await;
    Json(json!({ "watermark_detected": 0.93, "binary_message": [1, 0, 1, 0] }))
}

async fn attack(State(state): State<ServerState>, multipart: Multipart) -> Json<Value> {
    record_parts(&state, multipart).await;
    Json(json!({
        "message": "Protected",
        "file_path": format!("{}/get_audio/adversarial_clip.wav", state.base),
    }))
}

async fn poll_result() -> Json<Value> {
    Json(json!({ "real": 0.35, "fake": 0.65 }))
}

async fn get_audio(State(state): State<ServerState>, UrlPath(name): UrlPath<String>) -> (StatusCode, Vec<u8>) {
    if name.ends_with(".wav") {
        (StatusCode::OK, state.wav.as_ref().clone())
    } else {
        (StatusCode::NOT_FOUND, Vec::new())
    }
}

async fn broken() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "model crashed" })),
    )
}

async fn not_json() -> &'static str {
    "<html>maintenance</html>"
}

async fn app_error() -> Json<Value> {
    Json(json!({ "error": "No audio file provided" }))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "result_binary": [0.5, 0.5] }))
}

/// Two seconds of 16 kHz mono silence
fn wav_bytes(dir: &Path) -> Vec<u8> {
    let path = dir.join("served.wav");
    write_wav(&path, &vec![0.0; 32000], 16000, 1).unwrap();
    std::fs::read(path).unwrap()
}

async fn spawn_server(dir: &Path) -> (String, ServerState) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let state = ServerState {
        base: base.clone(),
        received: Arc::new(Mutex::new(Vec::new())),
        wav: Arc::new(wav_bytes(dir)),
    };

    let app = Router::new()
        .route("/upload_audio", post(upload_audio))
        .route("/generate", post(generate))
        .route("/detect", post(detect))
        .route("/attack", post(attack))
        .route("/get_binary_classification_result", get(poll_result))
        .route("/get_audio/:name", get(get_audio))
        .route("/broken", post(broken))
        .route("/not_json", post(not_json))
        .route("/app_error", post(app_error))
        .route("/slow", post(slow))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base, state)
}

fn clip(dir: &Path, name: &str) -> SelectedAudio {
    let path = dir.join(name);
    write_wav(&path, &vec![0.1; 16000], 16000, 1).unwrap();
    SelectedAudio::new(path, name, "0:01", AudioOrigin::Picked).unwrap()
}

fn url(base: &str, path: &str) -> reqwest::Url {
    reqwest::Url::parse(&format!("{}{}", base, path)).unwrap()
}

#[tokio::test]
async fn test_classify_sends_audio_field_and_normalizes() {
    let dir = TempDir::new().unwrap();
    let (base, state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    let request = DetectionRequest::new(clip(dir.path(), "voice.wav"), Operation::Classify);
    let result = client.submit(&request).await.unwrap();

    match result {
        DetectionResult::Classification {
            real_percentage,
            fake_percentage,
            attribution,
        } => {
            assert!((real_percentage - 80.0).abs() < 1e-9);
            assert!((fake_percentage - 20.0).abs() < 1e-9);
            assert_eq!(attribution.map(|a| a.len()), Some(7));
        }
        other => panic!("unexpected result {:?}", other),
    }

    let received = state.received.lock().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].field, "audio");
    assert_eq!(received[0].file_name.as_deref(), Some("voice.wav"));
    assert_eq!(received[0].content_type.as_deref(), Some("audio/wav"));
    assert!(received[0].len > 44);
}

#[tokio::test]
async fn test_protect_uses_file_field() {
    let dir = TempDir::new().unwrap();
    let (base, state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    let request = DetectionRequest::new(clip(dir.path(), "voice.wav"), Operation::Protect);
    let result = client.submit(&request).await.unwrap();

    assert_eq!(
        result.output_ref(),
        Some(format!("{}/get_audio/adversarial_clip.wav", base).as_str())
    );
    assert_eq!(state.received.lock()[0].field, "file");
}

#[tokio::test]
async fn test_watermark_detect_score() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    let request = DetectionRequest::new(clip(dir.path(), "voice.wav"), Operation::WatermarkDetect);
    assert_eq!(
        client.submit(&request).await.unwrap(),
        DetectionResult::WatermarkDetection {
            detected: true,
            message_bits: Some(vec![1, 0, 1, 0]),
        }
    );
}

#[tokio::test]
async fn test_poll_reads_real_fake_schema() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    match client.fetch_classification().await.unwrap() {
        DetectionResult::Classification {
            real_percentage,
            fake_percentage,
            attribution,
        } => {
            assert!((real_percentage - 35.0).abs() < 1e-9);
            assert!((fake_percentage - 65.0).abs() < 1e-9);
            assert!(attribution.is_none());
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_carries_message() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    let request = DetectionRequest::new(clip(dir.path(), "voice.wav"), Operation::Classify);
    let err = client.submit_to(&request, &url(&base, "/broken")).await.unwrap_err();

    assert_eq!(err, VoiceCheckError::UploadFailed("HTTP 500: model crashed".into()));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    let request = DetectionRequest::new(clip(dir.path(), "voice.wav"), Operation::Classify);
    let err = client.submit_to(&request, &url(&base, "/not_json")).await.unwrap_err();

    assert!(matches!(err, VoiceCheckError::MalformedResponse(_)));
    assert!(err.is_upload_failure());
}

#[tokio::test]
async fn test_application_error_on_success_status() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    let request = DetectionRequest::new(clip(dir.path(), "voice.wav"), Operation::WatermarkAdd);
    let err = client.submit_to(&request, &url(&base, "/app_error")).await.unwrap_err();

    assert_eq!(err, VoiceCheckError::UploadFailed("No audio file provided".into()));
}

#[tokio::test]
async fn test_request_timeout() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let mut config = ServerConfig::with_base_url(&base);
    config.request_timeout_secs = 1;
    let client = UploadClient::new(&config).unwrap();

    let request = DetectionRequest::new(clip(dir.path(), "voice.wav"), Operation::Classify);
    let err = client.submit_to(&request, &url(&base, "/slow")).await.unwrap_err();

    assert_eq!(err, VoiceCheckError::UploadFailed("Request timed out".into()));
}

#[tokio::test]
async fn test_missing_file_fails_before_sending() {
    let dir = TempDir::new().unwrap();
    let (base, state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    let gone = SelectedAudio::new(dir.path().join("gone.wav"), "gone.wav", "00:00", AudioOrigin::Picked).unwrap();
    let err = client
        .submit(&DetectionRequest::new(gone, Operation::Classify))
        .await
        .unwrap_err();

    assert!(matches!(err, VoiceCheckError::UploadFailed(_)));
    assert!(state.received.lock().is_empty());
}

#[tokio::test]
async fn test_download_probes_duration() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();
    let downloads = dir.path().join("downloads");

    let audio = client
        .download(&format!("{}/get_audio/watermarked_clip.wav", base), &downloads, &WavProbe)
        .await
        .unwrap();

    assert_eq!(audio.origin(), AudioOrigin::Downloaded);
    assert_eq!(audio.display_name(), "watermarked_clip.wav");
    assert_eq!(audio.duration_label(), "0:02");
    assert!(audio.uri().starts_with(&downloads));
}

#[tokio::test]
async fn test_repeated_download_keeps_earlier_file() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();
    let downloads = dir.path().join("downloads");
    let output_ref = format!("{}/get_audio/watermarked_clip.wav", base);

    let first = client.download(&output_ref, &downloads, &WavProbe).await.unwrap();
    std::fs::write(first.uri(), b"edited locally").unwrap();
    let second = client.download(&output_ref, &downloads, &WavProbe).await.unwrap();

    assert_ne!(first.uri(), second.uri());
    assert_eq!(second.display_name(), "watermarked_clip_1.wav");
    assert_eq!(std::fs::read(first.uri()).unwrap(), b"edited locally");
    assert_eq!(second.duration_label(), "0:02");
}

#[tokio::test]
async fn test_download_not_found() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let client = UploadClient::new(&ServerConfig::with_base_url(&base)).unwrap();

    let err = client
        .download(&format!("{}/get_audio/missing.mp3", base), dir.path(), &WavProbe)
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceCheckError::UploadFailed(_)));
}

fn workflow(server: ServerConfig, files: Vec<PathBuf>, download_dir: &Path) -> Workflow {
    let source = AudioSource::new(
        Box::new(PathListPicker::new(files)),
        Box::new(WavProbe),
        Box::new(UnavailableMicrophone),
        Arc::new(SystemClock),
        RecordingConfig::default(),
    );
    Workflow::new(
        source,
        PlaybackController::new(Box::new(UnavailableOutput)),
        UploadClient::new(&server).unwrap(),
        download_dir.to_path_buf(),
    )
}

#[tokio::test]
async fn test_workflow_submit_shows_result() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let file = clip(dir.path(), "voice.wav").uri().to_path_buf();
    let mut flow = workflow(ServerConfig::with_base_url(&base), vec![file], dir.path());

    flow.pick().unwrap();
    flow.open_playback().unwrap();
    flow.submit(Operation::Classify).await.unwrap();

    assert_eq!(flow.screen(), Screen::Result);
    let shown = flow.presentation().unwrap();
    assert_eq!(shown.lines[0], "REAL 80.00%");
    assert_eq!(shown.lines[1], "FAKE 20.00%");

    flow.back().unwrap();
    assert_eq!(flow.screen(), Screen::Playback);
    assert_eq!(flow.selected().map(|a| a.display_name()), Some("voice.wav"));
}

#[tokio::test]
async fn test_workflow_keeps_clip_after_failed_upload() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let mut server = ServerConfig::with_base_url(&base);
    server.classify_url = format!("{}/broken", base);
    let file = clip(dir.path(), "voice.wav").uri().to_path_buf();
    let mut flow = workflow(server, vec![file], dir.path());

    flow.pick().unwrap();
    flow.open_playback().unwrap();
    let err = flow.submit(Operation::Classify).await.unwrap_err();

    assert!(err.is_upload_failure());
    assert_eq!(flow.screen(), Screen::Playback);
    assert!(flow.selected().is_some());

    let note = flow.notify(&err).clone();
    assert_eq!(note.message, "Failed to send audio to server.");
    assert_eq!(flow.take_notification(), Some(note));
}

#[tokio::test]
async fn test_workflow_watermark_and_download() {
    let dir = TempDir::new().unwrap();
    let (base, _state) = spawn_server(dir.path()).await;
    let file = clip(dir.path(), "voice.wav").uri().to_path_buf();
    let downloads = dir.path().join("out");
    let mut flow = workflow(ServerConfig::with_base_url(&base), vec![file], &downloads);

    flow.pick().unwrap();
    flow.navigate(Route::Watermark).unwrap();
    flow.submit(Operation::WatermarkAdd).await.unwrap();
    assert_eq!(flow.screen(), Screen::Result);

    let saved = flow.download().await.unwrap();
    assert_eq!(saved.origin(), AudioOrigin::Downloaded);
    assert!(saved.uri().exists());
    assert_eq!(flow.selected(), Some(&saved));
}

#[tokio::test]
async fn test_workflow_result_requires_a_source_screen() {
    let dir = TempDir::new().unwrap();
    let (base, state) = spawn_server(dir.path()).await;
    let file = clip(dir.path(), "voice.wav").uri().to_path_buf();
    let mut flow = workflow(ServerConfig::with_base_url(&base), vec![file], dir.path());

    flow.pick().unwrap();
    let err = flow.submit(Operation::Classify).await.unwrap_err();

    assert!(matches!(err, VoiceCheckError::Navigation(_)));
    assert!(state.received.lock().is_empty());
}
