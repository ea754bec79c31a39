mod common;

use std::sync::Arc;

use common::{wav_bytes, Harness};
use ttsplayer_lib::player::download::{DirectoryDownloader, SaveRequest};
use ttsplayer_lib::{
    AppState, AudioPlayerController, EventLoop, EventQueue, Gesture, HeadlessMediaElement,
    MediaElement, MediaEvent, MediaSource, PlayerSettings, PlayerStatus, Severity,
};
use ttsplayer_lib::media::MediaListener;

#[tokio::test]
async fn synthesized_audio_downloads_under_the_default_name() {
    let mut h = Harness::new();
    h.load_clip(1.0);
    let bytes = h.app.blobs.get(h.controller().media().src().unwrap()).unwrap().bytes;

    let task = h.event_loop.controller_mut().download().unwrap();
    task.await.unwrap();

    let saved = h.saved();
    assert_eq!(saved.len(), 1);
    match &saved[0] {
        SaveRequest::Bytes { bytes: saved_bytes, filename } => {
            assert_eq!(filename, "generated_audio.mp3");
            assert_eq!(saved_bytes, &bytes);
        }
        other => panic!("expected bytes, got {:?}", other),
    }
    // The element keeps its blob after downloading
    assert_eq!(h.app.blobs.len(), 1);
}

#[tokio::test]
async fn addressed_sources_keep_their_filename() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("speech.wav");
    std::fs::write(&input, wav_bytes(1000, 2.0)).unwrap();
    let url = url::Url::from_file_path(&input).unwrap();

    let mut h = Harness::new();
    h.gesture(Gesture::AttachSource(MediaSource::from(url.clone())));
    assert!(h.controller().view().download_enabled);

    let task = h.event_loop.controller_mut().download().unwrap();
    task.await.unwrap();

    match h.saved().as_slice() {
        [SaveRequest::Url { url: saved, filename_hint }] => {
            assert_eq!(saved, &url);
            assert_eq!(filename_hint, "speech.wav");
        }
        other => panic!("unexpected requests {:?}", other),
    }
}

#[tokio::test]
async fn failed_loads_cannot_be_downloaded() {
    let mut h = Harness::new();
    h.gesture(Gesture::AttachAudio {
        bytes: b"definitely not mpeg".to_vec(),
        content_type: "audio/mpeg".to_string(),
    });
    assert_eq!(h.controller().state().status, PlayerStatus::Failed);
    assert!(!h.controller().view().download_enabled);

    assert!(h.event_loop.controller_mut().download().is_none());
    h.gesture(Gesture::DownloadClicked);
    tokio::task::yield_now().await;
    h.event_loop.run_until_idle();
    assert!(h.saved().is_empty());
}

#[tokio::test]
async fn sources_still_loading_cannot_be_downloaded() {
    let mut h = Harness::new();
    h.load_clip(1.0);
    h.event_loop
        .controller_mut()
        .on_media_event(&MediaEvent::LoadStart);

    assert!(h.event_loop.controller_mut().download().is_none());
    assert!(h.saved().is_empty());
}

#[test]
fn nothing_loaded_warns_instead_of_saving() {
    let mut h = Harness::new();
    assert!(h.event_loop.controller_mut().download().is_none());

    let message = h.controller().view().banner.current().unwrap();
    assert_eq!(message.text, "No audio loaded to download.");
    assert_eq!(message.severity, Severity::Warning);
    assert!(h.saved().is_empty());
}

#[test]
fn page_address_is_not_audio() {
    let settings = PlayerSettings {
        page_address: "http://localhost:5000/".to_string(),
        ..PlayerSettings::default()
    };
    let mut h = Harness::with_settings(settings);
    h.gesture(Gesture::AttachSource(MediaSource::new("http://localhost:5000/")));

    assert!(h.event_loop.controller_mut().download().is_none());
    let message = h.controller().view().banner.current().unwrap();
    assert_eq!(message.severity, Severity::Warning);
    assert!(h.saved().is_empty());
}

#[tokio::test]
async fn revoked_blob_reports_a_fetch_failure() {
    let mut h = Harness::new();
    h.load_clip(1.0);
    let source = h.controller().media().src().cloned().unwrap();
    h.app.blobs.revoke(&source);

    let task = h.event_loop.controller_mut().download().unwrap();
    task.await.unwrap();
    assert!(h.controller().view().banner.current().is_none());

    // Failure arrives through the event queue
    h.event_loop.run_until_idle();
    let message = h.controller().view().banner.current().unwrap();
    assert_eq!(message.severity, Severity::Danger);
    assert!(message.text.starts_with("Error downloading audio"));
    assert!(h.saved().is_empty());
}

#[test]
fn download_outside_a_runtime_is_reported() {
    let mut h = Harness::new();
    h.load_clip(1.0);
    assert!(h.event_loop.controller_mut().download().is_none());

    let message = h.controller().view().banner.current().unwrap();
    assert_eq!(message.severity, Severity::Danger);
}

#[tokio::test]
async fn file_sources_land_in_the_download_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("speech.wav");
    std::fs::write(&input, wav_bytes(1000, 1.5)).unwrap();
    let downloads = dir.path().join("downloads");

    let app = AppState::new(
        PlayerSettings::default(),
        Arc::new(DirectoryDownloader::new(&downloads)),
        dir.path().to_path_buf(),
    );
    let queue = EventQueue::new();
    let host = queue.sender();
    let media = HeadlessMediaElement::new(host.media_sink(), app.blobs.clone());
    let mut event_loop = EventLoop::new(AudioPlayerController::new(media, app, host), queue);

    let url = url::Url::from_file_path(&input).unwrap();
    event_loop.gesture(Gesture::AttachSource(MediaSource::from(url)));
    event_loop.run_until_idle();
    assert_eq!(event_loop.controller().view().duration_label, "0:01");
    assert!(event_loop.controller().view().download_enabled);

    for _ in 0..2 {
        let task = event_loop.controller_mut().download().unwrap();
        task.await.unwrap();
    }

    assert_eq!(
        std::fs::read(downloads.join("speech.wav")).unwrap(),
        std::fs::read(&input).unwrap()
    );
    assert!(downloads.join("speech (1).wav").exists());
}
