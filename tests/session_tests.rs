// End-to-end session tests: synthetic capture -> aggregation -> WebSocket
// stub server -> transcript reconciliation

use anyhow::Result;
use futures::{SinkExt, StreamExt};
use livecap::audio::{AudioFrame, CaptureError, SampleSource, SyntheticSource};
use livecap::transport::wire::decode_samples;
use livecap::{SessionConfig, SessionController, SessionState};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

/// Session tuned for fast tests: 50ms cadence, small frames
fn test_session_config(origin: String) -> SessionConfig {
    SessionConfig {
        server_origin: origin,
        frame_len: 800, // 50ms at 16kHz
        chunk_interval: Duration::from_millis(50),
        reconnect_backoff: Duration::from_millis(200),
        ..SessionConfig::default()
    }
}

fn synthetic_source(frame_count: usize) -> SyntheticSource {
    SyntheticSource::new(
        SyntheticSource::silence(frame_count, 800, 16000),
        Duration::from_millis(10),
    )
}

/// Stub backend: forwards every received message to the test and answers the
/// first audio chunk with an interim/interim/final transcription sequence.
async fn spawn_stub_backend() -> (String, mpsc::Receiver<serde_json::Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("ws://{}", listener.local_addr().unwrap());
    let (events_tx, events_rx) = mpsc::channel::<serde_json::Value>(64);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut answered = false;

        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else {
                if matches!(message, Message::Close(_)) {
                    break;
                }
                continue;
            };

            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            let is_audio = value["type"] == "audio_data";
            let _ = events_tx.send(value).await;

            if is_audio && !answered {
                answered = true;
                let replies = [
                    r#"{"type":"transcription","text":"hello","final":false}"#,
                    r#"{"type":"transcription","text":"hello world","final":false}"#,
                    r#"{"type":"transcription","text":"hello world.","final":true}"#,
                ];
                for reply in replies {
                    ws.send(Message::Text(reply.to_string().into()))
                        .await
                        .unwrap();
                }
            }
        }
    });

    (origin, events_rx)
}

#[tokio::test]
async fn streams_audio_and_reconciles_results() -> Result<()> {
    let (origin, mut events_rx) = spawn_stub_backend().await;

    let controller = SessionController::new(
        test_session_config(origin),
        Box::new(synthetic_source(40)),
    );

    controller.start().await?;
    assert_eq!(controller.state(), SessionState::Recording);

    // The backend must receive decodable silence chunks
    let first_chunk = timeout(Duration::from_secs(2), events_rx.recv())
        .await?
        .expect("backend received a chunk");
    assert_eq!(first_chunk["type"], "audio_data");
    let samples = decode_samples(first_chunk["data"].as_str().unwrap())?;
    assert!(!samples.is_empty());
    assert!(samples.iter().all(|s| *s == 0.0));

    // Interim results get superseded by the final commit
    timeout(Duration::from_secs(2), async {
        loop {
            let transcript = controller.transcript().await;
            if transcript.committed() == ["hello world.".to_string()].as_slice()
                && transcript.pending().is_none()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("final transcription committed");

    let stats = controller.stop().await?;
    assert_eq!(controller.state(), SessionState::Idle);
    assert!(stats.chunks_sent >= 1);
    assert_eq!(stats.committed_paragraphs, 1);
    assert!(!stats.has_pending);
    assert!(!stats.is_recording);

    // Best-effort end-of-stream marker arrives before the close
    let end_stream = timeout(Duration::from_secs(2), async {
        while let Some(event) = events_rx.recv().await {
            if event["type"] == "end_stream" {
                return true;
            }
        }
        false
    })
    .await?;
    assert!(end_stream, "backend saw the end_stream marker");

    Ok(())
}

#[tokio::test]
async fn chunks_are_dropped_while_disconnected() -> Result<()> {
    // Nothing is listening on this origin; the transport never opens
    let controller = SessionController::new(
        test_session_config("ws://127.0.0.1:9".to_string()),
        Box::new(synthetic_source(20)),
    );

    controller.start().await?;
    tokio::time::sleep(Duration::from_millis(250)).await;

    let stats = controller.stop().await?;
    assert_eq!(stats.chunks_sent, 0, "no chunk transmitted while closed");
    assert_eq!(controller.state(), SessionState::Idle);

    Ok(())
}

#[tokio::test]
async fn start_and_stop_are_idempotent() -> Result<()> {
    let controller = SessionController::new(
        test_session_config("ws://127.0.0.1:9".to_string()),
        Box::new(synthetic_source(10)),
    );

    // Stop while Idle is a no-op
    let stats = controller.stop().await?;
    assert!(!stats.is_recording);
    assert_eq!(controller.state(), SessionState::Idle);

    controller.start().await?;
    // Start while Recording is a no-op
    controller.start().await?;
    assert_eq!(controller.state(), SessionState::Recording);

    controller.stop().await?;
    assert_eq!(controller.state(), SessionState::Idle);

    // Second stop raises no error and changes nothing
    let stats = controller.stop().await?;
    assert!(!stats.is_recording);
    assert_eq!(controller.state(), SessionState::Idle);

    Ok(())
}

/// Source whose device can never be acquired
struct FailingSource;

#[async_trait::async_trait]
impl SampleSource for FailingSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        Err(CaptureError::DeviceUnavailable(
            "permission denied".to_string(),
        ))
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn device_unavailable_fails_start_and_stays_idle() {
    let controller = SessionController::new(
        test_session_config("ws://127.0.0.1:9".to_string()),
        Box::new(FailingSource),
    );

    let err = controller.start().await.expect_err("start must fail");
    assert!(matches!(
        err.downcast_ref::<CaptureError>(),
        Some(CaptureError::DeviceUnavailable(_))
    ));

    assert_eq!(controller.state(), SessionState::Idle);

    // Recoverable: stop is still a safe no-op afterwards
    let stats = controller.stop().await.unwrap();
    assert!(!stats.is_recording);
}
