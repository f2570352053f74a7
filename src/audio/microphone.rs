// Microphone capture via cpal
//
// The cpal stream is not Send, so a dedicated thread owns it for the
// lifetime of the capture. The input callback fills fixed-length frames and
// pushes them into a tokio channel; a full channel drops the frame rather
// than blocking the audio callback.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::source::{AudioFrame, CaptureConfig, CaptureError, SampleSource};

/// Frame channel depth. At 4096 samples per frame and 16kHz this buffers
/// roughly 16 seconds before frames start dropping.
const FRAME_CHANNEL_DEPTH: usize = 64;

/// Real microphone sample source
pub struct MicrophoneSource {
    config: CaptureConfig,
    stop_flag: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl MicrophoneSource {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

#[async_trait::async_trait]
impl SampleSource for MicrophoneSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::AlreadyCapturing);
        }

        info!(
            "Starting microphone capture ({}Hz, {} channels, {} samples/frame)",
            self.config.sample_rate, self.config.channels, self.config.frame_len
        );

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_DEPTH);
        let (ready_tx, ready_rx) = oneshot::channel();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let config = self.config.clone();
        let stop = Arc::clone(&stop_flag);
        let worker = std::thread::spawn(move || capture_thread(config, frame_tx, ready_tx, stop));

        // The capture thread reports acquisition success or failure before
        // entering its run loop, so start fails synchronously and leaves
        // nothing allocated on error.
        match ready_rx.await {
            Ok(Ok(())) => {
                self.stop_flag = stop_flag;
                self.worker = Some(worker);
                info!("Microphone capture started successfully");
                Ok(frame_rx)
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(CaptureError::DeviceUnavailable(
                    "capture thread exited during setup".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        info!("Stopping microphone capture");

        self.stop_flag.store(true, Ordering::SeqCst);

        // Joining releases the stream and the device before stop returns
        tokio::task::spawn_blocking(move || worker.join())
            .await
            .context("Failed to join capture thread")?
            .map_err(|_| anyhow::anyhow!("Capture thread panicked"))?;

        info!("Microphone capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

fn capture_thread(
    config: CaptureConfig,
    frame_tx: mpsc::Sender<AudioFrame>,
    ready_tx: oneshot::Sender<Result<(), CaptureError>>,
    stop: Arc<AtomicBool>,
) {
    let stream = match open_stream(&config, frame_tx) {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));
            stream
        }
        Err(e) => {
            // Everything acquired so far drops on return
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(20));
    }

    // Dropping the stream stops the callback; no frame is delivered after
    // the owning thread is joined.
    drop(stream);
}

fn open_stream(
    config: &CaptureConfig,
    frame_tx: mpsc::Sender<AudioFrame>,
) -> Result<cpal::Stream, CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CaptureError::DeviceUnavailable("no input device found".to_string()))?;

    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
    debug!("Using input device: {}", device_name);

    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let frame_len = config.frame_len;
    let sample_rate = config.sample_rate;
    let channels = config.channels;
    let started = Instant::now();
    let mut pending: Vec<f32> = Vec::with_capacity(frame_len);

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    pending.push(sample);
                    if pending.len() == frame_len {
                        let frame = AudioFrame {
                            samples: std::mem::replace(&mut pending, Vec::with_capacity(frame_len)),
                            sample_rate,
                            channels,
                            timestamp_ms: started.elapsed().as_millis() as u64,
                        };
                        if frame_tx.try_send(frame).is_err() {
                            debug!("Audio frame dropped: downstream full or closed");
                        }
                    }
                }
            },
            |err| error!("Input stream error: {}", err),
            None,
        )
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

    Ok(stream)
}
