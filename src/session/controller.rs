use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::observer::{SessionObserver, SessionStatus};
use super::stats::SessionStats;
use crate::audio::{ChunkAggregator, SampleSource};
use crate::transcript::{Transcript, TranscriptReconciler};
use crate::transport::{wire, ConnectionState, OutboundMessage, Transport, TransportConfig};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopping,
}

/// Orchestrates capture, chunking, transport and transcript reconciliation
///
/// Owns the single sample source and the single transport instance. Start
/// while Recording and stop while Idle are no-ops; no concurrent start/stop
/// races are permitted by the callers.
pub struct SessionController {
    config: SessionConfig,
    source: Mutex<Box<dyn SampleSource>>,
    transport: Mutex<Option<Transport>>,
    observer: Option<Arc<dyn SessionObserver>>,

    state_tx: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,

    transcript: Arc<Mutex<Transcript>>,
    chunks_sent: Arc<AtomicUsize>,
    started_at: Mutex<chrono::DateTime<Utc>>,

    pump_task: Mutex<Option<JoinHandle<()>>>,
    reconcile_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(config: SessionConfig, source: Box<dyn SampleSource>) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        Self {
            config,
            source: Mutex::new(source),
            transport: Mutex::new(None),
            observer: None,
            state_tx,
            state_rx,
            transcript: Arc::new(Mutex::new(Transcript::new())),
            chunks_sent: Arc::new(AtomicUsize::new(0)),
            started_at: Mutex::new(Utc::now()),
            pump_task: Mutex::new(None),
            reconcile_task: Mutex::new(None),
        }
    }

    /// Attach a UI observer for status and transcript notifications
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to lifecycle transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Start recording
    ///
    /// Fails with `CaptureError::DeviceUnavailable` (and stays Idle) when the
    /// microphone cannot be acquired. A transport connection failure does not
    /// block the start; the transport keeps connecting in the background and
    /// chunks produced in the meantime are dropped.
    pub async fn start(&self) -> Result<()> {
        if self.state() != SessionState::Idle {
            warn!("Start requested while already recording");
            return Ok(());
        }

        info!("Starting captioning session: {}", self.config.session_id);

        let url = wire::endpoint_url(&self.config.server_origin)
            .context("Invalid server origin in session config")?;

        // Device acquisition is the only failure that blocks the start
        let frame_rx = {
            let mut source = self.source.lock().await;
            source.start().await?
        };

        let (inbound_tx, inbound_rx) = mpsc::channel(32);
        let transport = Transport::spawn(
            TransportConfig {
                url,
                reconnect_backoff: self.config.reconnect_backoff,
            },
            inbound_tx,
        );
        let handle = transport.handle();

        {
            let mut slot = self.transport.lock().await;
            *slot = Some(transport);
        }

        self.chunks_sent.store(0, Ordering::SeqCst);
        {
            let mut started_at = self.started_at.lock().await;
            *started_at = Utc::now();
        }
        let _ = self.state_tx.send(SessionState::Recording);

        // Pump: frames -> aggregator -> transport
        let chunk_interval = self.config.chunk_interval;
        let toggle_every = self.config.status_toggle_every.max(1);
        let chunks_sent = Arc::clone(&self.chunks_sent);
        let observer = self.observer.clone();

        let pump = tokio::spawn(async move {
            info!("Audio pump started");

            let mut frame_rx = frame_rx;
            let mut aggregator = ChunkAggregator::new(chunk_interval);

            while let Some(frame) = frame_rx.recv().await {
                let Some(chunk) = aggregator.push(&frame) else {
                    continue;
                };

                if handle.state() != ConnectionState::Open {
                    debug!(
                        "Chunk dropped: connection not open ({} samples)",
                        chunk.samples.len()
                    );
                    continue;
                }

                handle.send(OutboundMessage::audio(&chunk.samples));
                let sent = chunks_sent.fetch_add(1, Ordering::SeqCst) + 1;

                if let Some(observer) = &observer {
                    let status = if sent % toggle_every == 0 {
                        SessionStatus::Processing
                    } else {
                        SessionStatus::Listening
                    };
                    observer.status_changed(status);
                }
            }

            // Session over: whatever is still buffered is discarded,
            // never force-flushed
            aggregator.reset();
            info!("Audio pump stopped");
        });

        {
            let mut slot = self.pump_task.lock().await;
            *slot = Some(pump);
        }

        // Reconciler: inbound results -> transcript
        let reconciler =
            TranscriptReconciler::new(Arc::clone(&self.transcript), self.observer.clone());
        let reconcile = tokio::spawn(reconciler.run(inbound_rx));

        {
            let mut slot = self.reconcile_task.lock().await;
            *slot = Some(reconcile);
        }

        if let Some(observer) = &self.observer {
            observer.status_changed(SessionStatus::Listening);
        }

        info!("Captioning session started");

        Ok(())
    }

    /// Stop recording
    ///
    /// Idempotent: a stop while not Recording returns current stats and does
    /// nothing else. This is also the mandatory teardown path; when it
    /// returns, the device is released and the connection closed.
    pub async fn stop(&self) -> Result<SessionStats> {
        if self.state() != SessionState::Recording {
            warn!("Stop requested while not recording");
            return self.stats().await;
        }

        let _ = self.state_tx.send(SessionState::Stopping);
        info!("Stopping captioning session: {}", self.config.session_id);

        // Stop the source first: no further frames are delivered
        {
            let mut source = self.source.lock().await;
            if let Err(e) = source.stop().await {
                error!("Failed to stop sample source: {:#}", e);
            }
        }

        // The frame channel closes with the source, ending the pump
        {
            let mut slot = self.pump_task.lock().await;
            if let Some(task) = slot.take() {
                if let Err(e) = task.await {
                    error!("Audio pump panicked: {}", e);
                }
            }
        }

        // Best-effort end-of-stream marker, then close; shutdown cancels
        // any pending reconnect
        let transport = {
            let mut slot = self.transport.lock().await;
            slot.take()
        };
        if let Some(mut transport) = transport {
            if transport.state() == ConnectionState::Open {
                transport.send(OutboundMessage::EndStream);
            }
            transport.shutdown().await;
        }

        // The inbound channel closes with the transport, ending the reconciler
        {
            let mut slot = self.reconcile_task.lock().await;
            if let Some(task) = slot.take() {
                if let Err(e) = task.await {
                    error!("Transcript reconciler panicked: {}", e);
                }
            }
        }

        let _ = self.state_tx.send(SessionState::Idle);
        info!("Captioning session stopped");

        self.stats().await
    }

    /// Current session statistics
    pub async fn stats(&self) -> Result<SessionStats> {
        let started_at = *self.started_at.lock().await;
        let duration = Utc::now().signed_duration_since(started_at);

        let (committed_paragraphs, has_pending) = {
            let transcript = self.transcript.lock().await;
            (transcript.committed().len(), transcript.pending().is_some())
        };

        Ok(SessionStats {
            is_recording: self.state() == SessionState::Recording,
            started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_sent: self.chunks_sent.load(Ordering::SeqCst),
            committed_paragraphs,
            has_pending,
        })
    }

    /// Snapshot of the accumulated transcript
    pub async fn transcript(&self) -> Transcript {
        self.transcript.lock().await.clone()
    }
}
