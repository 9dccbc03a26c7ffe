use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::accumulator::Flush;
use super::config::WriteFailurePolicy;
use super::stats::IngestCounters;
use super::writer::ArtifactSink;
use crate::audio::{encode_container, WavFormat};
use crate::error::{IngestError, Result};

/// A flushed batch with its WAV header applied
#[derive(Debug, Clone)]
pub struct EncodedArtifact {
    pub sequence: u64,
    pub bytes: Vec<u8>,
}

impl EncodedArtifact {
    pub fn encode(flush: Flush, format: &WavFormat) -> Result<Self> {
        Ok(Self {
            sequence: flush.sequence,
            bytes: encode_container(&flush.data, format)?,
        })
    }
}

/// Writes artifacts to a sink and applies the failure policy
pub(crate) struct Persister {
    sink: Arc<dyn ArtifactSink>,
    policy: WriteFailurePolicy,
    max_retained: usize,
    retained: Mutex<VecDeque<EncodedArtifact>>,
    counters: Arc<IngestCounters>,
}

impl Persister {
    pub fn new(
        sink: Arc<dyn ArtifactSink>,
        policy: WriteFailurePolicy,
        max_retained: usize,
        counters: Arc<IngestCounters>,
    ) -> Self {
        Self {
            sink,
            policy,
            max_retained,
            retained: Mutex::new(VecDeque::new()),
            counters,
        }
    }

    /// Retry the backlog, then write `artifact`
    pub async fn persist(&self, artifact: EncodedArtifact) -> Result<PathBuf> {
        self.retry_retained().await;

        let sequence = artifact.sequence;
        match self.sink.write(sequence, &artifact.bytes).await {
            Ok(path) => {
                self.counters.record_write();
                info!(
                    "WAV file saved: {} ({} bytes)",
                    path.display(),
                    artifact.bytes.len()
                );
                Ok(path)
            }
            Err(e) => {
                self.counters.record_failure();
                self.on_failure(artifact, &e).await;
                Err(e)
            }
        }
    }

    /// Write retained artifacts oldest first, stopping at the first failure
    ///
    /// The artifact that failed goes back to the front of the queue, so order
    /// is preserved and a sink that is still down costs one attempt.
    pub async fn retry_retained(&self) {
        loop {
            let Some(artifact) = self.retained.lock().await.pop_front() else {
                return;
            };

            match self.sink.write(artifact.sequence, &artifact.bytes).await {
                Ok(path) => {
                    self.counters.record_write();
                    info!("Retained artifact written: {}", path.display());
                }
                Err(e @ IngestError::ArtifactExists(_)) => {
                    self.counters.record_failure();
                    error!(
                        "Dropping retained batch {} ({} bytes): {}",
                        artifact.sequence,
                        artifact.bytes.len(),
                        e
                    );
                }
                Err(e) => {
                    self.counters.record_failure();
                    warn!(
                        "Retry of batch {} via {} sink failed: {}",
                        artifact.sequence,
                        self.sink.name(),
                        e
                    );
                    self.retained.lock().await.push_front(artifact);
                    return;
                }
            }
        }
    }

    /// Keep or discard an artifact whose write failed
    pub async fn on_failure(&self, artifact: EncodedArtifact, err: &IngestError) {
        let sequence = artifact.sequence;

        // Retrying can never succeed once the name is taken
        let retain = self.policy == WriteFailurePolicy::Retain
            && !matches!(err, IngestError::ArtifactExists(_));

        if retain {
            let mut retained = self.retained.lock().await;
            if retained.len() < self.max_retained {
                warn!(
                    "Write of batch {} via {} sink failed, retaining for retry: {}",
                    sequence,
                    self.sink.name(),
                    err
                );
                retained.push_back(artifact);
                return;
            }

            error!(
                "Retry queue full ({} batches), dropping batch {} ({} bytes): {}",
                retained.len(),
                sequence,
                artifact.bytes.len(),
                err
            );
        } else {
            error!(
                "Write of batch {} via {} sink failed, dropping {} bytes: {}",
                sequence,
                self.sink.name(),
                artifact.bytes.len(),
                err
            );
        }
    }

    pub async fn retained_count(&self) -> usize {
        self.retained.lock().await.len()
    }
}

/// Handle to the task that writes artifacts off the request path
pub(crate) struct BackgroundWriter {
    tx: mpsc::Sender<EncodedArtifact>,
    handle: JoinHandle<()>,
}

impl BackgroundWriter {
    pub fn spawn(persister: Arc<Persister>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<EncodedArtifact>(capacity);

        let handle = tokio::spawn(async move {
            info!("Background writer started");

            while let Some(artifact) = rx.recv().await {
                let sequence = artifact.sequence;
                if let Err(e) = persister.persist(artifact).await {
                    error!("Background write of batch {} failed: {}", sequence, e);
                }
            }

            info!("Background writer stopped");
        });

        Self { tx, handle }
    }

    pub fn sender(&self) -> mpsc::Sender<EncodedArtifact> {
        self.tx.clone()
    }

    /// Close the queue and wait for everything already queued to be written
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            error!("Background writer panicked: {}", e);
        }
    }
}
