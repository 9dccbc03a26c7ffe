use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::accumulator::{Accumulator, FlushResult};
use super::config::{IngestOptions, WriteMode};
use super::persist::{BackgroundWriter, EncodedArtifact, Persister};
use super::stats::{IngestCounters, IngestStatus};
use super::writer::{artifact_file_name, ArtifactSink};
use crate::audio::WavFormat;
use crate::error::{IngestError, Result};

/// Queue depth between request handlers and the background writer
const WRITER_QUEUE_CAPACITY: usize = 100;

/// What happened to a single chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Buffered; batch not full yet
    Accepted { pending: usize },

    /// Batch completed and written
    Persisted { sequence: u64, path: PathBuf },

    /// Batch completed and handed to the background writer
    Queued { sequence: u64 },
}

/// Shared accumulation state plus the path from full batches to WAV files
///
/// One instance serves every client. `ingest` holds the accumulator lock only for
/// the push itself; encoding and writing happen after it is released.
pub struct IngestService {
    accumulator: Mutex<Accumulator>,
    format: WavFormat,
    write_mode: WriteMode,
    persister: Arc<Persister>,
    background: Mutex<Option<BackgroundWriter>>,
    counters: Arc<IngestCounters>,
    started_at: DateTime<Utc>,
}

impl IngestService {
    /// Create a service writing to `sink`
    ///
    /// Numbering resumes after whatever the sink already holds. Must be called
    /// inside a tokio runtime when `write_mode` is `Background`.
    pub async fn new(options: IngestOptions, sink: Arc<dyn ArtifactSink>) -> Result<Self> {
        options.format.validate()?;

        let next_sequence = sink.next_sequence().await?;
        let accumulator = Accumulator::starting_at(options.threshold, next_sequence);

        info!(
            "Ingest service: {} chunks per file, {}Hz {}-bit {}ch, {:?} writes, next file {}",
            accumulator.threshold(),
            options.format.sample_rate,
            options.format.bits_per_sample,
            options.format.channels,
            options.write_mode,
            artifact_file_name(next_sequence)
        );

        let counters = Arc::new(IngestCounters::default());
        let persister = Arc::new(Persister::new(
            sink,
            options.on_write_failure,
            options.max_retained,
            Arc::clone(&counters),
        ));

        let background = match options.write_mode {
            WriteMode::Inline => None,
            WriteMode::Background => Some(BackgroundWriter::spawn(
                Arc::clone(&persister),
                WRITER_QUEUE_CAPACITY,
            )),
        };

        Ok(Self {
            accumulator: Mutex::new(accumulator),
            format: options.format,
            write_mode: options.write_mode,
            persister,
            background: Mutex::new(background),
            counters,
            started_at: Utc::now(),
        })
    }

    /// Accept one chunk; writes a file when it completes a batch
    pub async fn ingest(&self, chunk: impl Into<Bytes>) -> Result<IngestOutcome> {
        let chunk = chunk.into();
        self.counters.record_chunk(chunk.len());

        // Append, threshold check and reset happen under one lock
        let result = {
            let mut accumulator = self.accumulator.lock().await;
            accumulator.push(chunk)
        };

        let flush = match result {
            FlushResult::Accepted { pending } => {
                debug!("Chunk buffered ({} pending)", pending);
                return Ok(IngestOutcome::Accepted { pending });
            }
            FlushResult::Flushed(flush) => flush,
        };

        self.counters.record_flush();
        info!(
            "Batch {} complete: {} chunks, {} bytes",
            flush.sequence,
            flush.chunk_count,
            flush.data.len()
        );

        let sequence = flush.sequence;
        let artifact = EncodedArtifact::encode(flush, &self.format)?;

        match self.write_mode {
            WriteMode::Inline => {
                let path = self.persister.persist(artifact).await?;
                Ok(IngestOutcome::Persisted { sequence, path })
            }
            WriteMode::Background => {
                let tx = self.background.lock().await.as_ref().map(BackgroundWriter::sender);

                let Some(tx) = tx else {
                    let err = IngestError::WriterClosed;
                    self.counters.record_failure();
                    self.persister.on_failure(artifact, &err).await;
                    return Err(err);
                };

                if let Err(mpsc_err) = tx.send(artifact).await {
                    let err = IngestError::WriterClosed;
                    self.counters.record_failure();
                    self.persister.on_failure(mpsc_err.0, &err).await;
                    return Err(err);
                }

                Ok(IngestOutcome::Queued { sequence })
            }
        }
    }

    /// Snapshot of counters and accumulation state
    pub async fn status(&self) -> IngestStatus {
        let (threshold, pending_chunks, pending_bytes, next_sequence) = {
            let accumulator = self.accumulator.lock().await;
            (
                accumulator.threshold(),
                accumulator.pending_count(),
                accumulator.pending_bytes(),
                accumulator.next_sequence(),
            )
        };

        let uptime = Utc::now().signed_duration_since(self.started_at);

        IngestStatus {
            threshold,
            pending_chunks,
            pending_bytes,
            next_sequence,
            chunks_received: self.counters.chunks_received.load(Ordering::SeqCst),
            bytes_received: self.counters.bytes_received.load(Ordering::SeqCst),
            batches_flushed: self.counters.batches_flushed.load(Ordering::SeqCst),
            files_written: self.counters.files_written.load(Ordering::SeqCst),
            write_failures: self.counters.write_failures.load(Ordering::SeqCst),
            retained_artifacts: self.persister.retained_count().await,
            write_mode: self.write_mode,
            started_at: self.started_at,
            uptime_secs: uptime.num_milliseconds() as f64 / 1000.0,
        }
    }

    /// Retry retained artifacts in order until one fails; returns how many remain
    pub async fn retry_retained(&self) -> usize {
        self.persister.retry_retained().await;
        self.persister.retained_count().await
    }

    /// Drain the background writer and make a last attempt at retained artifacts
    ///
    /// A partially filled batch is not written.
    pub async fn shutdown(&self) {
        let background = self.background.lock().await.take();
        if let Some(writer) = background {
            info!("Waiting for background writer to drain");
            writer.shutdown().await;
        }

        let remaining = self.retry_retained().await;
        if remaining > 0 {
            warn!("{} retained artifacts could not be written", remaining);
        }

        let accumulator = self.accumulator.lock().await;
        if accumulator.pending_count() > 0 {
            warn!(
                "Discarding partial batch: {} chunks ({} bytes)",
                accumulator.pending_count(),
                accumulator.pending_bytes()
            );
        }
    }
}
