use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

/// File name of the artifact with the given sequence number
pub fn artifact_file_name(sequence: u64) -> String {
    format!("output{}.wav", sequence)
}

/// Parse the sequence number back out of an artifact file name
pub fn parse_artifact_sequence(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix("output")?
        .strip_suffix(".wav")
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))?
        .parse()
        .ok()
}

/// Destination for encoded WAV artifacts
///
/// Implementations:
/// - `FileSink`: one file per artifact in an output directory
/// - Test doubles (in-memory, failing) in the integration tests
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persist `bytes` as the artifact numbered `sequence`
    ///
    /// Must fail rather than replace an artifact that already exists.
    async fn write(&self, sequence: u64, bytes: &[u8]) -> Result<PathBuf>;

    /// Sequence number to resume from, given what the sink already holds
    async fn next_sequence(&self) -> Result<u64> {
        Ok(1)
    }

    /// Sink name for logging
    fn name(&self) -> &str;
}

/// Writes `output{N}.wav` files into a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    /// Create the sink, creating the output directory if needed
    pub async fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();

        fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| IngestError::Io {
                path: output_dir.clone(),
                source,
            })?;

        info!("File sink ready: {}", output_dir.display());

        Ok(Self { output_dir })
    }

    /// Full path of the artifact with the given sequence number
    pub fn artifact_path(&self, sequence: u64) -> PathBuf {
        self.output_dir.join(artifact_file_name(sequence))
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn write(&self, sequence: u64, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.artifact_path(sequence);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(IngestError::ArtifactExists(path));
            }
            Err(source) => return Err(IngestError::Io { path, source }),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(source) = written {
            // Don't leave a half-written artifact behind to block the retry
            if let Err(e) = fs::remove_file(&path).await {
                warn!("Failed to remove partial artifact {}: {}", path.display(), e);
            }
            return Err(IngestError::Io { path, source });
        }

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        Ok(path)
    }

    /// One past the highest `output{N}.wav` already in the directory
    async fn next_sequence(&self) -> Result<u64> {
        let io_err = |source: std::io::Error| IngestError::Io {
            path: self.output_dir.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.output_dir).await.map_err(io_err)?;
        let mut highest = 0;

        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let file_name = entry.file_name();
            match file_name.to_str().and_then(parse_artifact_sequence) {
                Some(sequence) => highest = highest.max(sequence),
                None => debug!("Ignoring {:?} while scanning for artifacts", file_name),
            }
        }

        let next = highest
            .checked_add(1)
            .ok_or_else(|| IngestError::SequenceExhausted(self.artifact_path(highest)))?;

        if highest > 0 {
            info!(
                "Found existing artifacts up to {}, resuming at {}",
                artifact_file_name(highest),
                next
            );
        }

        Ok(next)
    }

    fn name(&self) -> &str {
        "file"
    }
}
