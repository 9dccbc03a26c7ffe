use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::audio::WavFormat;
use crate::http::DEFAULT_MAX_BODY_BYTES;
use crate::ingest::{
    IngestOptions, WriteFailurePolicy, WriteMode, DEFAULT_MAX_RETAINED, DEFAULT_THRESHOLD,
};

/// Prefix for environment overrides, e.g. `PCM_INGEST_AUDIO__THRESHOLD=10`
const ENV_PREFIX: &str = "PCM_INGEST";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub output_dir: String,
    pub threshold: usize,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub write_mode: WriteMode,
    pub on_write_failure: WriteFailurePolicy,
    /// Failed batches kept for retry before further failures are dropped
    pub max_retained: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "pcm-ingest".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 18081,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        let format = WavFormat::default();
        Self {
            output_dir: "received_audio".to_string(),
            threshold: DEFAULT_THRESHOLD,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample,
            channels: format.channels,
            write_mode: WriteMode::default(),
            on_write_failure: WriteFailurePolicy::default(),
            max_retained: DEFAULT_MAX_RETAINED,
        }
    }
}

impl Config {
    /// Load from an optional config file, then `PCM_INGEST_*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.audio.threshold == 0 {
            anyhow::bail!("audio.threshold must be at least 1");
        }

        if self.audio.on_write_failure == WriteFailurePolicy::Retain
            && self.audio.max_retained == 0
        {
            anyhow::bail!("audio.max_retained must be at least 1 when on_write_failure is retain");
        }

        self.audio
            .format()
            .validate()
            .context("Invalid audio format")?;

        Ok(())
    }
}

impl AudioConfig {
    pub fn format(&self) -> WavFormat {
        WavFormat::new(self.sample_rate, self.bits_per_sample, self.channels)
    }

    /// Output directory with `~` expanded
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.output_dir).into_owned())
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            threshold: self.threshold,
            format: self.format(),
            write_mode: self.write_mode,
            on_write_failure: self.on_write_failure,
            max_retained: self.max_retained,
        }
    }
}
