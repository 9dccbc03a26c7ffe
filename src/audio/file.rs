use anyhow::{Context, Result};
use hound::WavReader;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use super::wav::{decode_header, WavFormat, WavHeader, HEADER_LEN};

/// A WAV file on disk, opened for inspection
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Sample frames (samples per channel)
    pub frames: u32,
    /// Header as decoded by our own parser
    pub header: WavHeader,
}

impl AudioFile {
    /// Open with hound and cross-check the header against `decode_header`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;
        let spec = reader.spec();
        let frames = reader.duration();

        let mut raw = [0u8; HEADER_LEN];
        File::open(path)
            .and_then(|mut file| file.read_exact(&mut raw))
            .context("Failed to read WAV header")?;
        let header = decode_header(&raw).context("Not a canonical PCM WAV header")?;

        let expected = WavFormat::new(spec.sample_rate, spec.bits_per_sample, spec.channels);
        if header.format != expected {
            anyhow::bail!(
                "Header mismatch: decoded {:?}, hound read {:?}",
                header.format,
                expected
            );
        }

        let duration_seconds = frames as f64 / spec.sample_rate as f64;

        info!(
            "Audio file loaded: {:.2}s, {}Hz, {} channels, {}-bit, {} data bytes",
            duration_seconds, spec.sample_rate, spec.channels, spec.bits_per_sample, header.data_len
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            frames,
            header,
        })
    }

    /// Read every sample as i16 (8- and 16-bit files only)
    pub fn read_samples(&self) -> Result<Vec<i16>> {
        let reader = WavReader::open(&self.path).context("Failed to open WAV file")?;
        reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")
    }
}
