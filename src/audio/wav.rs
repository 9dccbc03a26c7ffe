//! PCM WAV container encoding
//!
//! Every flushed batch is written as a canonical 44-byte RIFF/WAVE header
//! followed by the raw sample bytes, untouched.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};

/// Size of the canonical PCM header
pub const HEADER_LEN: usize = 44;

/// `fmt ` sub-chunk size for plain PCM
const FMT_CHUNK_SIZE: u32 = 16;

/// Audio format code for uncompressed PCM
const FORMAT_PCM: u16 = 1;

/// Sample layout of the raw payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bit depth of a single sample (8, 16, 24, 32, ...)
    pub bits_per_sample: u16,
    /// Number of interleaved channels
    pub channels: u16,
}

impl Default for WavFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz
            bits_per_sample: 16,
            channels: 1, // Mono
        }
    }
}

impl WavFormat {
    pub fn new(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample,
            channels,
        }
    }

    /// Check that every derived header field is encodable
    pub fn validate(&self) -> Result<(), EncodeError> {
        self.derived().map(|_| ())
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> Result<u32, EncodeError> {
        self.derived().map(|(byte_rate, _)| byte_rate)
    }

    /// Bytes per sample frame (all channels)
    pub fn block_align(&self) -> Result<u16, EncodeError> {
        self.derived().map(|(_, block_align)| block_align)
    }

    fn derived(&self) -> Result<(u32, u16), EncodeError> {
        if self.sample_rate == 0 {
            return Err(EncodeError::ZeroSampleRate);
        }
        if self.channels == 0 {
            return Err(EncodeError::ZeroChannels);
        }
        if self.bits_per_sample == 0 || self.bits_per_sample % 8 != 0 {
            return Err(EncodeError::InvalidBitsPerSample(self.bits_per_sample));
        }

        let bytes_per_sample = u64::from(self.bits_per_sample / 8);
        let block_align = u64::from(self.channels) * bytes_per_sample;
        let byte_rate = u64::from(self.sample_rate) * block_align;

        let block_align =
            u16::try_from(block_align).map_err(|_| EncodeError::BlockAlignOverflow(block_align))?;
        let byte_rate =
            u32::try_from(byte_rate).map_err(|_| EncodeError::ByteRateOverflow(byte_rate))?;

        Ok((byte_rate, block_align))
    }
}

/// Build the 44-byte header describing `data_len` bytes of PCM in `format`
pub fn encode_header(data_len: usize, format: &WavFormat) -> Result<[u8; HEADER_LEN], EncodeError> {
    let (byte_rate, block_align) = format.derived()?;

    let data_size = u32::try_from(data_len)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or(EncodeError::DataTooLarge(data_len as u64))?;

    let mut header = [0u8; HEADER_LEN];

    // RIFF header
    header[0..4].copy_from_slice(b"RIFF");
    LittleEndian::write_u32(&mut header[4..8], data_size + 36);
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    LittleEndian::write_u32(&mut header[16..20], FMT_CHUNK_SIZE);
    LittleEndian::write_u16(&mut header[20..22], FORMAT_PCM);
    LittleEndian::write_u16(&mut header[22..24], format.channels);
    LittleEndian::write_u32(&mut header[24..28], format.sample_rate);
    LittleEndian::write_u32(&mut header[28..32], byte_rate);
    LittleEndian::write_u16(&mut header[32..34], block_align);
    LittleEndian::write_u16(&mut header[34..36], format.bits_per_sample);

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    LittleEndian::write_u32(&mut header[40..44], data_size);

    Ok(header)
}

/// Prepend a header to `payload`, producing a complete WAV byte stream
pub fn encode_container(payload: &[u8], format: &WavFormat) -> Result<Vec<u8>, EncodeError> {
    let header = encode_header(payload.len(), format)?;

    let mut container = Vec::with_capacity(HEADER_LEN + payload.len());
    container.extend_from_slice(&header);
    container.extend_from_slice(payload);

    Ok(container)
}

/// Header fields read back from an encoded container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavHeader {
    pub data_len: u32,
    pub riff_size: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub format: WavFormat,
}

/// Parse a canonical 44-byte PCM header from the start of `bytes`
pub fn decode_header(bytes: &[u8]) -> Result<WavHeader, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated(bytes.len()));
    }

    expect_tag(bytes, 0, b"RIFF")?;
    expect_tag(bytes, 8, b"WAVE")?;
    expect_tag(bytes, 12, b"fmt ")?;
    expect_tag(bytes, 36, b"data")?;

    let audio_format = LittleEndian::read_u16(&bytes[20..22]);
    if audio_format != FORMAT_PCM {
        return Err(DecodeError::UnsupportedFormat(audio_format));
    }

    Ok(WavHeader {
        riff_size: LittleEndian::read_u32(&bytes[4..8]),
        byte_rate: LittleEndian::read_u32(&bytes[28..32]),
        block_align: LittleEndian::read_u16(&bytes[32..34]),
        data_len: LittleEndian::read_u32(&bytes[40..44]),
        format: WavFormat {
            channels: LittleEndian::read_u16(&bytes[22..24]),
            sample_rate: LittleEndian::read_u32(&bytes[24..28]),
            bits_per_sample: LittleEndian::read_u16(&bytes[34..36]),
        },
    })
}

fn expect_tag(bytes: &[u8], offset: usize, tag: &'static [u8; 4]) -> Result<(), DecodeError> {
    if &bytes[offset..offset + 4] == tag {
        Ok(())
    } else {
        Err(DecodeError::BadTag {
            offset,
            expected: String::from_utf8_lossy(tag).into_owned(),
        })
    }
}
