//! # Audio Processing and Validation
//!
//! Turns whatever the browser recorder uploaded into canonical 16 kHz, mono,
//! 16-bit PCM WAV, which is the only format the speech service is sent.
//!
//! ## Accepted uploads:
//! - **RIFF/WAV**: decoded with `hound`; the header must already describe
//!   16 kHz mono 16-bit integer PCM (no resampling is done here)
//! - **Raw PCM**: headerless little-endian 16-bit samples, read with `byteorder`
//!
//! ## Rejected uploads:
//! Empty bodies, odd byte counts, bodies above the configured size limit and
//! WAV files in any other format.

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Peak amplitude below which a recording is treated as silence.
const SILENCE_PEAK: i16 = 100;

/// Why an upload could not be turned into canonical audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio data is empty")]
    Empty,

    #[error("audio data length must be even for 16-bit samples (got {0} bytes)")]
    OddLength(usize),

    #[error("audio upload is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("{what} mismatch: expected {expected}, got {actual}")]
    FormatMismatch {
        what: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("only integer PCM WAV is supported")]
    FloatSamples,

    #[error("invalid WAV data: {0}")]
    Wav(#[from] hound::Error),
}

/// PCM format description (what the client recorded, or what we require).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl AudioFormat {
    /// 16 kHz, mono, 16-bit: the format every speech call uses.
    pub const SPEECH: AudioFormat = AudioFormat {
        sample_rate: 16_000,
        channels: 1,
        bit_depth: 16,
    };

    pub fn new(sample_rate: u32, channels: u16, bit_depth: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bit_depth,
        }
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bit_depth,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat::SPEECH
    }
}

/// A decoded, validated recording.
#[derive(Debug, Clone)]
pub struct Recording {
    pub samples: Vec<i16>,
    pub format: AudioFormat,
}

impl Recording {
    /// Length of the recording in seconds.
    pub fn duration_seconds(&self) -> f64 {
        let frames = self.samples.len() as f64 / self.format.channels.max(1) as f64;
        frames / self.format.sample_rate as f64
    }

    /// Largest absolute sample value.
    pub fn peak_amplitude(&self) -> i16 {
        self.samples
            .iter()
            .map(|sample| sample.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    /// Heuristic: nothing in the recording rises above background noise.
    pub fn is_probably_silent(&self) -> bool {
        self.peak_amplitude() < SILENCE_PEAK
    }
}

/// Validates uploads and produces canonical WAV bytes.
#[derive(Debug, Clone)]
pub struct AudioProcessor {
    format: AudioFormat,
    max_upload_bytes: usize,
}

impl AudioProcessor {
    pub fn new(format: AudioFormat, max_upload_bytes: usize) -> Self {
        Self {
            format,
            max_upload_bytes,
        }
    }

    /// Decode an upload (WAV or raw PCM) into samples in the required format.
    pub fn decode_upload(&self, data: &[u8]) -> Result<Recording, AudioError> {
        if data.is_empty() {
            return Err(AudioError::Empty);
        }
        if data.len() > self.max_upload_bytes {
            return Err(AudioError::TooLarge {
                size: data.len(),
                max: self.max_upload_bytes,
            });
        }

        if data.starts_with(b"RIFF") {
            self.decode_wav(data)
        } else {
            let samples = pcm_from_le_bytes(data)?;
            Ok(Recording {
                samples,
                format: self.format,
            })
        }
    }

    fn decode_wav(&self, data: &[u8]) -> Result<Recording, AudioError> {
        let reader = hound::WavReader::new(Cursor::new(data))?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int {
            return Err(AudioError::FloatSamples);
        }
        self.check("sample rate", self.format.sample_rate, spec.sample_rate)?;
        self.check("channel count", self.format.channels.into(), spec.channels.into())?;
        self.check("bit depth", self.format.bit_depth.into(), spec.bits_per_sample.into())?;

        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()?;
        if samples.is_empty() {
            return Err(AudioError::Empty);
        }

        Ok(Recording {
            samples,
            format: self.format,
        })
    }

    fn check(&self, what: &'static str, expected: u32, actual: u32) -> Result<(), AudioError> {
        if expected == actual {
            Ok(())
        } else {
            Err(AudioError::FormatMismatch {
                what,
                expected,
                actual,
            })
        }
    }

    /// Encode samples as a WAV file in the configured format.
    pub fn encode_wav(&self, samples: &[i16]) -> Result<Vec<u8>, AudioError> {
        encode_wav(samples, self.format)
    }

    /// Validate an upload and return it as canonical WAV bytes.
    pub fn normalize(&self, data: &[u8]) -> Result<(Recording, Vec<u8>), AudioError> {
        let recording = self.decode_upload(data)?;
        let wav = self.encode_wav(&recording.samples)?;
        Ok((recording, wav))
    }
}

/// Read headerless little-endian 16-bit PCM.
pub fn pcm_from_le_bytes(data: &[u8]) -> Result<Vec<i16>, AudioError> {
    if data.is_empty() {
        return Err(AudioError::Empty);
    }
    if data.len() % 2 != 0 {
        return Err(AudioError::OddLength(data.len()));
    }

    let mut cursor = Cursor::new(data);
    let mut samples = Vec::with_capacity(data.len() / 2);
    while let Ok(sample) = cursor.read_i16::<LittleEndian>() {
        samples.push(sample);
    }
    Ok(samples)
}

/// Wrap 16-bit samples in a RIFF/WAV container.
pub fn encode_wav(samples: &[i16], format: AudioFormat) -> Result<Vec<u8>, AudioError> {
    let mut bytes = Vec::with_capacity(44 + samples.len() * 2);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), format.wav_spec())?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(bytes)
}
