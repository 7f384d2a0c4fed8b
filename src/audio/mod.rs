//! # Audio Handling
//!
//! Everything the backend does with recorded or synthesized audio before it
//! goes to (or after it comes back from) the speech service.
//!
//! ## Key Components:
//! - **Audio Processor**: Upload validation, WAV/PCM decoding and WAV encoding
//! - **Scratch Audio**: Temporary WAV files scoped to a single attempt
//!
//! ## Audio Format Requirements:
//! - **Sample Rate**: 16kHz (16,000 Hz)
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono (1 channel)
//! - **Encoding**: Little-endian signed integers, RIFF/WAV container

pub mod processor;    // Upload validation and WAV encoding
pub mod scratch;      // Scoped temporary audio files

pub use processor::{AudioError, AudioFormat, AudioProcessor};
pub use scratch::ScratchAudio;
