//! # HTTP Handlers
//!
//! Everything under `/api/v1`. Handlers stay thin: they parse the request,
//! call into `scoring`, `quiz` or `attempt`, and shape the JSON response.
//!
//! - **config**: read and update runtime configuration
//! - **catalog**: supported languages
//! - **practice**: free practice with a learner-chosen phrase
//! - **quiz**: game mode sessions
//! - **speech**: raw translation and synthesis

pub mod catalog;
pub mod config;
pub mod practice;
pub mod quiz;
pub mod speech;

pub use catalog::*;
pub use config::*;
pub use practice::*;
pub use quiz::*;
pub use speech::*;

use crate::attempt::{evaluate_attempt, AttemptOutcome, AttemptWarning};
use crate::audio::processor::Recording;
use crate::audio::ScratchAudio;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Text field that must be present (it may still be empty).
fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value.ok_or_else(|| AppError::InvalidInput(format!("`{field}` is required")))
}

/// A validated recording, staged on disk for the length of one attempt.
struct StagedUpload {
    recording: Recording,
    scratch: ScratchAudio,
}

/// Validate an upload and stage it. Nothing external is called yet.
fn stage_upload(state: &AppState, body: &[u8]) -> AppResult<StagedUpload> {
    let config = state.get_config();
    let (recording, wav) = config.audio.processor().normalize(body)?;
    let scratch = ScratchAudio::stage(config.audio.scratch_dir.as_deref().map(Path::new), &wav)?;

    debug!(
        bytes = body.len(),
        seconds = recording.duration_seconds(),
        "Recording accepted"
    );
    Ok(StagedUpload { recording, scratch })
}

/// Evaluate a staged recording against `expected`.
///
/// The staged file is removed when this returns, whatever the outcome.
async fn evaluate_staged(
    state: &AppState,
    upload: StagedUpload,
    expected: &str,
    locale: &str,
) -> AppResult<AttemptOutcome> {
    let staged = upload.scratch.read().await?;

    let mut outcome = evaluate_attempt(&state.services, &staged, expected, locale).await;
    if upload.recording.is_probably_silent() {
        outcome.warn(
            "silent_recording",
            "The recording appears to be silent; check the microphone.",
        );
    }

    state.record_attempt(!outcome.warnings.is_empty());
    Ok(outcome)
}

async fn evaluate_upload(
    state: &AppState,
    body: &[u8],
    expected: &str,
    locale: &str,
) -> AppResult<AttemptOutcome> {
    let upload = stage_upload(state, body)?;
    evaluate_staged(state, upload, expected, locale).await
}

/// Synthesized prompt audio for the "hear it" buttons.
///
/// A failed synthesis leaves `audio_base64` empty and explains why in
/// `warnings` instead of failing the request.
#[derive(Debug, Serialize)]
pub struct SpokenPrompt {
    pub text: String,
    pub voice: &'static str,
    pub audio_base64: Option<String>,
    pub warnings: Vec<AttemptWarning>,
}

async fn speak_prompt(state: &AppState, text: String, voice: &'static str) -> SpokenPrompt {
    match state.services.tts.synthesize(&text, voice).await {
        Ok(wav) => SpokenPrompt {
            text,
            voice,
            audio_base64: Some(STANDARD.encode(wav)),
            warnings: Vec::new(),
        },
        Err(err) => {
            warn!(voice, error = %err, "Prompt audio unavailable");
            SpokenPrompt {
                text,
                voice,
                audio_base64: None,
                warnings: vec![AttemptWarning::from(&err)],
            }
        }
    }
}
