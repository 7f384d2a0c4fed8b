//! # External Speech Services
//!
//! The backend never recognizes or synthesizes speech itself. Every call goes
//! to a cloud service behind one of four small traits, so handlers and the
//! attempt flow can be tested against in-process fakes.
//!
//! ## Key Components:
//! - **SpeechTranscriber**: recorded WAV to text
//! - **PronunciationAssessor**: recorded WAV plus reference text to scores
//! - **TextToSpeech**: text plus voice name to WAV
//! - **Translator**: text to another language
//! - **SpeechServices**: the bundle of trait objects stored in `AppState`

pub mod azure;
pub mod error;

#[cfg(test)]
pub mod stub;

pub use error::ServiceError;

use crate::config::AppConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Pronunciation metrics for one recording, each on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PronunciationReport {
    pub accuracy: f64,
    pub fluency: f64,
    pub completeness: f64,
    /// Overall score, when the service reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<f64>,
    /// What the assessor heard.
    pub text: String,
}

impl PronunciationReport {
    pub fn new(accuracy: f64, fluency: f64, completeness: f64, text: impl Into<String>) -> Self {
        Self {
            accuracy: clamp_metric(accuracy),
            fluency: clamp_metric(fluency),
            completeness: clamp_metric(completeness),
            pronunciation: None,
            text: text.into(),
        }
    }

    pub fn with_overall(mut self, overall: Option<f64>) -> Self {
        self.pronunciation = overall.map(clamp_metric);
        self
    }
}

fn clamp_metric(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Transcribe a 16 kHz mono WAV recording spoken in `locale` (e.g. `fr-FR`).
    async fn transcribe(&self, wav: &[u8], locale: &str) -> Result<String, ServiceError>;
}

#[async_trait]
pub trait PronunciationAssessor: Send + Sync {
    async fn assess(
        &self,
        wav: &[u8],
        reference_text: &str,
        locale: &str,
    ) -> Result<PronunciationReport, ServiceError>;
}

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Speak `text` with the named neural voice; returns a WAV file.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, ServiceError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `to`; the source language is detected when `from` is `None`.
    async fn translate(&self, text: &str, to: &str, from: Option<&str>)
        -> Result<String, ServiceError>;
}

/// The external collaborators shared by all handlers.
#[derive(Clone)]
pub struct SpeechServices {
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub assessor: Arc<dyn PronunciationAssessor>,
    pub tts: Arc<dyn TextToSpeech>,
    pub translator: Arc<dyn Translator>,
}

impl SpeechServices {
    /// Azure-backed services sharing one HTTP connection pool.
    ///
    /// Missing credentials are not an error here; each call reports
    /// `MissingCredentials` instead, so the server still starts and the
    /// scoring endpoints keep working.
    pub fn azure(config: &AppConfig) -> Result<Self, ServiceError> {
        let http = azure::http_client()?;
        let speech = Arc::new(azure::AzureSpeechClient::new(http.clone(), config.speech.clone()));

        Ok(Self {
            transcriber: speech.clone(),
            assessor: speech,
            tts: Arc::new(azure::AzureTtsClient::new(http.clone(), config.speech.clone())),
            translator: Arc::new(azure::AzureTranslatorClient::new(
                http,
                config.translator.clone(),
            )),
        })
    }
}

impl std::fmt::Debug for SpeechServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechServices").finish_non_exhaustive()
    }
}
