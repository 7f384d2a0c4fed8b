//! In-process fakes for the external services.

use super::*;
use crate::audio::processor::encode_wav;
use crate::audio::AudioFormat;
use std::sync::Mutex;

/// Configurable fake implementing all four service traits.
///
/// `None` fields make the matching call fail the way the real service does.
#[derive(Debug, Clone, Default)]
pub struct StubSpeech {
    pub transcript: Option<String>,
    pub report: Option<PronunciationReport>,
    pub audio: Option<Vec<u8>>,
    pub translates: bool,
    /// Every locale passed to `transcribe` or `assess`.
    pub locales: Arc<Mutex<Vec<String>>>,
}

impl StubSpeech {
    /// Services that hear `transcript` and answer everything else successfully.
    pub fn hearing(transcript: &str) -> Self {
        Self {
            transcript: Some(transcript.to_string()),
            report: Some(PronunciationReport::new(90.0, 85.0, 100.0, transcript).with_overall(Some(89.0))),
            audio: Some(encode_wav(&[0, 1, 2, 3], AudioFormat::SPEECH).unwrap_or_default()),
            translates: true,
            locales: Arc::default(),
        }
    }

    /// Services where every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn seen_locales(&self) -> Vec<String> {
        self.locales.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn services(&self) -> SpeechServices {
        let stub = Arc::new(self.clone());
        SpeechServices {
            transcriber: stub.clone(),
            assessor: stub.clone(),
            tts: stub.clone(),
            translator: stub,
        }
    }

    fn note(&self, locale: &str) {
        if let Ok(mut locales) = self.locales.lock() {
            locales.push(locale.to_string());
        }
    }
}

#[async_trait]
impl SpeechTranscriber for StubSpeech {
    async fn transcribe(&self, _wav: &[u8], locale: &str) -> Result<String, ServiceError> {
        self.note(locale);
        self.transcript
            .clone()
            .ok_or_else(|| ServiceError::RecognitionFailed("NoMatch".into()))
    }
}

#[async_trait]
impl PronunciationAssessor for StubSpeech {
    async fn assess(
        &self,
        _wav: &[u8],
        _reference_text: &str,
        locale: &str,
    ) -> Result<PronunciationReport, ServiceError> {
        self.note(locale);
        self.report
            .clone()
            .ok_or_else(|| ServiceError::AssessmentFailed("NoMatch".into()))
    }
}

#[async_trait]
impl TextToSpeech for StubSpeech {
    async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>, ServiceError> {
        self.audio.clone().ok_or_else(|| ServiceError::SynthesisCanceled {
            reason: "Error".into(),
            detail: "stub synthesizer is offline".into(),
        })
    }
}

#[async_trait]
impl Translator for StubSpeech {
    async fn translate(
        &self,
        text: &str,
        to: &str,
        _from: Option<&str>,
    ) -> Result<String, ServiceError> {
        if self.translates {
            Ok(format!("[{to}] {text}"))
        } else {
            Err(ServiceError::TranslationServiceError {
                status: 401,
                body: "access denied".into(),
            })
        }
    }
}
