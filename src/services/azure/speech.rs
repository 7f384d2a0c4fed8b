use super::{credentials, SUBSCRIPTION_KEY_HEADER};
use crate::config::SpeechConfig;
use crate::services::{PronunciationAssessor, PronunciationReport, ServiceError, SpeechTranscriber};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const WAV_CONTENT_TYPE: &str = "audio/wav; codecs=audio/pcm; samplerate=16000";
const ASSESSMENT_HEADER: &str = "Pronunciation-Assessment";

/// Recognition and pronunciation assessment for short recordings.
#[derive(Debug, Clone)]
pub struct AzureSpeechClient {
    http: reqwest::Client,
    config: SpeechConfig,
}

/// Settings sent in the `Pronunciation-Assessment` header.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AssessmentParams<'a> {
    reference_text: &'a str,
    grading_system: &'static str,
    granularity: &'static str,
    enable_miscue: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
    recognition_status: String,
    #[serde(default)]
    display_text: Option<String>,
    #[serde(default, rename = "NBest")]
    n_best: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Scores {
    accuracy_score: Option<f64>,
    fluency_score: Option<f64>,
    completeness_score: Option<f64>,
    pron_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Candidate {
    #[serde(default)]
    display: String,
    #[serde(flatten)]
    flat: Scores,
    #[serde(default)]
    pronunciation_assessment: Option<Scores>,
}

impl AzureSpeechClient {
    pub fn new(http: reqwest::Client, config: SpeechConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(region: &str) -> String {
        format!(
            "https://{region}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1"
        )
    }

    async fn recognize(
        &self,
        wav: &[u8],
        locale: &str,
        assessment: Option<String>,
    ) -> Result<RecognitionResponse, ServiceError> {
        let (key, region) = credentials(
            "speech",
            self.config.key.as_deref(),
            self.config.region.as_deref(),
        )?;

        let mut request = self
            .http
            .post(Self::endpoint(region))
            .query(&[("language", locale), ("format", "detailed")])
            .header(SUBSCRIPTION_KEY_HEADER, key)
            .header(reqwest::header::CONTENT_TYPE, WAV_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, "application/json")
            .body(wav.to_vec());
        if let Some(params) = assessment {
            request = request.header(ASSESSMENT_HEADER, params);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

fn assessment_header(reference_text: &str) -> Result<String, ServiceError> {
    let params = AssessmentParams {
        reference_text,
        grading_system: "HundredMark",
        granularity: "Word",
        enable_miscue: true,
    };
    let json = serde_json::to_vec(&params)
        .map_err(|e| ServiceError::AssessmentFailed(e.to_string()))?;
    Ok(STANDARD.encode(json))
}

fn transcript_from(response: RecognitionResponse) -> Result<String, ServiceError> {
    if response.recognition_status != "Success" {
        return Err(ServiceError::RecognitionFailed(response.recognition_status));
    }

    let text = response
        .display_text
        .filter(|text| !text.trim().is_empty())
        .or_else(|| response.n_best.into_iter().next().map(|best| best.display))
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ServiceError::RecognitionFailed("no speech in recording".into()));
    }
    Ok(text)
}

fn report_from(response: RecognitionResponse) -> Result<PronunciationReport, ServiceError> {
    if response.recognition_status != "Success" {
        return Err(ServiceError::AssessmentFailed(response.recognition_status));
    }

    let best = response
        .n_best
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::AssessmentFailed("no recognition candidates".into()))?;

    let nested = best.pronunciation_assessment.unwrap_or_default();
    let pick = |nested: Option<f64>, flat: Option<f64>| nested.or(flat);
    let accuracy = pick(nested.accuracy_score, best.flat.accuracy_score);
    let fluency = pick(nested.fluency_score, best.flat.fluency_score);
    let completeness = pick(nested.completeness_score, best.flat.completeness_score);
    let overall = pick(nested.pron_score, best.flat.pron_score);

    match (accuracy, fluency, completeness) {
        (Some(accuracy), Some(fluency), Some(completeness)) => {
            let text = response
                .display_text
                .filter(|text| !text.is_empty())
                .unwrap_or(best.display);
            Ok(PronunciationReport::new(accuracy, fluency, completeness, text).with_overall(overall))
        }
        _ => Err(ServiceError::AssessmentFailed(
            "response carried no pronunciation scores".into(),
        )),
    }
}

#[async_trait]
impl SpeechTranscriber for AzureSpeechClient {
    async fn transcribe(&self, wav: &[u8], locale: &str) -> Result<String, ServiceError> {
        debug!(locale, bytes = wav.len(), "Requesting transcription");
        let response = self.recognize(wav, locale, None).await?;
        transcript_from(response).inspect_err(|e| warn!(locale, error = %e, "Transcription failed"))
    }
}

#[async_trait]
impl PronunciationAssessor for AzureSpeechClient {
    async fn assess(
        &self,
        wav: &[u8],
        reference_text: &str,
        locale: &str,
    ) -> Result<PronunciationReport, ServiceError> {
        debug!(locale, bytes = wav.len(), "Requesting pronunciation assessment");
        let header = assessment_header(reference_text)?;
        let response = self.recognize(wav, locale, Some(header)).await?;
        report_from(response).inspect_err(|e| warn!(locale, error = %e, "Assessment failed"))
    }
}
