use super::{credentials, SUBSCRIPTION_KEY_HEADER};
use crate::audio::processor::{encode_wav, pcm_from_le_bytes};
use crate::audio::AudioFormat;
use crate::config::SpeechConfig;
use crate::services::{ServiceError, TextToSpeech};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Headerless PCM; the client wraps it in a WAV container itself.
const OUTPUT_FORMAT: &str = "raw-16khz-16bit-mono-pcm";

#[derive(Debug, Clone)]
pub struct AzureTtsClient {
    http: reqwest::Client,
    config: SpeechConfig,
}

impl AzureTtsClient {
    pub fn new(http: reqwest::Client, config: SpeechConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(region: &str) -> String {
        format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
    }
}

/// `fr-FR-DeniseNeural` -> `fr-FR`.
fn voice_locale(voice: &str) -> &str {
    match voice.match_indices('-').nth(1) {
        Some((end, _)) => &voice[..end],
        None => "en-US",
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn ssml(text: &str, voice: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        voice_locale(voice),
        escape_xml(voice),
        escape_xml(text)
    )
}

fn wav_from_pcm(pcm: &[u8]) -> Result<Vec<u8>, ServiceError> {
    if pcm.is_empty() {
        return Err(ServiceError::SynthesisFailed("service returned no audio".into()));
    }
    let samples = pcm_from_le_bytes(pcm).map_err(|e| ServiceError::SynthesisFailed(e.to_string()))?;
    encode_wav(&samples, AudioFormat::SPEECH).map_err(|e| ServiceError::SynthesisFailed(e.to_string()))
}

#[async_trait]
impl TextToSpeech for AzureTtsClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, ServiceError> {
        let (key, region) = credentials(
            "speech",
            self.config.key.as_deref(),
            self.config.region.as_deref(),
        )?;
        debug!(voice, chars = text.chars().count(), "Requesting speech synthesis");

        let response = self
            .http
            .post(Self::endpoint(region))
            .header(SUBSCRIPTION_KEY_HEADER, key)
            .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .body(ssml(text, voice))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let reason = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_u16().to_string());
            warn!(voice, %status, detail = %detail, "Speech synthesis canceled");
            return Err(ServiceError::SynthesisCanceled { reason, detail });
        }

        let pcm = response.bytes().await?;
        wav_from_pcm(&pcm)
    }
}
