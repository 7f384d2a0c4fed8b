//! Practice mode: the learner picks (or keeps) an English phrase, can listen
//! to it in English or in the target language, then records themselves.

use super::{evaluate_upload, required, speak_prompt};
use crate::attempt::AttemptWarning;
use crate::error::{AppError, AppResult};
use crate::languages::{ChallengeLevel, Language};
use crate::scoring;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

pub const DEFAULT_EXPECTED_PHRASE: &str = "I want to learn French";

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub utterance: Option<String>,
    pub expected: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttemptQuery {
    /// Language the learner speaks in; the configured default locale when absent.
    pub lang: Option<String>,
    pub expected: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionAudioRequest {
    pub expected: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TargetAudioRequest {
    pub expected: Option<String>,
    pub lang: String,
    #[serde(default)]
    pub challenge: ChallengeLevel,
}

/// Score an already-transcribed utterance. No external calls.
pub async fn score_phrase(body: web::Json<ScoreRequest>) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let utterance = required(request.utterance, "utterance")?;
    let expected = required(request.expected, "expected")?;

    let score = scoring::score(&utterance, &expected);
    let verdict = scoring::classify(score);

    Ok(HttpResponse::Ok().json(json!({
        "utterance": utterance,
        "expected": expected,
        "score": score,
        "verdict": verdict,
        "feedback": verdict.message()
    })))
}

/// Evaluate a recorded attempt (WAV or raw PCM16 request body).
pub async fn practice_attempt(
    state: web::Data<AppState>,
    query: web::Query<AttemptQuery>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let expected = query
        .expected
        .unwrap_or_else(|| DEFAULT_EXPECTED_PHRASE.to_string());
    let locale = match query.lang.as_deref() {
        Some(tag) => Language::from_tag_or_default(tag).locale().to_string(),
        None => state.get_config().speech.default_locale,
    };

    let outcome = evaluate_upload(&state, &body, &expected, &locale).await?;
    Ok(HttpResponse::Ok().json(json!({
        "locale": locale,
        "attempt": outcome
    })))
}

/// "Hear question": the expected phrase, spoken in English.
pub async fn question_audio(
    state: web::Data<AppState>,
    body: web::Json<QuestionAudioRequest>,
) -> AppResult<HttpResponse> {
    let expected = body
        .into_inner()
        .expected
        .unwrap_or_else(|| DEFAULT_EXPECTED_PHRASE.to_string());

    let prompt = speak_prompt(&state, expected, Language::English.voice()).await;
    Ok(HttpResponse::Ok().json(prompt))
}

/// "Hear in target language": translate the phrase, then speak the translation.
///
/// Not available in hard mode. A failed translation is reported as a warning
/// and no audio is produced.
pub async fn target_audio(
    state: web::Data<AppState>,
    body: web::Json<TargetAudioRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    if !request.challenge.allows_target_audio() {
        return Err(AppError::InvalidInput(
            "target-language audio is not available in hard mode".into(),
        ));
    }

    let language = Language::from_tag_or_default(&request.lang);
    let expected = request
        .expected
        .unwrap_or_else(|| DEFAULT_EXPECTED_PHRASE.to_string());

    let translation = state
        .services
        .translator
        .translate(&expected, language.short_code(), None)
        .await;

    match translation {
        Ok(translated) => {
            let prompt = speak_prompt(&state, translated.clone(), language.voice()).await;
            Ok(HttpResponse::Ok().json(json!({
                "language": language.name(),
                "expected": expected,
                "translation": translated,
                "prompt": prompt
            })))
        }
        Err(err) => {
            warn!(language = %language, error = %err, "Translation unavailable");
            Ok(HttpResponse::Ok().json(json!({
                "language": language.name(),
                "expected": expected,
                "translation": null,
                "prompt": null,
                "warnings": [AttemptWarning::from(&err)]
            })))
        }
    }
}
