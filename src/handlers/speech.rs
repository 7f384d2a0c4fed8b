use super::required;
use crate::error::AppResult;
use crate::languages::Language;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: Option<String>,
    /// Target language: short code, locale or name.
    pub to: String,
    pub from: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

/// Plain translation. Service errors are returned as HTTP errors here; only
/// the practice and quiz flows degrade them to warnings.
pub async fn translate_text(
    state: web::Data<AppState>,
    body: web::Json<TranslateRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let text = required(request.text, "text")?;
    let to = Language::from_tag_or_default(&request.to);
    let from = request
        .from
        .as_deref()
        .and_then(Language::from_tag)
        .map(|language| language.short_code());

    let translation = state
        .services
        .translator
        .translate(&text, to.short_code(), from)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "text": text,
        "to": to.short_code(),
        "from": from,
        "translation": translation
    })))
}

/// Speak `text` in the voice of `lang` (English by default); responds with `audio/wav`.
pub async fn synthesize_speech(
    state: web::Data<AppState>,
    body: web::Json<SynthesizeRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let text = required(request.text, "text")?;
    let language = request
        .lang
        .as_deref()
        .map(Language::from_tag_or_default)
        .unwrap_or_default();

    let wav = state.services.tts.synthesize(&text, language.voice()).await?;
    Ok(HttpResponse::Ok().content_type("audio/wav").body(wav))
}
