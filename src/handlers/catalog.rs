use super::practice::DEFAULT_EXPECTED_PHRASE;
use crate::languages::Language;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Languages offered for practice and the quiz, with their voices.
pub async fn list_languages(state: web::Data<AppState>) -> HttpResponse {
    let counts = state.bank.counts_by_locale();

    let languages: Vec<_> = Language::ALL
        .iter()
        .map(|language| {
            json!({
                "name": language.name(),
                "code": language.short_code(),
                "locale": language.locale(),
                "voice": language.voice(),
                "quiz": language.in_quiz(),
                "quiz_questions": counts.get(language.locale()).copied().unwrap_or(0)
            })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "languages": languages,
        "default_expected_phrase": DEFAULT_EXPECTED_PHRASE
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stub::StubSpeech;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn catalogue_lists_every_language() {
        let state = web::Data::new(AppState::for_tests(&StubSpeech::failing()));
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/languages", web::get().to(list_languages)),
        )
        .await;

        let req = test::TestRequest::get().uri("/languages").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let languages = body["languages"].as_array().unwrap();

        assert_eq!(languages.len(), 7);
        let french = languages.iter().find(|l| l["code"] == "fr").unwrap();
        assert_eq!(french["voice"], "fr-FR-DeniseNeural");
        assert_eq!(french["quiz"], true);
        assert_eq!(french["quiz_questions"], 2);

        let telugu = languages.iter().find(|l| l["code"] == "te").unwrap();
        assert_eq!(telugu["quiz"], false);
    }
}
