//! Quiz mode endpoints. Each quiz is a server-side [`QuizSession`] addressed
//! by the id returned from `POST /quiz`.
//!
//! [`QuizSession`]: crate::quiz::QuizSession

use super::{evaluate_staged, speak_prompt, stage_upload};
use crate::error::{AppError, AppResult};
use crate::languages::{ChallengeLevel, Language};
use crate::quiz::{QuizError, QuizSnapshot};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub lang: String,
    #[serde(default)]
    pub challenge: ChallengeLevel,
}

fn quiz_view(id: Uuid, challenge: ChallengeLevel, snapshot: QuizSnapshot) -> serde_json::Value {
    let summary = snapshot
        .average_score
        .map(|average| format!("Quiz over! Your average score: {average:.2}"));

    json!({
        "session_id": id,
        "challenge": challenge,
        "quiz": snapshot,
        "summary": summary
    })
}

/// Start a new quiz in `lang`; the session is returned already in round 1.
pub async fn start_quiz(
    state: web::Data<AppState>,
    body: web::Json<StartQuizRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let language = Language::from_tag(&request.lang)
        .filter(Language::in_quiz)
        .ok_or_else(|| {
            AppError::InvalidInput(format!("`{}` is not available in quiz mode", request.lang))
        })?;

    let questions = state.bank.questions_for(language.locale());
    let (id, snapshot) =
        state
            .quizzes
            .create(language, request.challenge, questions, &mut rand::rng())?;
    info!(session_id = %id, language = %language, rounds = snapshot.total_rounds, "Quiz started");

    Ok(HttpResponse::Created().json(quiz_view(id, request.challenge, snapshot)))
}

pub async fn get_quiz(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let entry = state
        .quizzes
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("unknown quiz session {id}")))?;

    let mut view = quiz_view(id, entry.challenge, entry.session.snapshot());
    view["started_at"] = json!(entry.created_at.to_rfc3339());
    Ok(HttpResponse::Ok().json(view))
}

/// Answer the current round with a recording. Retries replace the round's score.
///
/// The upload is validated before the session is touched, so a rejected
/// retry leaves the round's earlier score in place.
pub async fn quiz_attempt(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let upload = stage_upload(&state, &body)?;

    let (round, expected, locale) = state.quizzes.with_session(id, |entry| {
        let round = entry.session.await_answer()?;
        let question = entry.session.current_question().ok_or(QuizError::Finished)?;
        Ok::<_, QuizError>((
            round,
            question.expected_answer.clone(),
            entry.session.language().locale(),
        ))
    })??;

    // No lock is held while the speech service works.
    let outcome = match evaluate_staged(&state, upload, &expected, locale).await {
        Ok(outcome) => outcome,
        Err(err) => {
            // An ended session has nothing to restore; the evaluation error wins.
            let _ = state
                .quizzes
                .with_session(id, |entry| entry.session.abandon_answer(round));
            return Err(err);
        }
    };

    let (challenge, snapshot) = state.quizzes.with_session(id, |entry| {
        entry.session.record_score(round, outcome.score)?;
        Ok::<_, QuizError>((entry.challenge, entry.session.snapshot()))
    })??;

    let mut view = quiz_view(id, challenge, snapshot);
    view["round"] = json!(round);
    view["attempt"] = json!(outcome);
    Ok(HttpResponse::Ok().json(view))
}

/// "Hear the answer" for the current round. Normal challenge only.
pub async fn answer_audio(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let entry = state
        .quizzes
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("unknown quiz session {id}")))?;

    if !entry.challenge.allows_target_audio() {
        return Err(AppError::InvalidInput(
            "the answer cannot be played in hard mode".into(),
        ));
    }
    let question = entry
        .session
        .current_question()
        .ok_or_else(|| AppError::Conflict("the quiz has no active round".into()))?;

    let voice = entry.session.language().voice();
    let prompt = speak_prompt(&state, question.expected_answer.clone(), voice).await;
    Ok(HttpResponse::Ok().json(prompt))
}

/// "Next": commit the round's score (zero if none was recorded) and move on.
pub async fn next_round(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let (committed, challenge, snapshot) = state.quizzes.with_session(id, |entry| {
        let committed = entry.session.advance()?;
        Ok::<_, QuizError>((committed, entry.challenge, entry.session.snapshot()))
    })??;

    if snapshot.is_complete {
        info!(session_id = %id, average = ?snapshot.average_score, "Quiz finished");
    }

    let mut view = quiz_view(id, challenge, snapshot);
    view["committed_score"] = json!(committed);
    Ok(HttpResponse::Ok().json(view))
}

/// "Play again": reshuffle the same questions and start from round 1.
pub async fn reset_quiz(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let (challenge, snapshot) = state.quizzes.with_session(id, |entry| {
        entry.session.reset(&mut rand::rng());
        entry.session.start()?;
        Ok::<_, QuizError>((entry.challenge, entry.session.snapshot()))
    })??;

    Ok(HttpResponse::Ok().json(quiz_view(id, challenge, snapshot)))
}

pub async fn end_quiz(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let entry = state
        .quizzes
        .remove(id)
        .ok_or_else(|| AppError::NotFound(format!("unknown quiz session {id}")))?;

    let minutes = (Utc::now() - entry.created_at).num_minutes();
    info!(
        session_id = %id,
        minutes,
        finished = entry.session.is_complete(),
        "Quiz ended"
    );
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::processor::encode_wav;
    use crate::audio::AudioFormat;
    use crate::services::stub::StubSpeech;
    use actix_web::{test, App};

    macro_rules! quiz_app {
        ($stub:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::for_tests($stub)))
                    .route("/quiz", web::post().to(start_quiz))
                    .route("/quiz/{id}", web::get().to(get_quiz))
                    .route("/quiz/{id}", web::delete().to(end_quiz))
                    .route("/quiz/{id}/attempt", web::post().to(quiz_attempt))
                    .route("/quiz/{id}/answer-audio", web::get().to(answer_audio))
                    .route("/quiz/{id}/next", web::post().to(next_round))
                    .route("/quiz/{id}/reset", web::post().to(reset_quiz)),
            )
            .await
        };
    }

    fn speech_wav() -> Vec<u8> {
        let samples: Vec<i16> = (0..1600).map(|i| ((i % 40) as i16 - 20) * 400).collect();
        encode_wav(&samples, AudioFormat::SPEECH).unwrap()
    }

    #[actix_web::test]
    async fn two_rounds_without_answers_finish_with_zero() {
        let app = quiz_app!(&StubSpeech::failing());
        let req = test::TestRequest::post()
            .uri("/quiz")
            .set_json(json!({"lang": "fr"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 201);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(body["quiz"]["phase"]["state"], "in_round");
        assert_eq!(body["quiz"]["total_rounds"], 2);

        for _ in 0..2 {
            let req = test::TestRequest::post().uri(&format!("/quiz/{id}/next")).to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["committed_score"], 0.0);
        }

        let req = test::TestRequest::get().uri(&format!("/quiz/{id}")).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["started_at"].is_string());
        assert_eq!(body["quiz"]["is_complete"], true);
        assert_eq!(body["quiz"]["average_score"], 0.0);
        assert_eq!(body["summary"], "Quiz over! Your average score: 0.00");

        let req = test::TestRequest::post().uri(&format!("/quiz/{id}/next")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 409);
    }

    #[actix_web::test]
    async fn answered_round_counts_toward_the_average() {
        let stub = StubSpeech::hearing("merci");
        let app = quiz_app!(&stub);
        let req = test::TestRequest::post()
            .uri("/quiz")
            .set_json(json!({"lang": "French"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/quiz/{id}/attempt"))
            .set_payload(speech_wav())
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["round"], 1);
        assert_eq!(body["quiz"]["phase"]["state"], "round_scored");
        assert_eq!(stub.seen_locales(), vec!["fr-FR", "fr-FR"]);
        let first_score = body["attempt"]["score"].as_f64().unwrap();

        let req = test::TestRequest::post().uri(&format!("/quiz/{id}/next")).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["committed_score"].as_f64().unwrap(), first_score);
        assert_eq!(body["quiz"]["cumulative_score"].as_f64().unwrap(), first_score);
    }

    #[actix_web::test]
    async fn rejected_retry_keeps_the_recorded_score() {
        let app = quiz_app!(&StubSpeech::hearing("merci beaucoup"));
        let req = test::TestRequest::post()
            .uri("/quiz")
            .set_json(json!({"lang": "fr"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/quiz/{id}/attempt"))
            .set_payload(speech_wav())
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let recorded = body["attempt"]["score"].as_f64().unwrap();
        assert!(recorded > 0.0);

        let req = test::TestRequest::post()
            .uri(&format!("/quiz/{id}/attempt"))
            .set_payload(vec![1u8, 2, 3])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);

        let req = test::TestRequest::get().uri(&format!("/quiz/{id}")).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["quiz"]["phase"]["state"], "round_scored");

        let req = test::TestRequest::post().uri(&format!("/quiz/{id}/next")).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["committed_score"].as_f64().unwrap(), recorded);
        assert_eq!(body["quiz"]["cumulative_score"].as_f64().unwrap(), recorded);
    }

    #[actix_web::test]
    async fn language_without_questions_is_reported() {
        let app = quiz_app!(&StubSpeech::failing());
        let req = test::TestRequest::post()
            .uri("/quiz")
            .set_json(json!({"lang": "ta-IN"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 422);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["type"], "no_questions_available");

        let req = test::TestRequest::post()
            .uri("/quiz")
            .set_json(json!({"lang": "te"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn hard_mode_hides_the_answer() {
        let app = quiz_app!(&StubSpeech::hearing("prost"));
        let req = test::TestRequest::post()
            .uri("/quiz")
            .set_json(json!({"lang": "de", "challenge": "hard"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/quiz/{id}/answer-audio"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn normal_mode_speaks_the_answer() {
        let app = quiz_app!(&StubSpeech::hearing("prost"));
        let req = test::TestRequest::post()
            .uri("/quiz")
            .set_json(json!({"lang": "de"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/quiz/{id}/answer-audio"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["text"], "Prost");
        assert_eq!(body["voice"], "de-DE-KatjaNeural");
    }

    #[actix_web::test]
    async fn reset_restarts_and_delete_removes() {
        let app = quiz_app!(&StubSpeech::failing());
        let req = test::TestRequest::post()
            .uri("/quiz")
            .set_json(json!({"lang": "de"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post().uri(&format!("/quiz/{id}/next")).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["quiz"]["is_complete"], true);

        let req = test::TestRequest::post().uri(&format!("/quiz/{id}/reset")).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["quiz"]["round_number"], 1);
        assert_eq!(body["quiz"]["cumulative_score"], 0.0);
        assert_eq!(body["quiz"]["phase"]["state"], "in_round");

        let req = test::TestRequest::delete().uri(&format!("/quiz/{id}")).to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 204);

        let req = test::TestRequest::get().uri(&format!("/quiz/{id}")).to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);
    }
}
