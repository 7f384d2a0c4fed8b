//! # Health and Metrics Endpoints
//!
//! - `GET /health` and `GET /api/v1/health`: liveness plus a summary of what
//!   the server can currently do (speech credentials, quiz dataset, load)
//! - `GET /api/v1/metrics`: request counters, per-route timings and attempt
//!   outcomes
//!
//! The server reports `degraded` rather than failing when credentials or the
//! quiz dataset are missing: text scoring keeps working without them.

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let config = state.get_config();
    let active_sessions = state.active_sessions();

    let speech_ready = config.speech.is_configured();
    let translator_ready = config.translator.is_configured();
    let quiz_ready = !state.bank.is_empty();
    let status = if speech_ready && translator_ready && quiz_ready {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.get_uptime_seconds(),
        "service": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "host": config.server.host,
            "port": config.server.port
        },
        "metrics": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": metrics.error_rate(),
            "active_sessions": active_sessions
        },
        "memory": get_memory_info(),
        "services": {
            "speech": {
                "configured": speech_ready,
                "region": config.speech.region,
                "default_locale": config.speech.default_locale
            },
            "translator": {
                "configured": translator_ready,
                "endpoint": config.translator.endpoint
            }
        },
        "quiz": {
            "dataset_path": config.quiz.dataset_path,
            "total_questions": state.bank.len(),
            "questions_by_locale": state.bank.counts_by_locale()
        },
        "system": get_system_status(state.quizzes.max_sessions(), active_sessions)
    }))
}

pub async fn detailed_metrics(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let uptime_seconds = state.get_uptime_seconds();
    let config = state.get_config();

    let mut endpoints: Vec<_> = metrics.endpoint_metrics.iter().collect();
    endpoints.sort_by(|a, b| a.0.cmp(b.0));
    let endpoint_stats: Vec<_> = endpoints
        .into_iter()
        .map(|(endpoint, metric)| {
            json!({
                "endpoint": endpoint,
                "request_count": metric.request_count,
                "error_count": metric.error_count,
                "error_rate": metric.error_rate(),
                "average_duration_ms": metric.average_duration_ms(),
                "total_duration_ms": metric.total_duration_ms
            })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "overall": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": metrics.error_rate(),
            "active_sessions": state.active_sessions(),
            "requests_per_second": if uptime_seconds > 0 {
                metrics.request_count as f64 / uptime_seconds as f64
            } else {
                0.0
            }
        },
        "attempts": {
            "evaluated": metrics.attempts_evaluated,
            "degraded": metrics.degraded_attempts
        },
        "endpoints": endpoint_stats,
        "memory": get_memory_info(),
        "performance": {
            "max_concurrent_sessions": config.performance.max_concurrent_sessions,
            "session_idle_minutes": config.performance.session_idle_minutes,
            "max_upload_bytes": config.audio.max_upload_bytes
        }
    }))
}

/// Resident and virtual memory of this process (Linux only).
fn get_memory_info() -> serde_json::Value {
    #[cfg(target_os = "linux")]
    {
        let path = format!("/proc/{}/status", std::process::id());
        if let Ok(status) = std::fs::read_to_string(path) {
            let field = |name: &str| {
                status
                    .lines()
                    .find(|line| line.starts_with(name))
                    .and_then(|line| line.split_whitespace().nth(1))
                    .and_then(|kb| kb.parse::<u64>().ok())
                    .map(|kb| kb * 1024)
                    .unwrap_or(0)
            };
            return json!({
                "resident_memory_bytes": field("VmRSS:"),
                "virtual_memory_bytes": field("VmSize:"),
                "available": true
            });
        }
    }

    json!({
        "resident_memory_bytes": 0,
        "virtual_memory_bytes": 0,
        "available": false
    })
}

fn get_system_status(max_sessions: usize, active_sessions: usize) -> serde_json::Value {
    let session_usage = if max_sessions > 0 {
        active_sessions as f64 / max_sessions as f64
    } else {
        0.0
    };

    let status = if session_usage > 0.9 {
        "high_load"
    } else if session_usage > 0.7 {
        "moderate_load"
    } else {
        "normal"
    };

    json!({
        "status": status,
        "session_usage_percent": (session_usage * 100.0).round(),
        "max_sessions": max_sessions,
        "current_sessions": active_sessions,
        "load_warnings": if session_usage > 0.8 {
            vec!["Quiz session registry nearly full; idle sessions will be evicted first"]
        } else {
            vec![]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stub::StubSpeech;
    use actix_web::App;

    #[actix_web::test]
    async fn health_reports_missing_credentials_as_degraded() {
        let state = web::Data::new(AppState::for_tests(&StubSpeech::failing()));
        let app = actix_web::test::init_service(
            App::new()
                .app_data(state.clone())
                .route("/health", web::get().to(health_check)),
        )
        .await;

        let req = actix_web::test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = actix_web::test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "degraded");
        assert_eq!(body["services"]["speech"]["configured"], false);
        assert_eq!(body["quiz"]["total_questions"], 3);
        assert_eq!(body["quiz"]["questions_by_locale"]["fr-FR"], 2);
        assert_eq!(body["system"]["status"], "normal");
    }

    #[test]
    fn session_load_levels() {
        assert_eq!(get_system_status(10, 1)["status"], "normal");
        assert_eq!(get_system_status(10, 8)["status"], "moderate_load");
        assert_eq!(get_system_status(10, 10)["status"], "high_load");
        assert_eq!(
            get_system_status(10, 9)["load_warnings"].as_array().unwrap().len(),
            1
        );
    }
}
