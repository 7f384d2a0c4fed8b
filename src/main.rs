//! # Language Assistant Backend - Main Application Entry Point
//!
//! HTTP backend for a speaking-practice app: learners record a phrase, the
//! server transcribes it with a cloud speech service, scores it against the
//! expected phrase and reports pronunciation metrics. A quiz mode walks the
//! learner through shuffled prompts in one language and averages the scores.
//!
//! ## Application Architecture:
//! - **scoring**: phrase similarity score and verdict (pure, no I/O)
//! - **quiz**: question dataset, per-learner round state machine, session registry
//! - **attempt**: the shared "evaluate one recording" flow
//! - **audio**: upload validation, WAV encoding, scratch files
//! - **services**: speech/translation traits and their Azure REST clients
//! - **languages**: language catalogue (codes, locales, voices)
//! - **config / state / error / middleware / health / handlers**: the web server

mod attempt;     // One spoken attempt, practice and quiz alike
mod audio;       // Upload validation and WAV handling
mod config;      // Configuration management (config.rs)
mod error;       // Error handling types (error.rs)
mod handlers;    // HTTP request handlers (handlers/ directory)
mod health;      // Health check endpoints (health.rs)
mod languages;   // Supported languages
mod middleware;  // Custom middleware (middleware/ directory)
mod quiz;        // Quiz game mode
mod scoring;     // Phrase matching
mod services;    // External speech and translation services
mod state;       // Application state management (state.rs)

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use config::AppConfig;
use quiz::QuizBank;
use services::SpeechServices;
use state::AppState;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Request bodies above the upload limit are cut off by actix before they
/// reach the audio processor; this leaves room for the WAV header.
const PAYLOAD_HEADROOM: usize = 64 * 1024;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing()?;

    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate()?;

    info!("Starting language-assistant-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);
    if !config.speech.is_configured() {
        warn!("Azure speech credentials missing; transcription, assessment and synthesis will fail");
    }
    if !config.translator.is_configured() {
        warn!("Azure translator key missing; target-language prompts are unavailable");
    }

    let bank = QuizBank::load(&config.quiz.dataset_path)
        .with_context(|| format!("failed to load quiz dataset {}", config.quiz.dataset_path))?;
    info!(questions = bank.len(), locales = ?bank.counts_by_locale(), "Quiz dataset loaded");

    let services = SpeechServices::azure(&config)?;
    let app_state = AppState::new(config.clone(), bank, services);
    let payload_limit = config.audio.max_upload_bytes + PAYLOAD_HEADROOM;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::PayloadConfig::new(payload_limit))
            .wrap(cors)
            .wrap(middleware::MetricsMiddleware)
            .wrap(middleware::RequestLogging)
            .wrap(TracingLogger::default())
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health::health_check))
                    .route("/metrics", web::get().to(health::detailed_metrics))
                    .route("/config", web::get().to(handlers::get_config))
                    .route("/config", web::put().to(handlers::update_config))
                    .route("/languages", web::get().to(handlers::list_languages))
                    .route("/practice/score", web::post().to(handlers::score_phrase))
                    .route("/practice/attempt", web::post().to(handlers::practice_attempt))
                    .route("/practice/question-audio", web::post().to(handlers::question_audio))
                    .route("/practice/target-audio", web::post().to(handlers::target_audio))
                    .route("/translate", web::post().to(handlers::translate_text))
                    .route("/speech/synthesize", web::post().to(handlers::synthesize_speech))
                    .route("/quiz", web::post().to(handlers::start_quiz))
                    .route("/quiz/{id}", web::get().to(handlers::get_quiz))
                    .route("/quiz/{id}", web::delete().to(handlers::end_quiz))
                    .route("/quiz/{id}/attempt", web::post().to(handlers::quiz_attempt))
                    .route("/quiz/{id}/answer-audio", web::get().to(handlers::answer_audio))
                    .route("/quiz/{id}/next", web::post().to(handlers::next_round))
                    .route("/quiz/{id}/reset", web::post().to(handlers::reset_quiz)),
            )
            .route("/health", web::get().to(health::health_check))
    })
    .disable_signals()
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// `RUST_LOG` wins; otherwise debug for this crate and info for actix.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "language_assistant_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
