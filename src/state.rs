//! # Application State Management
//!
//! Shared state handed to every request handler through `web::Data<AppState>`.
//!
//! ## What lives here:
//! - **Configuration**: runtime-updatable settings behind an `RwLock`
//! - **Metrics**: request counts, per-route timings and attempt outcomes
//! - **Quiz sessions**: the registry of live quizzes
//! - **Quiz bank**: the question dataset, read-only after startup
//! - **Speech services**: trait objects for the external cloud calls
//!
//! Cloning an `AppState` is cheap: every field is an `Arc` or a handle
//! wrapping one, so all workers see the same sessions and counters.

use crate::config::AppConfig;
use crate::quiz::{QuizBank, QuizStore};
use crate::services::SpeechServices;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<RwLock<AppConfig>>,
    pub metrics: Arc<RwLock<AppMetrics>>,
    pub quizzes: QuizStore,
    pub bank: Arc<QuizBank>,
    pub services: SpeechServices,
    pub start_time: Instant,
}

/// Counters collected by the metrics middleware and the attempt handlers.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    pub request_count: u64,
    pub error_count: u64,
    /// Recordings evaluated (practice and quiz).
    pub attempts_evaluated: u64,
    /// Attempts where at least one external call failed.
    pub degraded_attempts: u64,
    /// Keyed by `"METHOD /route/{pattern}"`.
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    pub fn new(config: AppConfig, bank: QuizBank, services: SpeechServices) -> Self {
        let quizzes = QuizStore::new(
            config.performance.max_concurrent_sessions,
            chrono::Duration::minutes(config.performance.session_idle_minutes.into()),
        );

        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            quizzes,
            bank: Arc::new(bank),
            services,
            start_time: Instant::now(),
        }
    }

    /// Get a copy of the current configuration.
    pub fn get_config(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration after validating it.
    ///
    /// Server address and session limits take effect on restart; upload
    /// limits, locales and the translator endpoint apply to the next request.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        new_config.validate().map_err(|e| e.to_string())?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = new_config;
        Ok(())
    }

    fn with_metrics(&self, f: impl FnOnce(&mut AppMetrics)) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut metrics);
    }

    pub fn increment_request_count(&self) {
        self.with_metrics(|m| m.request_count += 1);
    }

    pub fn increment_error_count(&self) {
        self.with_metrics(|m| m.error_count += 1);
    }

    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        self.with_metrics(|m| {
            let metric = m.endpoint_metrics.entry(endpoint.to_string()).or_default();
            metric.request_count += 1;
            metric.total_duration_ms += duration_ms;
            if is_error {
                metric.error_count += 1;
            }
        });
    }

    pub fn record_attempt(&self, degraded: bool) {
        self.with_metrics(|m| {
            m.attempts_evaluated += 1;
            if degraded {
                m.degraded_attempts += 1;
            }
        });
    }

    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Live quiz sessions.
    pub fn active_sessions(&self) -> usize {
        self.quizzes.len()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl AppMetrics {
    pub fn error_rate(&self) -> f64 {
        ratio(self.error_count, self.request_count)
    }
}

impl EndpointMetric {
    pub fn average_duration_ms(&self) -> f64 {
        ratio(self.total_duration_ms, self.request_count)
    }

    pub fn error_rate(&self) -> f64 {
        ratio(self.error_count, self.request_count)
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by `stub` services and a small in-memory question bank.
    pub fn for_tests(stub: &crate::services::stub::StubSpeech) -> Self {
        use crate::quiz::QuizQuestion;

        let question = |prompt: &str, answer: &str, locale: &str| QuizQuestion {
            prompt: prompt.to_string(),
            expected_answer: answer.to_string(),
            locale: locale.to_string(),
        };
        let bank = QuizBank::new(vec![
            question("How do you say 'thank you'?", "Merci", "fr-FR"),
            question("How do you say 'good night'?", "Bonne nuit", "fr-FR"),
            question("How do you say 'cheers'?", "Prost", "de-DE"),
        ]);

        let mut config = AppConfig::default();
        config.performance.max_concurrent_sessions = 4;
        Self::new(config, bank, stub.services())
    }
}
