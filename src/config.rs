//! # Configuration Management
//!
//! Loads the server configuration from several layered sources and validates
//! it before the server starts.
//!
//! ## Configuration Sources (in order of priority):
//! 1. **Shortcut environment variables**: `HOST`, `PORT` and the Azure
//!    credential variables (`AZURE_SPEECH_KEY`, `AZURE_SPEECH_REGION`,
//!    `AZURE_TRANSLATOR_KEY`, `AZURE_TRANSLATOR_REGION`)
//! 2. **Prefixed environment variables**: `APP_SERVER__PORT=9090`,
//!    `APP_QUIZ__DATASET_PATH=...` (double underscore between nesting levels)
//! 3. **Config file**: `config.toml` in the working directory, or the file
//!    named by `APP_CONFIG_FILE` (optional)
//! 4. **Default values**: built-in fallbacks
//!
//! `.env` files are loaded by `main` before this module runs.
//!
//! ## Secrets:
//! Subscription keys are never serialized back to API clients (see
//! [`AppConfig::redacted`]) and are masked in `Debug` output.

use crate::audio::{AudioFormat, AudioProcessor};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Main application configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Azure Speech resource used for recognition, assessment and synthesis.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub key: Option<String>,
    pub region: Option<String>,
    /// Recognition locale for free practice attempts.
    pub default_locale: String,
}

/// Azure Translator resource.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslatorConfig {
    pub key: Option<String>,
    pub region: Option<String>,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuizConfig {
    /// CSV file with `lang,question,answer` rows.
    pub dataset_path: String,
}

/// Audio format and upload limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub max_upload_bytes: usize,
    /// Where attempt recordings are staged; the system temp dir when unset.
    pub scratch_dir: Option<String>,
}

/// Performance and resource limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Maximum number of live quiz sessions.
    pub max_concurrent_sessions: usize,
    /// Sessions untouched for this long may be evicted when the registry is full.
    pub session_idle_minutes: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            key: None,
            region: None,
            default_locale: "en-US".to_string(),
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            key: None,
            region: None,
            endpoint: "https://api.cognitive.microsofttranslator.com".to_string(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            dataset_path: "data/game_phrases.csv".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            bit_depth: 16,
            max_upload_bytes: 10 * 1024 * 1024,
            scratch_dir: None,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: 100,
            session_idle_minutes: 60,
        }
    }
}

fn mask(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "Some(***)",
        None => "None",
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("key", &format_args!("{}", mask(&self.key)))
            .field("region", &self.region)
            .field("default_locale", &self.default_locale)
            .finish()
    }
}

impl fmt::Debug for TranslatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorConfig")
            .field("key", &format_args!("{}", mask(&self.key)))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl SpeechConfig {
    pub fn is_configured(&self) -> bool {
        is_set(&self.key) && is_set(&self.region)
    }
}

impl TranslatorConfig {
    pub fn is_configured(&self) -> bool {
        is_set(&self.key)
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl AudioConfig {
    pub fn format(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate, self.channels, self.bit_depth)
    }

    pub fn processor(&self) -> AudioProcessor {
        AudioProcessor::new(self.format(), self.max_upload_bytes)
    }
}

impl AppConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self> {
        let file = env::var("APP_CONFIG_FILE").unwrap_or_else(|_| "config".to_string());
        Self::load_from(&file)
    }

    /// Load with `file` as the config file name (extension optional, file optional).
    pub fn load_from(file: &str) -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let overrides = [
            ("HOST", "server.host"),
            ("PORT", "server.port"),
            ("AZURE_SPEECH_KEY", "speech.key"),
            ("AZURE_SPEECH_REGION", "speech.region"),
            ("AZURE_TRANSLATOR_KEY", "translator.key"),
            ("AZURE_TRANSLATOR_REGION", "translator.region"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = env::var(var) {
                settings = settings.set_override(key, value)?;
            }
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.performance.max_concurrent_sessions == 0 {
            return Err(anyhow::anyhow!("Max concurrent sessions must be greater than 0"));
        }

        if self.audio.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("Max upload size must be greater than 0"));
        }

        if self.audio.format() != AudioFormat::SPEECH {
            return Err(anyhow::anyhow!(
                "Audio format must be 16000 Hz, mono, 16-bit (got {} Hz, {} channel(s), {}-bit)",
                self.audio.sample_rate,
                self.audio.channels,
                self.audio.bit_depth
            ));
        }

        if self.quiz.dataset_path.trim().is_empty() {
            return Err(anyhow::anyhow!("Quiz dataset path cannot be empty"));
        }

        Ok(())
    }

    /// Apply a partial JSON update at runtime.
    ///
    /// Only non-secret fields can be changed; keys and regions are ignored.
    /// The update is all-or-nothing: if the result does not validate, `self`
    /// is left untouched.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial: serde_json::Value = serde_json::from_str(json_str)?;
        let mut updated = self.clone();

        if let Some(server) = partial.get("server") {
            if let Some(host) = server.get("host").and_then(|v| v.as_str()) {
                updated.server.host = host.to_string();
            }
            if let Some(port) = server.get("port").and_then(|v| v.as_u64()) {
                updated.server.port = u16::try_from(port)?;
            }
        }

        if let Some(locale) = partial
            .get("speech")
            .and_then(|speech| speech.get("default_locale"))
            .and_then(|v| v.as_str())
        {
            updated.speech.default_locale = locale.to_string();
        }

        if let Some(endpoint) = partial
            .get("translator")
            .and_then(|translator| translator.get("endpoint"))
            .and_then(|v| v.as_str())
        {
            updated.translator.endpoint = endpoint.to_string();
        }

        if let Some(path) = partial
            .get("quiz")
            .and_then(|quiz| quiz.get("dataset_path"))
            .and_then(|v| v.as_str())
        {
            updated.quiz.dataset_path = path.to_string();
        }

        if let Some(audio) = partial.get("audio") {
            if let Some(max) = audio.get("max_upload_bytes").and_then(|v| v.as_u64()) {
                updated.audio.max_upload_bytes = usize::try_from(max)?;
            }
            if let Some(dir) = audio.get("scratch_dir") {
                updated.audio.scratch_dir = dir.as_str().map(str::to_string);
            }
        }

        if let Some(performance) = partial.get("performance") {
            if let Some(sessions) = performance
                .get("max_concurrent_sessions")
                .and_then(|v| v.as_u64())
            {
                updated.performance.max_concurrent_sessions = usize::try_from(sessions)?;
            }
            if let Some(minutes) = performance
                .get("session_idle_minutes")
                .and_then(|v| v.as_u64())
            {
                updated.performance.session_idle_minutes = u32::try_from(minutes)?;
            }
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Settings that differ from `running` but are only read at startup: the
    /// bind address, the quiz dataset and the session registry limits.
    pub fn restart_required(&self, running: &AppConfig) -> Vec<&'static str> {
        [
            ("server.host", self.server.host != running.server.host),
            ("server.port", self.server.port != running.server.port),
            ("quiz.dataset_path", self.quiz.dataset_path != running.quiz.dataset_path),
            (
                "performance.max_concurrent_sessions",
                self.performance.max_concurrent_sessions
                    != running.performance.max_concurrent_sessions,
            ),
            (
                "performance.session_idle_minutes",
                self.performance.session_idle_minutes != running.performance.session_idle_minutes,
            ),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }

    /// JSON view of the configuration with secrets replaced by `key_configured` flags.
    pub fn redacted(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        for (section, configured) in [
            ("speech", is_set(&self.speech.key)),
            ("translator", is_set(&self.translator.key)),
        ] {
            if let Some(section) = value.get_mut(section).and_then(|s| s.as_object_mut()) {
                section.remove("key");
                section.insert("key_configured".to_string(), configured.into());
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_only_changes_are_listed() {
        let running = AppConfig::default();
        let mut updated = running.clone();
        updated
            .update_from_json(r#"{"audio": {"max_upload_bytes": 2048}, "quiz": {"dataset_path": "other.csv"}, "performance": {"max_concurrent_sessions": 5}}"#)
            .unwrap();

        assert_eq!(
            updated.restart_required(&running),
            vec!["quiz.dataset_path", "performance.max_concurrent_sessions"]
        );
        assert!(running.restart_required(&running).is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.speech.default_locale, "en-US");
        assert_eq!(config.audio.format(), AudioFormat::SPEECH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.audio.sample_rate = 44_100;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.performance.max_concurrent_sessions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_update() {
        let mut config = AppConfig::default();
        let json = r#"{"server": {"port": 9090}, "quiz": {"dataset_path": "other.csv"}}"#;
        assert!(config.update_from_json(json).is_ok());
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.quiz.dataset_path, "other.csv");
    }

    #[test]
    fn invalid_update_leaves_config_unchanged() {
        let mut config = AppConfig::default();
        let json = r#"{"server": {"port": 9090}, "performance": {"max_concurrent_sessions": 0}}"#;
        assert!(config.update_from_json(json).is_err());
        assert_eq!(config, AppConfig::default());

        assert!(config.update_from_json(r#"{"server": {"port": 70000}}"#).is_err());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn secrets_cannot_be_updated_or_read_back() {
        let mut config = AppConfig::default();
        config.speech.key = Some("secret-key".into());
        config.speech.region = Some("westeurope".into());

        config
            .update_from_json(r#"{"speech": {"key": "attacker", "default_locale": "fr-FR"}}"#)
            .unwrap();
        assert_eq!(config.speech.key.as_deref(), Some("secret-key"));
        assert_eq!(config.speech.default_locale, "fr-FR");

        let view = config.redacted();
        assert!(view["speech"].get("key").is_none());
        assert_eq!(view["speech"]["key_configured"], true);
        assert_eq!(view["speech"]["region"], "westeurope");
        assert_eq!(view["translator"]["key_configured"], false);
        assert!(!view.to_string().contains("secret-key"));
        assert!(!format!("{config:?}").contains("secret-key"));
    }

    #[test]
    fn credentials_are_detected() {
        let mut config = AppConfig::default();
        assert!(!config.speech.is_configured());
        config.speech.key = Some("k".into());
        assert!(!config.speech.is_configured());
        config.speech.region = Some("eastus".into());
        assert!(config.speech.is_configured());
    }

    #[test]
    fn example_file_parses() {
        let text = include_str!("../config.example.toml");
        let config: AppConfig = toml::from_str(text).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.quiz.dataset_path, "data/game_phrases.csv");
        assert!(config.speech.key.is_none());
    }

    #[test]
    fn file_layer_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[audio]\nmax_upload_bytes = 2048\n\n[performance]\nsession_idle_minutes = 5\n",
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.audio.max_upload_bytes, 2048);
        assert_eq!(config.audio.sample_rate, 16_000);
        assert_eq!(config.performance.session_idle_minutes, 5);
    }
}
