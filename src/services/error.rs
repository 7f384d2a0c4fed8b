use thiserror::Error;

/// Failures of the external speech and translation services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("speech could not be recognized: {0}")]
    RecognitionFailed(String),

    #[error("pronunciation could not be assessed: {0}")]
    AssessmentFailed(String),

    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("speech synthesis canceled ({reason}): {detail}")]
    SynthesisCanceled { reason: String, detail: String },

    #[error("missing credentials for the {service} service")]
    MissingCredentials { service: &'static str },

    #[error("translation service returned {status}: {body}")]
    TranslationServiceError { status: u16, body: String },

    #[error("service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scratch audio error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Short machine-readable kind, used in warnings and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::RecognitionFailed(_) => "recognition_failed",
            ServiceError::AssessmentFailed(_) => "assessment_failed",
            ServiceError::SynthesisFailed(_) => "synthesis_failed",
            ServiceError::SynthesisCanceled { .. } => "synthesis_canceled",
            ServiceError::MissingCredentials { .. } => "missing_credentials",
            ServiceError::TranslationServiceError { .. } => "translation_service_error",
            ServiceError::Http(_) => "http",
            ServiceError::Io(_) => "io",
        }
    }
}
