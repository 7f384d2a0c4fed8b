//! Azure Cognitive Services over plain REST.
//!
//! - Speech-to-text and pronunciation assessment: short-audio recognition endpoint
//! - Text-to-speech: SSML synthesis endpoint
//! - Translator: Translator Text API v3.0

mod speech;
mod synthesis;
mod translator;

pub use speech::AzureSpeechClient;
pub use synthesis::AzureTtsClient;
pub use translator::AzureTranslatorClient;

use crate::services::ServiceError;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const SUBSCRIPTION_REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub(crate) fn http_client() -> Result<reqwest::Client, ServiceError> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Key and region, or `MissingCredentials` if either is unset or blank.
fn credentials<'a>(
    service: &'static str,
    key: Option<&'a str>,
    region: Option<&'a str>,
) -> Result<(&'a str, &'a str), ServiceError> {
    let present = |value: Option<&'a str>| value.filter(|v| !v.trim().is_empty());
    match (present(key), present(region)) {
        (Some(key), Some(region)) => Ok((key, region)),
        _ => Err(ServiceError::MissingCredentials { service }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_missing() {
        assert!(credentials("speech", Some("k"), Some("westeurope")).is_ok());
        assert!(matches!(
            credentials("speech", Some("  "), Some("westeurope")),
            Err(ServiceError::MissingCredentials { service: "speech" })
        ));
        assert!(credentials("speech", Some("k"), None).is_err());
    }
}
