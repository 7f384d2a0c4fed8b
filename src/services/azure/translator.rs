use super::{SUBSCRIPTION_KEY_HEADER, SUBSCRIPTION_REGION_HEADER};
use crate::config::TranslatorConfig;
use crate::services::{ServiceError, Translator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const API_VERSION: &str = "3.0";

#[derive(Debug, Clone)]
pub struct AzureTranslatorClient {
    http: reqwest::Client,
    config: TranslatorConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TranslateInput<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResult {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

impl AzureTranslatorClient {
    pub fn new(http: reqwest::Client, config: TranslatorConfig) -> Self {
        Self { http, config }
    }

    fn url(&self) -> String {
        format!("{}/translate", self.config.endpoint.trim_end_matches('/'))
    }
}

fn query<'a>(to: &'a str, from: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![("api-version", API_VERSION)];
    if let Some(from) = from.filter(|from| !from.is_empty()) {
        params.push(("from", from));
    }
    params.push(("to", to));
    params
}

fn first_translation(results: Vec<TranslateResult>) -> Option<String> {
    results
        .into_iter()
        .next()?
        .translations
        .into_iter()
        .next()
        .map(|translation| translation.text)
}

#[async_trait]
impl Translator for AzureTranslatorClient {
    async fn translate(
        &self,
        text: &str,
        to: &str,
        from: Option<&str>,
    ) -> Result<String, ServiceError> {
        let key = self
            .config
            .key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ServiceError::MissingCredentials {
                service: "translator",
            })?;
        debug!(to, from, chars = text.chars().count(), "Requesting translation");

        let mut request = self
            .http
            .post(self.url())
            .query(&query(to, from))
            .header(SUBSCRIPTION_KEY_HEADER, key)
            .json(&[TranslateInput { text }]);
        if let Some(region) = self.config.region.as_deref().filter(|r| !r.is_empty()) {
            request = request.header(SUBSCRIPTION_REGION_HEADER, region);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Translator API error");
            return Err(ServiceError::TranslationServiceError {
                status: status.as_u16(),
                body,
            });
        }

        let results: Vec<TranslateResult> = response.json().await?;
        first_translation(results).ok_or_else(|| ServiceError::TranslationServiceError {
            status: status.as_u16(),
            body: "response contained no translation".into(),
        })
    }
}
