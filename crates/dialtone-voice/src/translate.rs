use crate::config::AzureConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use dialtone_types::Language;
use serde::{Deserialize, Serialize};

/// Translates text into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<String, VoiceError>;
}

#[derive(Debug, Serialize)]
struct TranslateInput<'a> {
    #[serde(rename = "Text")]
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

/// Azure Translator v3 REST client.
#[derive(Clone)]
pub struct AzureTranslator {
    http: reqwest::Client,
    endpoint: String,
    key: String,
    region: String,
}

impl std::fmt::Debug for AzureTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureTranslator")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

impl AzureTranslator {
    pub fn new(http: reqwest::Client, config: &AzureConfig) -> Self {
        Self {
            http,
            endpoint: config.translator_endpoint.trim_end_matches('/').to_string(),
            key: config.translator_key.clone(),
            region: config.translator_region.clone(),
        }
    }
}

#[async_trait]
impl Translator for AzureTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String, VoiceError> {
        if target == Language::English {
            return Ok(text.to_string());
        }

        let mut request = self
            .http
            .post(format!("{}/translate", self.endpoint))
            .query(&[
                ("api-version", "3.0"),
                ("from", Language::English.code()),
                ("to", target.code()),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&[TranslateInput { text }]);
        if !self.region.is_empty() {
            request = request.header("Ocp-Apim-Subscription-Region", &self.region);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Provider {
                service: "translator",
                status: status.as_u16(),
                body,
            });
        }

        let results: Vec<TranslateResult> =
            response
                .json()
                .await
                .map_err(|e| VoiceError::InvalidResponse {
                    service: "translator",
                    message: e.to_string(),
                })?;

        let translated = results
            .into_iter()
            .next()
            .and_then(|r| r.translations.into_iter().next())
            .map(|t| t.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| VoiceError::InvalidResponse {
                service: "translator",
                message: "response contained no translation".to_string(),
            })?;

        tracing::debug!(language = %target, chars = translated.len(), "text translated");
        Ok(translated)
    }
}
