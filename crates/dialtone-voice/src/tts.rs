use crate::config::AzureConfig;
use crate::error::VoiceError;
use crate::twiml::escape_xml;
use async_trait::async_trait;
use dialtone_types::Language;

/// Maximum SSML input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Output format requested from the speech service; served as `audio/mpeg`.
pub const MP3_OUTPUT_FORMAT: &str = "audio-16khz-32kbitrate-mono-mp3";

/// Renders speech audio from an SSML document.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns MP3 audio bytes.
    async fn synthesize(&self, ssml: &str) -> Result<Vec<u8>, VoiceError>;
}

/// Builds a single-voice SSML document for `text` in `language`.
pub fn build_ssml(text: &str, language: Language) -> String {
    format!(
        r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="{locale}"><voice name="{voice}">{text}</voice></speak>"#,
        locale = language.locale(),
        voice = language.synthesis_voice(),
        text = escape_xml(text),
    )
}

/// Azure Speech text-to-speech REST client.
#[derive(Clone)]
pub struct AzureSpeech {
    http: reqwest::Client,
    base_url: String,
    key: String,
}

impl std::fmt::Debug for AzureSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSpeech")
            .field("base_url", &self.base_url)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl AzureSpeech {
    pub fn new(http: reqwest::Client, config: &AzureConfig) -> Self {
        Self {
            http,
            base_url: config.speech_base_url(),
            key: config.speech_key.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureSpeech {
    async fn synthesize(&self, ssml: &str) -> Result<Vec<u8>, VoiceError> {
        if ssml.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                ssml.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let response = self
            .http
            .post(format!("{}/cognitiveservices/v1", self.base_url))
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", MP3_OUTPUT_FORMAT)
            .body(ssml.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Provider {
                service: "speech",
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(VoiceError::Tts("speech service returned no audio".to_string()));
        }

        tracing::debug!(bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssml_selects_voice_and_escapes() {
        let ssml = build_ssml("Termin um 16 Uhr & mehr", Language::German);
        assert!(ssml.contains(r#"xml:lang="de-DE""#));
        assert!(ssml.contains(r#"<voice name="de-DE-KatjaNeural">"#));
        assert!(ssml.contains("16 Uhr &amp; mehr"));
        assert!(ssml.starts_with("<speak"));
        assert!(ssml.ends_with("</speak>"));
    }
}
