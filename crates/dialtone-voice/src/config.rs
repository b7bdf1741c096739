use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
pub const DEFAULT_TRANSLATOR_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

fn default_twilio_api_base() -> String {
    DEFAULT_TWILIO_API_BASE.to_string()
}

fn default_translator_endpoint() -> String {
    DEFAULT_TRANSLATOR_ENDPOINT.to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

/// Credentials and caller id for the Twilio REST API.
#[derive(Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default, skip_serializing)]
    pub auth_token: String,
    /// The provider number calls and messages are sent from.
    #[serde(default)]
    pub phone_number: String,
    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            phone_number: String::new(),
            api_base: default_twilio_api_base(),
        }
    }
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("phone_number", &self.phone_number)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            phone_number: phone_number.into(),
            api_base: default_twilio_api_base(),
        }
    }
}

/// Azure Cognitive Services credentials for translation and speech.
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(default, skip_serializing)]
    pub translator_key: String,
    /// Resource region; may be empty for global translator resources.
    #[serde(default)]
    pub translator_region: String,
    #[serde(default = "default_translator_endpoint")]
    pub translator_endpoint: String,
    #[serde(default, skip_serializing)]
    pub speech_key: String,
    #[serde(default)]
    pub speech_region: String,
    /// Overrides the region-derived speech endpoint.
    #[serde(default)]
    pub speech_endpoint: Option<String>,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            translator_key: String::new(),
            translator_region: String::new(),
            translator_endpoint: default_translator_endpoint(),
            speech_key: String::new(),
            speech_region: String::new(),
            speech_endpoint: None,
        }
    }
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("translator_key", &"[REDACTED]")
            .field("translator_region", &self.translator_region)
            .field("translator_endpoint", &self.translator_endpoint)
            .field("speech_key", &"[REDACTED]")
            .field("speech_region", &self.speech_region)
            .field("speech_endpoint", &self.speech_endpoint)
            .finish()
    }
}

impl AzureConfig {
    /// Base URL of the speech synthesis REST API.
    pub fn speech_base_url(&self) -> String {
        match &self.speech_endpoint {
            Some(endpoint) if !endpoint.is_empty() => endpoint.trim_end_matches('/').to_string(),
            _ => format!("https://{}.tts.speech.microsoft.com", self.speech_region),
        }
    }
}

/// Outbound HTTP settings shared by every provider client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Upper bound for a single provider request, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Builds the shared `reqwest` client with the bounded request timeout.
pub fn http_client(config: &HttpConfig) -> Result<reqwest::Client, crate::VoiceError> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(concat!("dialtone/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(crate::VoiceError::Http)
}
