//! Server configuration loading from file and environment variables.

use dialtone_types::Language;
use dialtone_voice::{AzureConfig, HttpConfig, TwilioConfig};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
///
/// Built once at startup and shared read-only with every component.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Telephony provider credentials.
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// Translation and speech credentials.
    #[serde(default)]
    pub azure: AzureConfig,

    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Call-flow numbers, language and timeouts.
    #[serde(default)]
    pub calls: CallsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL the provider calls back into
    /// (e.g. an ngrok tunnel).
    #[serde(default)]
    pub public_base_url: String,
}

/// Phone numbers and prompt settings for the call flows.
#[derive(Debug, Clone, Deserialize)]
pub struct CallsConfig {
    /// Number dialed by `/make-call` when no `to_phone_number` is given.
    #[serde(default)]
    pub default_destination: Option<String>,

    /// Recipient of outcome text messages. Defaults to the provider number.
    #[serde(default)]
    pub notification_number: Option<String>,

    /// The business dialed by `/simulate-customer`.
    #[serde(default)]
    pub counterpart_number: Option<String>,

    /// Language the counterpart is addressed in.
    #[serde(default = "default_target_language")]
    pub target_language: Language,

    /// Request text used by `/simulate-customer` when the body has none.
    #[serde(default = "default_request_text")]
    pub default_request_text: String,

    /// Digit wait on the customer leg, in seconds.
    #[serde(default = "default_gather_timeout")]
    pub gather_timeout_secs: u64,

    /// Digit wait on the counterpart leg, in seconds.
    #[serde(default = "default_relay_gather_timeout")]
    pub relay_gather_timeout_secs: u64,

    /// How long a settled call is remembered to deduplicate callbacks.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Upper bound on tracked call sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "dialtone_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5050
}

fn default_target_language() -> Language {
    Language::German
}

fn default_request_text() -> String {
    "I want a haircut tomorrow at 4pm".to_string()
}

fn default_gather_timeout() -> u64 {
    10
}

fn default_relay_gather_timeout() -> u64 {
    15
}

fn default_session_ttl() -> u64 {
    600
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: String::new(),
        }
    }
}

impl Default for CallsConfig {
    fn default() -> Self {
        Self {
            default_destination: None,
            notification_number: None,
            counterpart_number: None,
            target_language: default_target_language(),
            default_request_text: default_request_text(),
            gather_timeout_secs: default_gather_timeout(),
            relay_gather_timeout_secs: default_relay_gather_timeout(),
            session_ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Checks that every variable the service cannot run without is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("TWILIO_ACCOUNT_SID", &self.twilio.account_sid),
            ("TWILIO_AUTH_TOKEN", &self.twilio.auth_token),
            ("TWILIO_PHONE_NUMBER", &self.twilio.phone_number),
            ("PUBLIC_BASE_URL", &self.server.public_base_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }
        Ok(())
    }

    /// Where outcome notifications go: the configured recipient, else the
    /// provider number itself.
    pub fn notification_number(&self) -> &str {
        self.calls
            .notification_number
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.twilio.phone_number)
    }

    /// Base URL without a trailing slash.
    pub fn public_base_url(&self) -> &str {
        self.server.public_base_url.trim_end_matches('/')
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    /// A required setting is absent.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies overrides from the process environment.
///
/// Missing required settings are not checked here; call [`Config::validate`].
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or an override has an unparseable value.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`], resolving overrides through `lookup` instead of
/// the process environment.
pub fn load_config_with<F>(path: Option<&str>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, lookup)?;
    Ok(config)
}

/// Applies environment-style overrides using `lookup` to resolve names.
///
/// Recognised variables:
/// - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER`
/// - `PUBLIC_BASE_URL` (or the legacy `NGROK_URL`), `HOST`, `PORT`
/// - `TOURIST_NUMBER` → `calls.default_destination`
/// - `NOTIFICATION_NUMBER`, `BARBER_NUMBER` → `calls.counterpart_number`
/// - `TARGET_LANGUAGE`
/// - `AZURE_TRANSLATOR_KEY`, `AZURE_TRANSLATOR_REGION`, `AZURE_SPEECH_KEY`,
///   `AZURE_SPEECH_REGION`
/// - `HTTP_TIMEOUT_SECS`
/// - `DIALTONE_LOG_LEVEL`, `DIALTONE_LOG_JSON` ("true" or "1" to enable)
///
/// Empty values are ignored.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("TWILIO_ACCOUNT_SID") {
        config.twilio.account_sid = v;
    }
    if let Some(v) = get("TWILIO_AUTH_TOKEN") {
        config.twilio.auth_token = v;
    }
    if let Some(v) = get("TWILIO_PHONE_NUMBER") {
        config.twilio.phone_number = v;
    }
    if let Some(v) = get("PUBLIC_BASE_URL").or_else(|| get("NGROK_URL")) {
        config.server.public_base_url = v;
    }
    if let Some(v) = get("HOST") {
        config.server.host = v.parse().map_err(|_| ConfigError::InvalidValue {
            name: "HOST",
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("PORT") {
        config.server.port = v.parse().map_err(|_| ConfigError::InvalidValue {
            name: "PORT",
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("TOURIST_NUMBER") {
        config.calls.default_destination = Some(v);
    }
    if let Some(v) = get("NOTIFICATION_NUMBER") {
        config.calls.notification_number = Some(v);
    }
    if let Some(v) = get("BARBER_NUMBER") {
        config.calls.counterpart_number = Some(v);
    }
    if let Some(v) = get("TARGET_LANGUAGE") {
        config.calls.target_language = v.parse().map_err(|_| ConfigError::InvalidValue {
            name: "TARGET_LANGUAGE",
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("AZURE_TRANSLATOR_KEY") {
        config.azure.translator_key = v;
    }
    if let Some(v) = get("AZURE_TRANSLATOR_REGION") {
        config.azure.translator_region = v;
    }
    if let Some(v) = get("AZURE_SPEECH_KEY") {
        config.azure.speech_key = v;
    }
    if let Some(v) = get("AZURE_SPEECH_REGION") {
        config.azure.speech_region = v;
    }
    if let Some(v) = get("HTTP_TIMEOUT_SECS") {
        config.http.timeout_secs = v.parse().map_err(|_| ConfigError::InvalidValue {
            name: "HTTP_TIMEOUT_SECS",
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("DIALTONE_LOG_LEVEL") {
        config.logging.level = v;
    }
    if let Some(v) = get("DIALTONE_LOG_JSON") {
        config.logging.json = v == "true" || v == "1";
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_PHONE_NUMBER", "+15550000000"),
            ("NGROK_URL", "https://abc.ngrok.app/"),
        ]
    }

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.server.port, 5050);
        assert_eq!(config.calls.gather_timeout_secs, 10);
        assert_eq!(config.calls.relay_gather_timeout_secs, 15);
        assert_eq!(config.calls.session_ttl_secs, 600);
        assert_eq!(config.calls.max_sessions, 10_000);
        assert_eq!(config.calls.target_language, Language::German);
        assert_eq!(config.http.timeout_secs, 15);
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_fill_required_settings() {
        let mut config = Config::default();
        apply_overrides(&mut config, lookup(&complete_env())).unwrap();
        config.validate().unwrap();
        assert_eq!(config.public_base_url(), "https://abc.ngrok.app");
        assert_eq!(config.notification_number(), "+15550000000");
    }

    #[test]
    fn public_base_url_wins_over_ngrok() {
        let mut env = complete_env();
        env.push(("PUBLIC_BASE_URL", "https://calls.example.com"));
        let mut config = Config::default();
        apply_overrides(&mut config, lookup(&env)).unwrap();
        assert_eq!(config.public_base_url(), "https://calls.example.com");
    }

    #[test]
    fn missing_variable_is_reported_by_name() {
        let env: Vec<_> = complete_env()
            .into_iter()
            .filter(|(k, _)| *k != "TWILIO_AUTH_TOKEN")
            .collect();
        let mut config = Config::default();
        apply_overrides(&mut config, lookup(&env)).unwrap();
        match config.validate() {
            Err(ConfigError::Missing(name)) => assert_eq!(name, "TWILIO_AUTH_TOKEN"),
            other => panic!("expected Missing error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = Config::default();
        let result = apply_overrides(&mut config, lookup(&[("PORT", "not-a-port")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
    }

    #[test]
    fn numbers_and_language_overrides() {
        let mut env = complete_env();
        env.extend([
            ("TOURIST_NUMBER", "+15551110000"),
            ("NOTIFICATION_NUMBER", "+15552220000"),
            ("BARBER_NUMBER", "+4930123456"),
            ("TARGET_LANGUAGE", "fr"),
            ("DIALTONE_LOG_JSON", "1"),
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, lookup(&env)).unwrap();
        assert_eq!(
            config.calls.default_destination.as_deref(),
            Some("+15551110000")
        );
        assert_eq!(config.notification_number(), "+15552220000");
        assert_eq!(
            config.calls.counterpart_number.as_deref(),
            Some("+4930123456")
        );
        assert_eq!(config.calls.target_language, Language::French);
        assert!(config.logging.json);
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080
public_base_url = "https://calls.example.com"

[twilio]
account_sid = "AC999"
auth_token = "tok"
phone_number = "+15550009999"

[calls]
counterpart_number = "+4930000000"
target_language = "es"
gather_timeout_secs = 12
"#
        )
        .unwrap();

        let config = load_config_with(file.path().to_str(), |_| None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.twilio.account_sid, "AC999");
        assert_eq!(config.calls.target_language, Language::Spanish);
        assert_eq!(config.calls.gather_timeout_secs, 12);
        assert_eq!(config.calls.relay_gather_timeout_secs, 15);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config_with(Some("/nonexistent/dialtone.toml"), |_| None).unwrap();
        assert_eq!(config.server.port, 5050);
    }
}
