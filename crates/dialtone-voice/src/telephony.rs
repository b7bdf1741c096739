use crate::config::TwilioConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use serde::Deserialize;

/// Places calls and sends text messages through a telephony provider.
#[async_trait]
pub trait Telephony: Send + Sync {
    /// Dials `to`; the provider fetches call instructions from `answer_url`
    /// once the call connects and, when given, posts to `status_callback`
    /// after the call ends. Returns the provider call id.
    async fn place_call(
        &self,
        to: &str,
        answer_url: &str,
        status_callback: Option<&str>,
    ) -> Result<String, VoiceError>;

    /// Sends a text message to `to`. Returns the provider message id.
    async fn send_message(&self, to: &str, body: &str) -> Result<String, VoiceError>;
}

/// Both `Calls.json` and `Messages.json` answer with the created resource.
#[derive(Debug, Deserialize)]
struct CreatedResource {
    sid: String,
}

/// Twilio REST client (`2010-04-01` API).
#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(http: reqwest::Client, config: TwilioConfig) -> Self {
        Self { http, config }
    }

    /// The number calls and messages originate from.
    pub fn from_number(&self) -> &str {
        &self.config.phone_number
    }

    fn resource_url(&self, resource: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/{}.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid,
            resource
        )
    }

    async fn create(&self, resource: &str, form: &[(&str, &str)]) -> Result<String, VoiceError> {
        let response = self
            .http
            .post(self.resource_url(resource))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Provider {
                service: "twilio",
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedResource =
            response
                .json()
                .await
                .map_err(|e| VoiceError::InvalidResponse {
                    service: "twilio",
                    message: e.to_string(),
                })?;
        Ok(created.sid)
    }
}

#[async_trait]
impl Telephony for TwilioClient {
    async fn place_call(
        &self,
        to: &str,
        answer_url: &str,
        status_callback: Option<&str>,
    ) -> Result<String, VoiceError> {
        let mut form = vec![
            ("To", to),
            ("From", self.config.phone_number.as_str()),
            ("Url", answer_url),
            ("Method", "POST"),
        ];
        if let Some(url) = status_callback {
            form.push(("StatusCallback", url));
            form.push(("StatusCallbackMethod", "POST"));
        }
        let sid = self.create("Calls", &form).await?;
        tracing::info!(call_sid = %sid, to, "outbound call created");
        Ok(sid)
    }

    async fn send_message(&self, to: &str, body: &str) -> Result<String, VoiceError> {
        let sid = self
            .create(
                "Messages",
                &[
                    ("To", to),
                    ("From", self.config.phone_number.as_str()),
                    ("Body", body),
                ],
            )
            .await?;
        tracing::debug!(message_sid = %sid, to, "text message queued");
        Ok(sid)
    }
}
