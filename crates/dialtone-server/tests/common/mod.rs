//! Shared fixtures: in-process provider doubles and a router built on them.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use dialtone_server::config::Config;
use dialtone_server::orchestrator::{CallSettings, Orchestrator};
use dialtone_server::{app, AppState};
use dialtone_types::Language;
use dialtone_voice::{SpeechSynthesizer, Telephony, Translator, TwilioConfig, VoiceError};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const BASE_URL: &str = "https://calls.example.test";
pub const PROVIDER_NUMBER: &str = "+15550000000";
pub const NOTIFY_NUMBER: &str = "+15550001111";
pub const REQUESTER_NUMBER: &str = "+15550002222";
pub const COUNTERPART_NUMBER: &str = "+493012345678";

/// Records every call and message; optionally refuses them.
#[derive(Default)]
pub struct FakeTelephony {
    pub calls: Mutex<Vec<(String, String)>>,
    pub status_callbacks: Mutex<Vec<Option<String>>>,
    pub messages: Mutex<Vec<(String, String)>>,
    pub fail_calls: bool,
    pub fail_messages: bool,
    counter: AtomicUsize,
}

impl FakeTelephony {
    pub fn failing_messages() -> Self {
        Self {
            fail_messages: true,
            ..Self::default()
        }
    }

    pub fn failing_calls() -> Self {
        Self {
            fail_calls: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_callbacks(&self) -> Vec<Option<String>> {
        self.status_callbacks.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Telephony for FakeTelephony {
    async fn place_call(
        &self,
        to: &str,
        answer_url: &str,
        status_callback: Option<&str>,
    ) -> Result<String, VoiceError> {
        if self.fail_calls {
            return Err(VoiceError::Provider {
                service: "twilio",
                status: 400,
                body: "invalid 'To' number".to_string(),
            });
        }
        self.calls
            .lock()
            .unwrap()
            .push((to.to_string(), answer_url.to_string()));
        self.status_callbacks
            .lock()
            .unwrap()
            .push(status_callback.map(str::to_string));
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("CA{:032}", n))
    }

    async fn send_message(&self, to: &str, body: &str) -> Result<String, VoiceError> {
        self.messages
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        if self.fail_messages {
            return Err(VoiceError::Provider {
                service: "twilio",
                status: 500,
                body: "messaging unavailable".to_string(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("SM{:032}", n))
    }
}

/// Prefixes text with the target language code.
pub struct FakeTranslator {
    pub fail: bool,
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, target: Language) -> Result<String, VoiceError> {
        if self.fail {
            return Err(VoiceError::Provider {
                service: "translator",
                status: 401,
                body: "access denied".to_string(),
            });
        }
        Ok(format!("[{}] {}", target.code(), text))
    }
}

pub enum SynthMode {
    Ok,
    Fail,
    Hang,
}

pub struct FakeSynthesizer {
    pub mode: SynthMode,
}

pub const FAKE_MP3: &[u8] = b"ID3\x04\x00fake-mp3-frames";

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, ssml: &str) -> Result<Vec<u8>, VoiceError> {
        assert!(ssml.starts_with("<speak"));
        match self.mode {
            SynthMode::Ok => Ok(FAKE_MP3.to_vec()),
            SynthMode::Fail => Err(VoiceError::Tts("voice not available".to_string())),
            SynthMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.twilio = TwilioConfig::new("ACtest", "secret", PROVIDER_NUMBER);
    config.server.public_base_url = format!("{}/", BASE_URL);
    config.calls.notification_number = Some(NOTIFY_NUMBER.to_string());
    config.calls.counterpart_number = Some(COUNTERPART_NUMBER.to_string());
    config.calls.default_destination = Some(REQUESTER_NUMBER.to_string());
    config
}

pub struct Harness {
    pub telephony: Arc<FakeTelephony>,
    pub orchestrator: Arc<Orchestrator>,
    pub router: Router,
}

pub struct HarnessBuilder {
    pub config: Config,
    pub telephony: FakeTelephony,
    pub translator: FakeTranslator,
    pub synthesizer: FakeSynthesizer,
    pub stage_timeout: Option<Duration>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            telephony: FakeTelephony::default(),
            translator: FakeTranslator { fail: false },
            synthesizer: FakeSynthesizer { mode: SynthMode::Ok },
            stage_timeout: None,
        }
    }

    pub fn build(self) -> Harness {
        let telephony = Arc::new(self.telephony);
        let mut settings = CallSettings::from_config(&self.config);
        if let Some(timeout) = self.stage_timeout {
            settings.stage_timeout = timeout;
        }
        let orchestrator = Arc::new(Orchestrator::new(
            telephony.clone(),
            Arc::new(self.translator),
            Arc::new(self.synthesizer),
            settings,
        ));
        let router = app(AppState {
            config: Arc::new(self.config),
            orchestrator: orchestrator.clone(),
        });
        Harness {
            telephony,
            orchestrator,
            router,
        }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::new().build()
}

impl Harness {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Posts a provider-style form callback.
    pub async fn post_form(&self, uri: &str, form: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
