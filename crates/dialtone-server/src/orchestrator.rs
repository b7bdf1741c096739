//! Call orchestration.
//!
//! Drives both call legs through `CallRequested → PlayingPrompt →
//! AwaitingDigit → {Confirmed, Cancelled, NoResponse}`:
//!
//! * **customer leg** (`/make-call`): dial the appointment holder, speak a
//!   fixed English prompt, collect one digit, text the outcome to the
//!   notification number;
//! * **counterpart leg** (`/simulate-customer`): extract a time from the
//!   request text, translate and synthesize a prompt, dial the business,
//!   play it, collect one digit, text the outcome to the requester.
//!
//! Setup failures abort before anything is dialed. Once a call is live,
//! a failed notification is logged and the call still gets its spoken
//! reply and hangup.

use crate::audio_store::AudioStore;
use crate::compose::{appointment_sentence, compose_translated, ComposedPrompt, CUSTOMER_PROMPT};
use crate::config::Config;
use crate::extract;
use crate::sessions::{DigitClaim, SessionRegistry, DEFAULT_OPEN_TTL};
use chrono::NaiveDateTime;
use dialtone_types::{
    AppointmentRequest, CallLeg, CallOutcome, CallSession, CallState, DigitResponse, Language,
};
use dialtone_voice::{
    build_ssml, Gather, SpeechSynthesizer, Telephony, Translator, VoiceError, VoiceResponse,
};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A step of call setup, reported with setup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Destination,
    Translate,
    Synthesize,
    Call,
    Notify,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Destination => "destination",
            Self::Translate => "translate",
            Self::Synthesize => "synthesize",
            Self::Call => "call",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No phone number provided and no default destination (TOURIST_NUMBER) configured.")]
    MissingDestination,

    #[error("No counterpart number (BARBER_NUMBER) configured.")]
    MissingCounterpart,

    #[error("No appointment time found in the request text.")]
    NoAppointment,

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: VoiceError,
    },

    #[error("{stage} timed out after {secs} seconds")]
    Timeout { stage: Stage, secs: u64 },
}

impl OrchestratorError {
    /// The setup step that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingDestination | Self::MissingCounterpart => Stage::Destination,
            Self::NoAppointment => Stage::Extract,
            Self::Stage { stage, .. } | Self::Timeout { stage, .. } => *stage,
        }
    }
}

/// Picks the number to dial: the explicit one, else the configured default.
/// Blank values count as absent.
pub fn resolve_destination(
    explicit: Option<&str>,
    default: Option<&str>,
) -> Result<String, OrchestratorError> {
    explicit
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| default.map(str::trim).filter(|n| !n.is_empty()))
        .map(str::to_string)
        .ok_or(OrchestratorError::MissingDestination)
}

/// Text message sent when a call leg reaches `outcome`.
pub fn notification_body(leg: CallLeg, outcome: CallOutcome, caller: &str) -> String {
    let caller = caller.trim();
    match leg {
        CallLeg::Customer => {
            let who = if caller.is_empty() { "the callee" } else { caller };
            match outcome {
                CallOutcome::Confirmed => {
                    format!("Your appointment has been confirmed by {who}. See you soon!")
                }
                CallOutcome::Cancelled => format!("Your appointment has been cancelled by {who}."),
                CallOutcome::NoResponse => format!("No valid response received by {who}."),
            }
        }
        CallLeg::Counterpart => {
            let who = if caller.is_empty() { "the business" } else { caller };
            match outcome {
                CallOutcome::Confirmed => {
                    format!("Good news! Your appointment request was confirmed by {who}.")
                }
                CallOutcome::Cancelled => {
                    format!("Your appointment request was declined by {who}.")
                }
                CallOutcome::NoResponse => {
                    format!("No valid response received from {who} about your appointment request.")
                }
            }
        }
    }
}

/// Where the provider reports call lifecycle changes.
pub const STATUS_CALLBACK_PATH: &str = "/call-status";

/// Provider call statuses after which no further callbacks arrive.
pub fn is_final_call_status(status: &str) -> bool {
    matches!(
        status.trim().to_ascii_lowercase().as_str(),
        "completed" | "busy" | "failed" | "no-answer" | "canceled"
    )
}

/// The document returned for every terminal branch: reply, pause, hangup.
pub fn terminal_reply(language: Language, outcome: CallOutcome) -> VoiceResponse {
    VoiceResponse::new()
        .say(language.reply(outcome), language)
        .pause(1)
        .hangup()
}

/// Numbers, language and timeouts the orchestrator works with.
#[derive(Debug, Clone)]
pub struct CallSettings {
    /// Base URL the provider calls back into, without a trailing slash.
    pub public_base_url: String,
    pub default_destination: Option<String>,
    pub notification_number: String,
    pub counterpart_number: Option<String>,
    pub target_language: Language,
    pub gather_timeout_secs: u64,
    pub relay_gather_timeout_secs: u64,
    /// Upper bound on any single provider call.
    pub stage_timeout: Duration,
    /// How long a settled session is kept for deduplication.
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl CallSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_base_url: config.public_base_url().to_string(),
            default_destination: config.calls.default_destination.clone(),
            notification_number: config.notification_number().to_string(),
            counterpart_number: config.calls.counterpart_number.clone(),
            target_language: config.calls.target_language,
            gather_timeout_secs: config.calls.gather_timeout_secs,
            relay_gather_timeout_secs: config.calls.relay_gather_timeout_secs,
            stage_timeout: config.http.timeout(),
            session_ttl: Duration::from_secs(config.calls.session_ttl_secs),
            max_sessions: config.calls.max_sessions,
        }
    }

    /// Who hears about the counterpart's answer: the default destination
    /// (the person the appointment is for), else the notification number.
    pub fn requester_number(&self) -> &str {
        self.default_destination
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.notification_number)
    }
}

/// Outcome of a successful `/simulate-customer` setup.
#[derive(Debug, Clone, Serialize)]
pub struct RelayCall {
    pub call_sid: String,
    pub audio_id: String,
    pub audio_url: String,
    pub appointment: AppointmentRequest,
    pub prompt: ComposedPrompt,
}

pub struct Orchestrator {
    telephony: Arc<dyn Telephony>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sessions: SessionRegistry,
    audio: AudioStore,
    settings: CallSettings,
}

impl Orchestrator {
    pub fn new(
        telephony: Arc<dyn Telephony>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        settings: CallSettings,
    ) -> Self {
        Self {
            telephony,
            translator,
            synthesizer,
            sessions: SessionRegistry::with_limits(
                settings.session_ttl,
                DEFAULT_OPEN_TTL,
                settings.max_sessions,
            ),
            audio: AudioStore::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &CallSettings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn audio(&self) -> &AudioStore {
        &self.audio
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.public_base_url, path)
    }

    /// Public URL of a stored audio artifact.
    pub fn audio_url(&self, audio_id: &str) -> String {
        self.url(&format!("/audio/{audio_id}.mp3"))
    }

    /// Runs one provider call under the stage timeout, tagging failures
    /// with `stage`.
    async fn bounded<T, F>(&self, stage: Stage, call: F) -> Result<T, OrchestratorError>
    where
        F: Future<Output = Result<T, VoiceError>>,
    {
        match tokio::time::timeout(self.settings.stage_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(OrchestratorError::Stage { stage, source }),
            Err(_) => Err(OrchestratorError::Timeout {
                stage,
                secs: self.settings.stage_timeout.as_secs(),
            }),
        }
    }

    /// `Idle → CallRequested → PlayingPrompt` for the customer leg.
    ///
    /// # Errors
    ///
    /// `MissingDestination` when neither `to` nor a default is available;
    /// a `Call` stage error when the provider rejects the call.
    pub async fn start_customer_call(&self, to: Option<&str>) -> Result<String, OrchestratorError> {
        let to = resolve_destination(to, self.settings.default_destination.as_deref())?;
        let answer_url = self.url("/outgoing-call");
        let status_url = self.url(STATUS_CALLBACK_PATH);

        let call_sid = self
            .bounded(
                Stage::Call,
                self.telephony
                    .place_call(&to, &answer_url, Some(&status_url)),
            )
            .await?;

        let mut session = CallSession::new(
            call_sid.clone(),
            CallLeg::Customer,
            to.clone(),
            self.settings.notification_number.clone(),
            Language::English,
        );
        session.advance(CallState::PlayingPrompt);
        self.sessions.insert(session);

        tracing::info!(call_sid = %call_sid, to = %to, "customer call initiated");
        Ok(call_sid)
    }

    /// Prompt document for the customer leg: speak, gather one digit, and
    /// fall through to a goodbye when nothing is pressed.
    pub fn customer_prompt(&self, call_sid: Option<&str>) -> VoiceResponse {
        if let Some(sid) = call_sid {
            self.sessions.mark_awaiting_digit(sid);
        }
        let language = Language::English;
        VoiceResponse::new()
            .gather(
                Gather::single_digit("/gather-handler", self.settings.gather_timeout_secs)
                    .say(CUSTOMER_PROMPT, language),
            )
            .say(language.fallback_phrase(), language)
            .pause(1)
            .hangup()
    }

    /// Runs extraction, composition, translation and synthesis, then dials
    /// the counterpart. Nothing is dialed if any earlier step fails.
    ///
    /// # Errors
    ///
    /// Returns the first failing step; see [`OrchestratorError::stage`].
    pub async fn simulate_customer(
        &self,
        text: &str,
        target: Option<Language>,
        now: NaiveDateTime,
    ) -> Result<RelayCall, OrchestratorError> {
        let appointment = extract::extract(text, now).ok_or(OrchestratorError::NoAppointment)?;
        let counterpart = self
            .settings
            .counterpart_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or(OrchestratorError::MissingCounterpart)?;
        let language = target.unwrap_or(self.settings.target_language);

        let sentence = appointment_sentence(&appointment);
        let prompt = self
            .bounded(
                Stage::Translate,
                compose_translated(self.translator.as_ref(), &sentence, language),
            )
            .await?;
        tracing::debug!(language = %language, spoken = %prompt.spoken, "counterpart prompt composed");

        let ssml = build_ssml(&prompt.spoken, language);
        let audio = self
            .bounded(Stage::Synthesize, self.synthesizer.synthesize(&ssml))
            .await?;
        let artifact = self.audio.put(audio);

        let answer_url = self.url(&format!(
            "/outgoing-to-barber?audio={}&lang={}",
            artifact.id,
            language.code()
        ));
        let status_url = self.url(STATUS_CALLBACK_PATH);
        let call_sid = self
            .bounded(
                Stage::Call,
                self.telephony
                    .place_call(&counterpart, &answer_url, Some(&status_url)),
            )
            .await?;

        let mut session = CallSession::new(
            call_sid.clone(),
            CallLeg::Counterpart,
            counterpart.clone(),
            self.settings.requester_number().to_string(),
            language,
        );
        session.advance(CallState::PlayingPrompt);
        self.sessions.insert(session);

        tracing::info!(
            call_sid = %call_sid,
            to = %counterpart,
            audio_id = %artifact.id,
            when = %appointment.when,
            "counterpart call initiated"
        );

        Ok(RelayCall {
            audio_url: self.audio_url(&artifact.id),
            audio_id: artifact.id,
            call_sid,
            appointment,
            prompt,
        })
    }

    /// Prompt document for the counterpart leg: play the synthesized
    /// audio, gather one digit, fall through to a goodbye.
    ///
    /// Without a stored artifact there is nothing to play, so the document
    /// is just the goodbye and the session is closed as `NoResponse`.
    pub fn counterpart_prompt(
        &self,
        audio_id: Option<&str>,
        language: Language,
        call_sid: Option<&str>,
    ) -> VoiceResponse {
        let audio_id = match audio_id.filter(|id| self.audio.get(id).is_ok()) {
            Some(id) => id,
            None => {
                tracing::warn!(
                    audio_id = audio_id.unwrap_or_default(),
                    call_sid = call_sid.unwrap_or_default(),
                    "counterpart prompt has no playable audio"
                );
                if let Some(sid) = call_sid {
                    self.sessions.expire(sid);
                }
                return VoiceResponse::new()
                    .say(language.fallback_phrase(), language)
                    .pause(1)
                    .hangup();
            }
        };
        if let Some(sid) = call_sid {
            self.sessions.mark_awaiting_digit(sid);
        }
        let action = format!("/barber-response?lang={}", language.code());
        VoiceResponse::new()
            .gather(
                Gather::single_digit(action, self.settings.relay_gather_timeout_secs)
                    .play(self.audio_url(audio_id)),
            )
            .say(language.fallback_phrase(), language)
            .pause(1)
            .hangup()
    }

    /// Call-status callback from the provider. A call that ends while its
    /// session is still open (the digit wait ran out, the callee hung up or
    /// never answered) settles as `NoResponse`. No notification is sent.
    ///
    /// Returns `true` if this callback closed the session.
    pub fn call_ended(&self, call_sid: &str, status: &str) -> bool {
        if !is_final_call_status(status) {
            tracing::debug!(call_sid, status, "call status update");
            return false;
        }
        let expired = self.sessions.expire(call_sid);
        if expired {
            tracing::info!(call_sid, status, "call ended without a digit response");
        }
        expired
    }

    /// Session for a digit callback: the registered one when the call id is
    /// known, otherwise rebuilt from the callback and the leg defaults.
    fn session_for(
        &self,
        leg: CallLeg,
        response: &DigitResponse,
        language_hint: Option<Language>,
    ) -> CallSession {
        if let Some(session) = response
            .call_sid
            .as_deref()
            .and_then(|sid| self.sessions.get(sid))
        {
            return session;
        }

        let (notify, language) = match leg {
            CallLeg::Customer => (
                self.settings.notification_number.clone(),
                language_hint.unwrap_or(Language::English),
            ),
            CallLeg::Counterpart => (
                self.settings.requester_number().to_string(),
                language_hint.unwrap_or(self.settings.target_language),
            ),
        };
        CallSession::new(
            response.call_sid.clone().unwrap_or_default(),
            leg,
            response.caller_number.clone(),
            notify,
            language,
        )
    }

    /// `AwaitingDigit → {Confirmed, Cancelled, NoResponse}` for either leg.
    ///
    /// Every branch runs the same steps: settle the session, send the
    /// notification (failures are logged, never returned), then reply,
    /// pause and hang up. A repeated delivery for an already settled call
    /// replays the original reply without notifying again.
    pub async fn handle_digit(
        &self,
        leg: CallLeg,
        response: DigitResponse,
        language_hint: Option<Language>,
    ) -> VoiceResponse {
        let outcome = CallOutcome::from_digits(&response.digits);
        let session = self.session_for(leg, &response, language_hint);

        let claim = if session.call_sid.is_empty() {
            DigitClaim::Fresh
        } else {
            self.sessions.settle(&session, outcome)
        };

        let outcome = match claim {
            DigitClaim::Fresh => {
                tracing::info!(
                    call_sid = %session.call_sid,
                    leg = ?leg,
                    outcome = outcome.label(),
                    caller = %response.caller_number,
                    "digit response received"
                );
                self.notify(&session, outcome, &response.caller_number)
                    .await;
                outcome
            }
            DigitClaim::Duplicate(previous) => {
                tracing::warn!(
                    call_sid = %session.call_sid,
                    outcome = previous.label(),
                    "duplicate digit callback, notification already sent"
                );
                previous
            }
        };

        terminal_reply(session.language, outcome)
    }

    async fn notify(&self, session: &CallSession, outcome: CallOutcome, caller: &str) {
        let body = notification_body(session.leg, outcome, caller);
        match self
            .bounded(
                Stage::Notify,
                self.telephony.send_message(&session.notify_number, &body),
            )
            .await
        {
            Ok(message_sid) => {
                tracing::info!(
                    call_sid = %session.call_sid,
                    message_sid = %message_sid,
                    to = %session.notify_number,
                    "outcome notification sent"
                );
            }
            Err(e) => {
                tracing::error!(
                    call_sid = %session.call_sid,
                    to = %session.notify_number,
                    outcome = outcome.label(),
                    "failed to send outcome notification: {}",
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_prefers_explicit_number() {
        assert_eq!(
            resolve_destination(Some("+15551112222"), Some("+15553334444")).unwrap(),
            "+15551112222"
        );
        assert_eq!(
            resolve_destination(None, Some("+15553334444")).unwrap(),
            "+15553334444"
        );
        assert_eq!(
            resolve_destination(Some("  "), Some("+15553334444")).unwrap(),
            "+15553334444"
        );
    }

    #[test]
    fn destination_missing_everywhere() {
        let err = resolve_destination(None, None).unwrap_err();
        assert!(matches!(err, OrchestratorError::MissingDestination));
        assert_eq!(err.stage(), Stage::Destination);
        assert!(err.to_string().starts_with("No phone number provided"));
        assert!(matches!(
            resolve_destination(Some(""), Some("")),
            Err(OrchestratorError::MissingDestination)
        ));
    }

    #[test]
    fn customer_notifications_name_the_caller() {
        let body = notification_body(CallLeg::Customer, CallOutcome::Confirmed, "+15551234567");
        assert_eq!(
            body,
            "Your appointment has been confirmed by +15551234567. See you soon!"
        );
        let body = notification_body(CallLeg::Customer, CallOutcome::Cancelled, "");
        assert_eq!(body, "Your appointment has been cancelled by the callee.");
        let body = notification_body(CallLeg::Customer, CallOutcome::NoResponse, "x");
        assert_eq!(body, "No valid response received by x.");
    }

    #[test]
    fn counterpart_notifications_address_the_requester() {
        let body = notification_body(CallLeg::Counterpart, CallOutcome::Confirmed, "");
        assert!(body.contains("confirmed by the business"));
        let body = notification_body(CallLeg::Counterpart, CallOutcome::Cancelled, "+4930");
        assert!(body.contains("declined by +4930"));
    }

    #[test]
    fn terminal_reply_ends_call() {
        for outcome in [
            CallOutcome::Confirmed,
            CallOutcome::Cancelled,
            CallOutcome::NoResponse,
        ] {
            let doc = terminal_reply(Language::English, outcome);
            assert!(doc.ends_with_hangup());
            let xml = doc.to_xml();
            assert!(xml.contains(r#"<Pause length="1"/>"#));
            assert!(xml.contains(&dialtone_voice::twiml::escape_xml(
                Language::English.reply(outcome)
            )));
        }
    }

    #[test]
    fn final_call_statuses() {
        for status in ["completed", "busy", "failed", "no-answer", "canceled", "Completed"] {
            assert!(is_final_call_status(status), "{status}");
        }
        for status in ["queued", "ringing", "in-progress", ""] {
            assert!(!is_final_call_status(status), "{status}");
        }
    }

    #[test]
    fn error_stages() {
        let err = OrchestratorError::Stage {
            stage: Stage::Synthesize,
            source: VoiceError::Tts("boom".to_string()),
        };
        assert_eq!(err.stage(), Stage::Synthesize);
        assert_eq!(err.to_string(), "synthesize failed: TTS error: boom");
        assert_eq!(OrchestratorError::NoAppointment.stage(), Stage::Extract);
        let timeout = OrchestratorError::Timeout {
            stage: Stage::Translate,
            secs: 15,
        };
        assert_eq!(timeout.to_string(), "translate timed out after 15 seconds");
    }
}
