//! Shared types for the Dialtone call agent.
//!
//! This crate holds the call-scoped values passed between the orchestrator,
//! the provider integrations and the HTTP layer: appointment requests,
//! digit responses, call sessions and their state machine, and the
//! per-language phrase packs used for the counterpart call leg.
//!
//! Nothing here performs I/O. Every type is either immutable once built or
//! owned by a single call session.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub mod voice;

pub use voice::{Language, ParseLanguageError};

/// An appointment time extracted from free text.
///
/// Lives only for the duration of one call-setup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    /// The concrete local date and time requested.
    pub when: NaiveDateTime,
    /// The text the time was extracted from.
    pub source_text: String,
}

/// A digit collected by the telephony provider and posted back to us.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DigitResponse {
    /// The keyed digits, trimmed. Usually zero or one characters.
    pub digits: String,
    /// The number of the party that pressed the digit.
    pub caller_number: String,
    /// Provider call identifier, when the callback carried one.
    pub call_sid: Option<String>,
}

impl DigitResponse {
    /// Builds a response from raw callback fields, trimming the digits and
    /// treating absent fields as empty.
    pub fn from_callback(
        digits: Option<&str>,
        caller: Option<&str>,
        call_sid: Option<&str>,
    ) -> Self {
        Self {
            digits: digits.unwrap_or_default().trim().to_string(),
            caller_number: caller.unwrap_or_default().trim().to_string(),
            call_sid: call_sid
                .map(str::trim)
                .filter(|sid| !sid.is_empty())
                .map(str::to_string),
        }
    }
}

/// Terminal result of a digit-collection event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// The callee pressed 1.
    Confirmed,
    /// The callee pressed 2.
    Cancelled,
    /// Anything else, including no input at all.
    NoResponse,
}

impl CallOutcome {
    /// Maps collected digits to an outcome.
    ///
    /// Only an exact `"1"` confirms and only an exact `"2"` cancels.
    pub fn from_digits(digits: &str) -> Self {
        match digits {
            "1" => Self::Confirmed,
            "2" => Self::Cancelled,
            _ => Self::NoResponse,
        }
    }

    /// Returns the terminal call state for this outcome.
    pub fn terminal_state(self) -> CallState {
        match self {
            Self::Confirmed => CallState::Confirmed,
            Self::Cancelled => CallState::Cancelled,
            Self::NoResponse => CallState::NoResponse,
        }
    }

    /// Returns the string label for this outcome.
    pub fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::NoResponse => "NO_RESPONSE",
        }
    }
}

/// Lifecycle of a single outbound call.
///
/// `Idle → CallRequested → PlayingPrompt → AwaitingDigit → {Confirmed,
/// Cancelled, NoResponse}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Idle,
    CallRequested,
    PlayingPrompt,
    AwaitingDigit,
    Confirmed,
    Cancelled,
    NoResponse,
}

impl CallState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled | Self::NoResponse)
    }

    /// Returns the outcome recorded by a terminal state.
    pub fn outcome(self) -> Option<CallOutcome> {
        match self {
            Self::Confirmed => Some(CallOutcome::Confirmed),
            Self::Cancelled => Some(CallOutcome::Cancelled),
            Self::NoResponse => Some(CallOutcome::NoResponse),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition_to(self, next: CallState) -> bool {
        use CallState::*;
        matches!(
            (self, next),
            (Idle, CallRequested)
                | (CallRequested, PlayingPrompt)
                | (PlayingPrompt, AwaitingDigit)
                // The provider may post the digit before we observe the
                // prompt being fetched.
                | (PlayingPrompt, Confirmed | Cancelled | NoResponse)
                | (AwaitingDigit, Confirmed | Cancelled | NoResponse)
        )
    }
}

/// Direction of a call relative to this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    #[default]
    Outbound,
}

/// Which language the prompt for a call leg is delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptLanguage {
    /// The operator's own language (English).
    #[default]
    Source,
    /// The counterpart's language, reached through translation.
    Target,
}

/// Which side of the workflow a call leg belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallLeg {
    /// The appointment-holder confirmation call (`/outgoing-call`).
    Customer,
    /// The translated relay call to the business (`/outgoing-to-barber`).
    Counterpart,
}

impl CallLeg {
    /// Prompt language used on this leg.
    pub fn prompt_language(self) -> PromptLanguage {
        match self {
            Self::Customer => PromptLanguage::Source,
            Self::Counterpart => PromptLanguage::Target,
        }
    }
}

/// Per-call state, keyed by the provider call identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSession {
    /// Provider call identifier.
    pub call_sid: String,
    pub direction: CallDirection,
    pub leg: CallLeg,
    /// The number that was dialed.
    pub counterpart_number: String,
    /// Where the outcome notification is sent.
    pub notify_number: String,
    pub prompt_language: PromptLanguage,
    /// Language the spoken replies use.
    pub language: Language,
    pub state: CallState,
}

impl CallSession {
    /// Creates a session for a call that has just been requested.
    pub fn new(
        call_sid: impl Into<String>,
        leg: CallLeg,
        counterpart_number: impl Into<String>,
        notify_number: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            call_sid: call_sid.into(),
            direction: CallDirection::Outbound,
            leg,
            counterpart_number: counterpart_number.into(),
            notify_number: notify_number.into(),
            prompt_language: leg.prompt_language(),
            language,
            state: CallState::CallRequested,
        }
    }

    /// Whether a digit is still expected for this call.
    pub fn pending_digit(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Moves to `next` if the state machine allows it.
    ///
    /// Returns `false` and leaves the session untouched otherwise.
    pub fn advance(&mut self, next: CallState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}
