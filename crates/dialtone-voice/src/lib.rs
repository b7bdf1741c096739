//! Telephony, translation and speech integrations for Dialtone.
//!
//! Each external capability sits behind a narrow async trait so the
//! orchestrator can be driven by the real provider clients in production
//! and by in-process doubles in tests:
//!
//! | Trait | Production client | Provider API |
//! |-------|-------------------|--------------|
//! | [`Telephony`] | [`TwilioClient`] | Twilio REST `Calls.json` / `Messages.json` |
//! | [`Translator`] | [`AzureTranslator`] | Azure Translator v3 `/translate` |
//! | [`SpeechSynthesizer`] | [`AzureSpeech`] | Azure Speech `/cognitiveservices/v1` |
//!
//! Every wrapper returns a typed [`VoiceError`]; none of them retry. The
//! caller decides whether a failure aborts its flow or is only logged.
//!
//! The [`twiml`] module renders the voice-response documents the provider
//! fetches while a call is live.

pub mod config;
pub mod error;
pub mod telephony;
pub mod translate;
pub mod tts;
pub mod twiml;

pub use config::{http_client, AzureConfig, HttpConfig, TwilioConfig};
pub use error::VoiceError;
pub use telephony::{Telephony, TwilioClient};
pub use translate::{AzureTranslator, Translator};
pub use tts::{build_ssml, AzureSpeech, SpeechSynthesizer, MP3_OUTPUT_FORMAT};
pub use twiml::{Gather, Verb, VoiceResponse};
