//! Prompt text for both call legs.
//!
//! The composer owns the wording: the fixed customer greeting, the
//! appointment sentence, and the digit instructions appended to every
//! translated prompt. Translation itself is delegated to a [`Translator`].

use dialtone_types::{AppointmentRequest, Language};
use dialtone_voice::{Translator, VoiceError};
use serde::Serialize;

/// Spoken to the appointment holder on the customer leg.
pub const CUSTOMER_PROMPT: &str = "Hi there! This is a quick call to confirm your appointment. \
If you'd like to confirm, please press 1. If you need to cancel, press 2. Thank you!";

/// A prompt ready to be synthesized for the counterpart leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedPrompt {
    /// The English sentence the translation started from.
    pub source_sentence: String,
    /// The translator's output, before instructions were appended.
    pub translated: String,
    /// What the counterpart hears: translation plus digit instructions.
    pub spoken: String,
    pub language: Language,
}

/// Describes the requested time in a fixed English phrasing, e.g.
/// `I would like to book an appointment for Thursday October 17 at 04:00 PM`.
pub fn appointment_sentence(request: &AppointmentRequest) -> String {
    format!(
        "I would like to book an appointment for {}",
        request.when.format("%A %B %-d at %I:%M %p")
    )
}

/// Appends the language's digit instructions to `text`.
pub fn with_instructions(text: &str, language: Language) -> String {
    let text = text.trim();
    let separator = match text.chars().last() {
        None => "",
        Some('.' | '!' | '?') => " ",
        Some(_) => ". ",
    };
    format!("{}{}{}", text, separator, language.instruction_suffix())
}

/// Translates `sentence` into `language` and appends the digit
/// instructions, which are always present on a prompt that expects a
/// keypad answer.
///
/// # Errors
///
/// Propagates the translator's failure unchanged.
pub async fn compose_translated(
    translator: &dyn Translator,
    sentence: &str,
    language: Language,
) -> Result<ComposedPrompt, VoiceError> {
    let translated = translator.translate(sentence, language).await?;
    let spoken = with_instructions(&translated, language);
    Ok(ComposedPrompt {
        source_sentence: sentence.to_string(),
        translated,
        spoken,
        language,
    })
}
