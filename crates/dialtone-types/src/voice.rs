//! Language packs for spoken prompts.
//!
//! A `Language` maps a counterpart language to the locale and voices the
//! providers expect, and to the fixed phrases spoken on a call leg: the
//! digit instruction appended to translated prompts and the three
//! terminal replies.

use crate::CallOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported prompt languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    #[default]
    English,
    German,
    Spanish,
    French,
    Italian,
}

/// Returned when a language code is not one of the supported packs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct ParseLanguageError(pub String);

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 5] = [
        Language::English,
        Language::German,
        Language::Spanish,
        Language::French,
        Language::Italian,
    ];

    /// Two-letter code used by the translation service.
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::German => "de",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::Italian => "it",
        }
    }

    /// BCP-47 locale used for `<Say language=...>` and SSML.
    pub fn locale(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::German => "de-DE",
            Self::Spanish => "es-ES",
            Self::French => "fr-FR",
            Self::Italian => "it-IT",
        }
    }

    /// Telephony provider voice for `<Say>`.
    pub fn say_voice(self) -> &'static str {
        match self {
            Self::English => "Polly.Joanna",
            Self::German => "Polly.Vicki",
            Self::Spanish => "Polly.Lucia",
            Self::French => "Polly.Lea",
            Self::Italian => "Polly.Bianca",
        }
    }

    /// Neural voice used when synthesizing audio for this language.
    pub fn synthesis_voice(self) -> &'static str {
        match self {
            Self::English => "en-US-JennyNeural",
            Self::German => "de-DE-KatjaNeural",
            Self::Spanish => "es-ES-ElviraNeural",
            Self::French => "fr-FR-DeniseNeural",
            Self::Italian => "it-IT-ElsaNeural",
        }
    }

    /// Tells the listener which digit confirms and which cancels.
    pub fn instruction_suffix(self) -> &'static str {
        match self {
            Self::English => "To confirm, please press 1. To cancel, please press 2.",
            Self::German => {
                "Um zu bestätigen, drücken Sie bitte die 1. Um abzusagen, drücken Sie bitte die 2."
            }
            Self::Spanish => "Para confirmar, pulse 1. Para cancelar, pulse 2.",
            Self::French => "Pour confirmer, appuyez sur 1. Pour annuler, appuyez sur 2.",
            Self::Italian => "Per confermare, premere 1. Per annullare, premere 2.",
        }
    }

    /// Spoken when the gather times out without input.
    pub fn fallback_phrase(self) -> &'static str {
        match self {
            Self::English => "I didn't catch that. Goodbye for now.",
            Self::German => "Ich habe Sie leider nicht verstanden. Auf Wiederhören.",
            Self::Spanish => "No he recibido respuesta. Hasta luego.",
            Self::French => "Je n'ai pas reçu de réponse. Au revoir.",
            Self::Italian => "Non ho ricevuto risposta. Arrivederci.",
        }
    }

    /// Spoken reply for a terminal outcome on a call leg in this language.
    pub fn reply(self, outcome: CallOutcome) -> &'static str {
        match (self, outcome) {
            (Self::English, CallOutcome::Confirmed) => {
                "Perfect. Your appointment has been confirmed. We'll see you soon. Goodbye!"
            }
            (Self::English, CallOutcome::Cancelled) => {
                "Got it. Your appointment has been cancelled. Thank you, and have a great day!"
            }
            (Self::English, CallOutcome::NoResponse) => {
                "I didn't get a valid response. Please try again later. Goodbye!"
            }
            (Self::German, CallOutcome::Confirmed) => {
                "Vielen Dank, der Termin ist bestätigt. Auf Wiederhören!"
            }
            (Self::German, CallOutcome::Cancelled) => {
                "Verstanden, der Termin wird nicht gebucht. Vielen Dank und einen schönen Tag!"
            }
            (Self::German, CallOutcome::NoResponse) => {
                "Ich habe keine gültige Antwort erhalten. Bitte versuchen Sie es später erneut. Auf Wiederhören!"
            }
            (Self::Spanish, CallOutcome::Confirmed) => {
                "Muchas gracias, la cita está confirmada. ¡Hasta luego!"
            }
            (Self::Spanish, CallOutcome::Cancelled) => {
                "Entendido, la cita no se reservará. ¡Gracias y que tenga un buen día!"
            }
            (Self::Spanish, CallOutcome::NoResponse) => {
                "No he recibido una respuesta válida. Por favor, inténtelo más tarde. ¡Adiós!"
            }
            (Self::French, CallOutcome::Confirmed) => {
                "Merci beaucoup, le rendez-vous est confirmé. Au revoir !"
            }
            (Self::French, CallOutcome::Cancelled) => {
                "C'est noté, le rendez-vous ne sera pas réservé. Merci et bonne journée !"
            }
            (Self::French, CallOutcome::NoResponse) => {
                "Je n'ai pas reçu de réponse valide. Veuillez réessayer plus tard. Au revoir !"
            }
            (Self::Italian, CallOutcome::Confirmed) => {
                "Grazie mille, l'appuntamento è confermato. Arrivederci!"
            }
            (Self::Italian, CallOutcome::Cancelled) => {
                "Capito, l'appuntamento non verrà prenotato. Grazie e buona giornata!"
            }
            (Self::Italian, CallOutcome::NoResponse) => {
                "Non ho ricevuto una risposta valida. Riprovi più tardi. Arrivederci!"
            }
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ParseLanguageError;

    /// Accepts a two-letter code, a locale (`de-DE`, `de_AT`) or the English
    /// name of the language, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let primary = normalized
            .split(['-', '_'])
            .next()
            .unwrap_or_default();
        match primary {
            "en" | "english" => Ok(Self::English),
            "de" | "german" => Ok(Self::German),
            "es" | "spanish" => Ok(Self::Spanish),
            "fr" | "french" => Ok(Self::French),
            "it" | "italian" => Ok(Self::Italian),
            _ => Err(ParseLanguageError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = ParseLanguageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_locales_and_names() {
        assert_eq!("de".parse::<Language>(), Ok(Language::German));
        assert_eq!("de-AT".parse::<Language>(), Ok(Language::German));
        assert_eq!("FR_fr".parse::<Language>(), Ok(Language::French));
        assert_eq!(" Spanish ".parse::<Language>(), Ok(Language::Spanish));
        assert!("klingon".parse::<Language>().is_err());
        assert!("".parse::<Language>().is_err());
    }

    #[test]
    fn code_round_trips() {
        for lang in Language::ALL {
            assert_eq!(lang.code().parse::<Language>(), Ok(lang));
            assert_eq!(lang.locale().parse::<Language>(), Ok(lang));
        }
    }

    #[test]
    fn serializes_as_code() {
        let json = serde_json::to_string(&Language::Italian).unwrap();
        assert_eq!(json, "\"it\"");
        let parsed: Language = serde_json::from_str("\"de-DE\"").unwrap();
        assert_eq!(parsed, Language::German);
        assert!(serde_json::from_str::<Language>("\"xx\"").is_err());
    }

    #[test]
    fn every_pack_mentions_both_digits() {
        for lang in Language::ALL {
            let suffix = lang.instruction_suffix();
            assert!(suffix.contains('1'), "{lang}: {suffix}");
            assert!(suffix.contains('2'), "{lang}: {suffix}");
        }
    }

    #[test]
    fn replies_are_distinct_per_outcome() {
        for lang in Language::ALL {
            let confirmed = lang.reply(CallOutcome::Confirmed);
            let cancelled = lang.reply(CallOutcome::Cancelled);
            let none = lang.reply(CallOutcome::NoResponse);
            assert_ne!(confirmed, cancelled);
            assert_ne!(cancelled, none);
            assert_ne!(confirmed, none);
        }
    }
}
