//! Voice-response documents (TwiML).
//!
//! The telephony provider fetches one of these whenever a call leg needs
//! instructions. Only the verbs this service uses are modelled.

use dialtone_types::Language;
use std::fmt::{self, Write};

/// Escapes text for use in XML content and attribute values.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// A single TwiML instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Say {
        text: String,
        voice: String,
        language: String,
    },
    Play {
        url: String,
    },
    Gather(Gather),
    Pause {
        length_secs: u32,
    },
    Hangup,
}

/// Collects DTMF input while playing its nested verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    pub action: String,
    pub num_digits: u32,
    pub timeout_secs: u64,
    pub children: Vec<Verb>,
}

impl Gather {
    /// A DTMF gather for exactly one digit, posted to `action`.
    pub fn single_digit(action: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            action: action.into(),
            num_digits: 1,
            timeout_secs,
            children: Vec::new(),
        }
    }

    pub fn say(mut self, text: impl Into<String>, language: Language) -> Self {
        self.children.push(say_verb(text, language));
        self
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.children.push(Verb::Play { url: url.into() });
        self
    }
}

fn say_verb(text: impl Into<String>, language: Language) -> Verb {
    Verb::Say {
        text: text.into(),
        voice: language.say_voice().to_string(),
        language: language.locale().to_string(),
    }
}

/// An ordered list of verbs rendered as a `<Response>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>, language: Language) -> Self {
        self.verbs.push(say_verb(text, language));
        self
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Play { url: url.into() });
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    pub fn pause(mut self, length_secs: u32) -> Self {
        self.verbs.push(Verb::Pause { length_secs });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Whether the document ends the call.
    pub fn ends_with_hangup(&self) -> bool {
        matches!(self.verbs.last(), Some(Verb::Hangup))
    }

    /// Renders the XML document.
    pub fn to_xml(&self) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            write_verb(&mut out, verb);
        }
        out.push_str("</Response>");
        out
    }
}

impl fmt::Display for VoiceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn write_verb(out: &mut String, verb: &Verb) {
    // Writing into a String cannot fail.
    let _ = match verb {
        Verb::Say {
            text,
            voice,
            language,
        } => write!(
            out,
            r#"<Say voice="{}" language="{}">{}</Say>"#,
            escape_xml(voice),
            escape_xml(language),
            escape_xml(text)
        ),
        Verb::Play { url } => write!(out, "<Play>{}</Play>", escape_xml(url)),
        Verb::Gather(gather) => {
            let _ = write!(
                out,
                r#"<Gather input="dtmf" numDigits="{}" action="{}" method="POST" timeout="{}">"#,
                gather.num_digits,
                escape_xml(&gather.action),
                gather.timeout_secs
            );
            for child in &gather.children {
                write_verb(out, child);
            }
            write!(out, "</Gather>")
        }
        Verb::Pause { length_secs } => write!(out, r#"<Pause length="{}"/>"#, length_secs),
        Verb::Hangup => write!(out, "<Hangup/>"),
    };
}
