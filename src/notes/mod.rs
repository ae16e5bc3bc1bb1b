//! The tutor's reply, decided once when it arrives.
//!
//! The model is asked for a JSON object. Replies that parse into that shape
//! become [`TutorResponse::StructuredNotes`]; anything else is kept verbatim
//! as [`TutorResponse::PlainText`].

pub mod lines;

use serde::{Deserialize, Serialize};

use crate::constants::{STUDY_ONLY_REPLY, WELCOME_TEXT};

pub use lines::{LineKind, NoteLine, classify, split_lines};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredNotes {
    pub final_answer: String,
    #[serde(default)]
    pub concept_content: String,
    #[serde(default)]
    pub has_concept: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_prompt: Option<String>,
}

impl StructuredNotes {
    pub fn answer_only(final_answer: impl Into<String>) -> Self {
        Self {
            final_answer: final_answer.into(),
            concept_content: String::new(),
            has_concept: false,
            visual_prompt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TutorResponse {
    StructuredNotes(StructuredNotes),
    PlainText { text: String },
}

impl TutorResponse {
    pub fn ingest(raw: &str) -> Self {
        match serde_json::from_str::<StructuredNotes>(raw.trim()) {
            Ok(mut notes) => {
                if notes
                    .visual_prompt
                    .as_deref()
                    .is_some_and(|p| p.trim().is_empty())
                {
                    notes.visual_prompt = None;
                }
                TutorResponse::StructuredNotes(notes)
            }
            Err(err) => {
                tracing::debug!(%err, "reply is not structured notes; keeping plain text");
                TutorResponse::PlainText {
                    text: raw.to_string(),
                }
            }
        }
    }

    pub fn welcome() -> Self {
        TutorResponse::StructuredNotes(StructuredNotes::answer_only(WELCOME_TEXT))
    }

    /// Reply shown when the provider refuses a request as off-topic.
    pub fn blocked() -> Self {
        TutorResponse::StructuredNotes(StructuredNotes::answer_only(STUDY_ONLY_REPLY))
    }

    /// Main body: the final answer for structured notes, the raw text otherwise.
    pub fn answer(&self) -> &str {
        match self {
            TutorResponse::StructuredNotes(notes) => &notes.final_answer,
            TutorResponse::PlainText { text } => text,
        }
    }

    /// Board-work explanation, when the reply carries one.
    pub fn concept(&self) -> Option<&str> {
        match self {
            TutorResponse::StructuredNotes(notes) if notes.has_concept => {
                Some(&notes.concept_content)
            }
            _ => None,
        }
    }

    pub fn visual_prompt(&self) -> Option<&str> {
        match self {
            TutorResponse::StructuredNotes(notes) => notes.visual_prompt.as_deref(),
            TutorResponse::PlainText { .. } => None,
        }
    }

    /// Text replayed to the model as this turn's content.
    pub fn history_text(&self) -> String {
        match self {
            TutorResponse::StructuredNotes(notes) => {
                serde_json::to_string(notes).unwrap_or_else(|_| notes.final_answer.clone())
            }
            TutorResponse::PlainText { text } => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_reply_is_recognised() {
        let raw = r#"{"finalAnswer":"Force\n= 50 N","conceptContent":"Step 1","hasConcept":true,"visualPrompt":"free body diagram"}"#;
        let reply = TutorResponse::ingest(raw);
        assert_eq!(reply.answer(), "Force\n= 50 N");
        assert_eq!(reply.concept(), Some("Step 1"));
        assert_eq!(reply.visual_prompt(), Some("free body diagram"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let reply = TutorResponse::ingest(r#"{"finalAnswer":"Photosynthesis"}"#);
        assert_eq!(reply.answer(), "Photosynthesis");
        assert_eq!(reply.concept(), None);
        assert_eq!(reply.visual_prompt(), None);
    }

    #[test]
    fn blank_visual_prompt_is_dropped() {
        let reply = TutorResponse::ingest(
            r#"{"finalAnswer":"x","conceptContent":"","hasConcept":false,"visualPrompt":"  "}"#,
        );
        assert_eq!(reply.visual_prompt(), None);
    }

    #[test]
    fn non_json_becomes_plain_text() {
        let reply = TutorResponse::ingest("Just some words");
        assert_eq!(
            reply,
            TutorResponse::PlainText {
                text: "Just some words".to_string()
            }
        );
        // JSON that is not an object with a final answer is plain text too.
        assert!(matches!(
            TutorResponse::ingest("42"),
            TutorResponse::PlainText { .. }
        ));
    }

    #[test]
    fn concept_hidden_when_flag_false() {
        let reply = TutorResponse::ingest(
            r#"{"finalAnswer":"a","conceptContent":"b","hasConcept":false}"#,
        );
        assert_eq!(reply.concept(), None);
    }

    #[test]
    fn history_text_round_trips_structured_notes() {
        let reply = TutorResponse::blocked();
        let replayed = TutorResponse::ingest(&reply.history_text());
        assert_eq!(replayed, reply);
    }

    #[test]
    fn blocked_reply_text() {
        let reply = TutorResponse::blocked();
        assert_eq!(
            reply.answer(),
            "This AI is designed only for study-related questions."
        );
        assert_eq!(reply.concept(), None);
    }
}
