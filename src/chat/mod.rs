//! Conversation data model.

pub mod controller;
pub mod history;

use chrono::{DateTime, Local};

use crate::notes::TutorResponse;

pub use controller::{Conversation, ModelTurn, TurnRequest, run_turn};
pub use history::{HistoryPart, HistoryTurn, recent_history};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// Base64 image plus its MIME type, as exchanged with the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.mime_type.is_empty() && !self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    /// Text typed by the student.
    Text(String),
    /// Tutor reply, parsed once on arrival.
    Reply(TutorResponse),
    /// Image attached by the student.
    InlineImage(ImagePayload),
    /// Illustration generated for a reply.
    GeneratedImage(ImagePayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub parts: Vec<MessagePart>,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(id: MessageId, role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            id,
            role,
            parts,
            timestamp: Local::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn reply(&self) -> Option<&TutorResponse> {
        self.parts.iter().find_map(|part| match part {
            MessagePart::Reply(reply) => Some(reply),
            _ => None,
        })
    }

    pub fn generated_image(&self) -> Option<&ImagePayload> {
        self.parts.iter().find_map(|part| match part {
            MessagePart::GeneratedImage(image) => Some(image),
            _ => None,
        })
    }
}
