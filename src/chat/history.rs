//! Bounded conversation context sent along with each question.

use crate::chat::{ChatMessage, ImagePayload, MessagePart, Role};

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPart {
    Text(String),
    InlineData(ImagePayload),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTurn {
    pub role: Role,
    pub parts: Vec<HistoryPart>,
}

fn history_part(part: &MessagePart) -> Option<HistoryPart> {
    match part {
        MessagePart::Text(text) if !text.trim().is_empty() => Some(HistoryPart::Text(text.clone())),
        MessagePart::Reply(reply) => {
            let text = reply.history_text();
            (!text.trim().is_empty()).then_some(HistoryPart::Text(text))
        }
        MessagePart::InlineImage(image) | MessagePart::GeneratedImage(image)
            if image.is_complete() =>
        {
            Some(HistoryPart::InlineData(image.clone()))
        }
        _ => None,
    }
}

/// The last `limit` messages with unusable parts stripped. Messages left
/// without any part are dropped entirely.
pub fn recent_history(messages: &[ChatMessage], limit: usize) -> Vec<HistoryTurn> {
    let start = messages.len().saturating_sub(limit);
    messages[start..]
        .iter()
        .filter_map(|message| {
            let parts: Vec<HistoryPart> = message.parts.iter().filter_map(history_part).collect();
            (!parts.is_empty()).then_some(HistoryTurn {
                role: message.role,
                parts,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageId;
    use crate::notes::TutorResponse;

    fn user(id: u64, parts: Vec<MessagePart>) -> ChatMessage {
        ChatMessage::new(MessageId(id), Role::User, parts)
    }

    #[test]
    fn keeps_only_the_last_messages() {
        let messages: Vec<ChatMessage> = (0..14)
            .map(|i| user(i, vec![MessagePart::Text(format!("q{i}"))]))
            .collect();
        let history = recent_history(&messages, 10);
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].parts, vec![HistoryPart::Text("q4".to_string())]);
    }

    #[test]
    fn strips_blank_text_and_incomplete_images() {
        let messages = vec![
            user(
                1,
                vec![
                    MessagePart::Text("   ".to_string()),
                    MessagePart::InlineImage(ImagePayload::new("", "abc")),
                ],
            ),
            user(
                2,
                vec![
                    MessagePart::InlineImage(ImagePayload::new("image/png", "iVBOR")),
                    MessagePart::Text("what is this".to_string()),
                ],
            ),
        ];
        let history = recent_history(&messages, 10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].parts.len(), 2);
    }

    #[test]
    fn generated_images_replay_as_inline_data() {
        let messages = vec![ChatMessage::new(
            MessageId(1),
            Role::Model,
            vec![
                MessagePart::Reply(TutorResponse::welcome()),
                MessagePart::GeneratedImage(ImagePayload::new("image/png", "AAAA")),
            ],
        )];
        let history = recent_history(&messages, 10);
        assert_eq!(history[0].role, Role::Model);
        assert!(matches!(history[0].parts[0], HistoryPart::Text(_)));
        assert_eq!(
            history[0].parts[1],
            HistoryPart::InlineData(ImagePayload::new("image/png", "AAAA"))
        );
    }
}
