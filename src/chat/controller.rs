//! Conversation state and the request/response cycle of one study turn.
//!
//! A turn is split in three so the UI can run the network part on a worker
//! thread: [`Conversation::begin_turn`] on the UI thread, [`run_turn`] on the
//! worker, [`Conversation::complete_turn`] back on the UI thread.

use crate::annotate::SelectionSink;
use crate::api::{ApiError, TutorService};
use crate::chat::{
    ChatMessage, HistoryTurn, ImagePayload, MessageId, MessagePart, Role, recent_history,
};
use crate::constants::{CONNECTION_ERROR, HISTORY_LIMIT, IMAGE_ONLY_PROMPT};
use crate::notes::TutorResponse;

/// Everything the worker needs to ask the tutor.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub prompt: String,
    pub history: Vec<HistoryTurn>,
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurn {
    pub reply: TutorResponse,
    pub image: Option<ImagePayload>,
}

/// Ask for the answer and, when the answer asks for one, an illustration.
/// A failed illustration leaves the answer intact.
pub fn run_turn(request: &TurnRequest, service: &dyn TutorService) -> Result<ModelTurn, ApiError> {
    let reply =
        service.generate_study_response(&request.prompt, &request.history, request.image.as_ref())?;

    let image = match reply.visual_prompt() {
        Some(prompt) => match service.generate_visual_aid(prompt) {
            Ok(image) => Some(image),
            Err(err) => {
                tracing::warn!(%err, "visual aid unavailable");
                None
            }
        },
        None => None,
    };

    Ok(ModelTurn { reply, image })
}

#[derive(Debug)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    is_thinking: bool,
    error: Option<String>,
    pending_input: String,
    pending_image: Option<ImagePayload>,
    annotation_mode: bool,
    history_limit: usize,
    next_id: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_history_limit(HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
            is_thinking: false,
            error: None,
            pending_input: String::new(),
            pending_image: None,
            annotation_mode: false,
            history_limit,
            next_id: 0,
        };
        conversation.push(Role::Model, vec![MessagePart::Reply(TutorResponse::welcome())]);
        conversation
    }

    fn push(&mut self, role: Role, parts: Vec<MessagePart>) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(ChatMessage::new(id, role, parts));
        id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_thinking(&self) -> bool {
        self.is_thinking
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    pub fn pending_input_mut(&mut self) -> &mut String {
        &mut self.pending_input
    }

    pub fn take_pending_input(&mut self) -> String {
        std::mem::take(&mut self.pending_input)
    }

    pub fn pending_image(&self) -> Option<&ImagePayload> {
        self.pending_image.as_ref()
    }

    pub fn attach_image(&mut self, image: ImagePayload) {
        self.pending_image = Some(image);
    }

    pub fn detach_image(&mut self) -> Option<ImagePayload> {
        self.pending_image.take()
    }

    pub fn annotation_mode(&self) -> bool {
        self.annotation_mode
    }

    pub fn set_annotation_mode(&mut self, active: bool) {
        if self.annotation_mode != active {
            tracing::debug!(active, "annotation mode");
        }
        self.annotation_mode = active;
    }

    pub fn toggle_annotation_mode(&mut self) -> bool {
        self.set_annotation_mode(!self.annotation_mode);
        self.annotation_mode
    }

    /// Most recent model reply, if any.
    pub fn latest_reply(&self) -> Option<(MessageId, &TutorResponse)> {
        self.messages
            .iter()
            .rev()
            .filter(|message| message.role == Role::Model)
            .find_map(|message| message.reply().map(|reply| (message.id, reply)))
    }

    /// Record the student's message and build the request for it.
    ///
    /// Returns `None` while a turn is already in flight or when there is
    /// nothing to send.
    pub fn begin_turn(&mut self, text: &str, image: Option<ImagePayload>) -> Option<TurnRequest> {
        let text = text.trim();
        if self.is_thinking || (text.is_empty() && image.is_none()) {
            return None;
        }

        // Context is everything before this question.
        let history = recent_history(&self.messages, self.history_limit);

        let mut parts = Vec::new();
        if let Some(image) = &image {
            parts.push(MessagePart::InlineImage(image.clone()));
        }
        if !text.is_empty() {
            parts.push(MessagePart::Text(text.to_string()));
        }
        self.push(Role::User, parts);

        self.is_thinking = true;
        self.error = None;
        self.pending_input.clear();

        let prompt = if text.is_empty() {
            IMAGE_ONLY_PROMPT.to_string()
        } else {
            text.to_string()
        };
        tracing::info!(
            history = history.len(),
            image = image.is_some(),
            "study turn started"
        );
        Some(TurnRequest {
            prompt,
            history,
            image,
        })
    }

    /// Record the outcome of a turn started with [`Conversation::begin_turn`].
    pub fn complete_turn(&mut self, result: Result<ModelTurn, ApiError>) -> Option<MessageId> {
        self.is_thinking = false;
        match result {
            Ok(turn) => {
                let mut parts = vec![MessagePart::Reply(turn.reply)];
                if let Some(image) = turn.image {
                    parts.push(MessagePart::GeneratedImage(image));
                }
                let id = self.push(Role::Model, parts);
                tracing::info!(message = id.0, "study turn answered");
                Some(id)
            }
            Err(err) => {
                tracing::warn!(%err, "study turn failed");
                self.error = Some(CONNECTION_ERROR.to_string());
                None
            }
        }
    }

    /// Run a whole turn on the calling thread.
    pub fn submit(
        &mut self,
        text: &str,
        image: Option<ImagePayload>,
        service: &dyn TutorService,
    ) -> Option<MessageId> {
        let request = self.begin_turn(text, image)?;
        let result = run_turn(&request, service);
        self.complete_turn(result)
    }
}

impl SelectionSink for Conversation {
    fn on_selection_resolved(&mut self, query: String) {
        self.pending_input = query;
    }

    fn exit_annotation_mode(&mut self) {
        self.set_annotation_mode(false);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::annotate::bridge_selection;
    use crate::chat::HistoryPart;
    use crate::constants::STUDY_ONLY_REPLY;

    #[derive(Default)]
    struct FakeTutor {
        reply: Option<String>,
        fail_visual: bool,
        calls: Mutex<Vec<(String, usize, bool)>>,
    }

    impl FakeTutor {
        fn replying(raw: &str) -> Self {
            Self {
                reply: Some(raw.to_string()),
                ..Self::default()
            }
        }
    }

    impl TutorService for FakeTutor {
        fn generate_study_response(
            &self,
            prompt: &str,
            history: &[HistoryTurn],
            image: Option<&ImagePayload>,
        ) -> Result<TutorResponse, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), history.len(), image.is_some()));
            match &self.reply {
                Some(raw) => Ok(TutorResponse::ingest(raw)),
                None => Err(ApiError::Transport("connection refused".into())),
            }
        }

        fn generate_speech(&self, _text: &str) -> Result<Vec<u8>, ApiError> {
            Ok(vec![0, 0])
        }

        fn generate_visual_aid(&self, _prompt: &str) -> Result<ImagePayload, ApiError> {
            if self.fail_visual {
                Err(ApiError::Status(500))
            } else {
                Ok(ImagePayload::new("image/png", "AAAA"))
            }
        }
    }

    #[test]
    fn starts_with_welcome_message() {
        let conversation = Conversation::new();
        assert_eq!(conversation.messages().len(), 1);
        let (_, reply) = conversation.latest_reply().unwrap();
        assert_eq!(reply, &TutorResponse::welcome());
    }

    #[test]
    fn blank_input_without_image_is_ignored() {
        let mut conversation = Conversation::new();
        assert!(conversation.begin_turn("   ", None).is_none());
        assert_eq!(conversation.messages().len(), 1);
        assert!(!conversation.is_thinking());
    }

    #[test]
    fn begin_turn_takes_history_before_appending() {
        let mut conversation = Conversation::new();
        conversation.set_pending_input("What is force?");
        let request = conversation.begin_turn(" What is force? ", None).unwrap();

        assert_eq!(request.prompt, "What is force?");
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0].role, Role::Model);
        assert_eq!(conversation.messages().len(), 2);
        assert!(conversation.is_thinking());
        assert!(conversation.pending_input().is_empty());

        // A second send while thinking is refused.
        assert!(conversation.begin_turn("again", None).is_none());
    }

    #[test]
    fn image_only_turn_uses_default_prompt() {
        let mut conversation = Conversation::new();
        let image = ImagePayload::new("image/jpeg", "/9j/");
        let request = conversation.begin_turn("", Some(image.clone())).unwrap();
        assert_eq!(request.prompt, IMAGE_ONLY_PROMPT);
        assert_eq!(request.image, Some(image.clone()));

        let user = conversation.messages().last().unwrap();
        assert_eq!(user.parts, vec![MessagePart::InlineImage(image)]);
    }

    #[test]
    fn image_part_comes_before_text() {
        let mut conversation = Conversation::new();
        conversation
            .begin_turn("what is this", Some(ImagePayload::new("image/png", "iVBOR")))
            .unwrap();
        let user = conversation.messages().last().unwrap();
        assert!(matches!(user.parts[0], MessagePart::InlineImage(_)));
        assert!(matches!(user.parts[1], MessagePart::Text(_)));
    }

    #[test]
    fn submit_appends_reply_and_illustration() {
        let tutor = FakeTutor::replying(
            r#"{"finalAnswer":"Plant cell","conceptContent":"","hasConcept":false,"visualPrompt":"plant cell"}"#,
        );
        let mut conversation = Conversation::new();
        let id = conversation.submit("Draw a plant cell", None, &tutor).unwrap();

        let message = conversation.messages().last().unwrap();
        assert_eq!(message.id, id);
        assert_eq!(message.reply().unwrap().answer(), "Plant cell");
        assert!(message.generated_image().is_some());
        assert!(!conversation.is_thinking());
    }

    #[test]
    fn failed_illustration_keeps_answer() {
        let tutor = FakeTutor {
            fail_visual: true,
            ..FakeTutor::replying(r#"{"finalAnswer":"x","visualPrompt":"diagram"}"#)
        };
        let mut conversation = Conversation::new();
        conversation.submit("q", None, &tutor).unwrap();
        let message = conversation.messages().last().unwrap();
        assert_eq!(message.reply().unwrap().answer(), "x");
        assert!(message.generated_image().is_none());
        assert!(conversation.error().is_none());
    }

    #[test]
    fn failure_sets_banner_and_clears_thinking() {
        let tutor = FakeTutor::default();
        let mut conversation = Conversation::new();
        assert!(conversation.submit("q", None, &tutor).is_none());
        assert_eq!(conversation.error(), Some(CONNECTION_ERROR));
        assert!(!conversation.is_thinking());
        // The question stays in the transcript.
        assert_eq!(conversation.messages().len(), 2);

        // The next turn clears the banner.
        conversation.begin_turn("retry", None).unwrap();
        assert!(conversation.error().is_none());
    }

    #[test]
    fn history_grows_with_each_turn() {
        let tutor = FakeTutor::replying(r#"{"finalAnswer":"ok"}"#);
        let mut conversation = Conversation::new();
        conversation.submit("one", None, &tutor).unwrap();
        conversation.submit("two", None, &tutor).unwrap();

        let calls = tutor.calls.lock().unwrap();
        assert_eq!(calls[0], ("one".to_string(), 1, false));
        assert_eq!(calls[1], ("two".to_string(), 3, false));
    }

    #[test]
    fn history_replays_structured_reply_as_json() {
        let tutor = FakeTutor::replying(&format!(r#"{{"finalAnswer":"{STUDY_ONLY_REPLY}"}}"#));
        let mut conversation = Conversation::new();
        conversation.submit("tell me a joke", None, &tutor).unwrap();
        let request = conversation.begin_turn("and another", None).unwrap();
        let last = request.history.last().unwrap();
        assert_eq!(last.role, Role::Model);
        match &last.parts[0] {
            HistoryPart::Text(text) => assert!(text.contains("\"finalAnswer\"")),
            other => panic!("unexpected part {other:?}"),
        }
    }

    #[test]
    fn selection_fills_input_and_leaves_annotation_mode() {
        let mut conversation = Conversation::new();
        conversation.set_annotation_mode(true);
        assert!(bridge_selection("Force = 50 N", &mut conversation));
        assert!(!conversation.annotation_mode());
        assert_eq!(
            conversation.pending_input(),
            "Teacher, can you explain this part specifically? \"Force = 50 N\""
        );
        // Nothing was sent.
        assert_eq!(conversation.messages().len(), 1);
    }
}
