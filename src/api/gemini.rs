use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use serde_json::json;

use crate::api::client::{build_agent, generate_content_url};
use crate::api::prompts::{SPEECH_PREFIX, SYSTEM_INSTRUCTION, visual_aid_prompt};
use crate::api::types::{Content, GenerateContentRequest, GenerateContentResponse, Part};
use crate::api::{ApiError, TutorService};
use crate::chat::{HistoryTurn, ImagePayload};
use crate::notes::TutorResponse;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub speech_model: String,
    pub image_model: String,
    pub voice: String,
    pub timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`TutorService`] backed by the Gemini `generateContent` API.
pub struct GeminiTutor {
    agent: ureq::Agent,
    settings: GeminiSettings,
}

impl GeminiTutor {
    pub fn new(settings: GeminiSettings) -> Self {
        Self {
            agent: build_agent(settings.timeout),
            settings,
        }
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn api_key(&self) -> Result<&str, ApiError> {
        self.settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ApiError::MissingApiKey)
    }

    fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ApiError> {
        let key = self.api_key()?;
        let url = generate_content_url(&self.settings.base_url, model);
        tracing::debug!(model, turns = request.contents.len(), "generateContent");

        let mut response = self
            .agent
            .post(&url)
            .header("x-goog-api-key", key)
            .send_json(request)?;
        let body: GenerateContentResponse = response.body_mut().read_json()?;

        if let Some(reason) = body.block_reason() {
            return Err(ApiError::Blocked(reason.to_string()));
        }
        Ok(body)
    }

    fn study_request(
        prompt: &str,
        history: &[HistoryTurn],
        image: Option<&ImagePayload>,
    ) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history.iter().map(Content::from).collect();

        let mut parts = Vec::new();
        if let Some(image) = image.filter(|image| image.is_complete()) {
            parts.push(Part::inline(image));
        }
        parts.push(Part::text(prompt));
        contents.push(Content::user(parts));

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content::text(SYSTEM_INSTRUCTION)),
            generation_config: Some(json!({
                "temperature": 0.1,
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "finalAnswer": { "type": "STRING" },
                        "conceptContent": { "type": "STRING" },
                        "hasConcept": { "type": "BOOLEAN" },
                        "visualPrompt": { "type": "STRING" }
                    },
                    "required": ["finalAnswer", "conceptContent", "hasConcept"]
                }
            })),
        }
    }
}

impl TutorService for GeminiTutor {
    fn generate_study_response(
        &self,
        prompt: &str,
        history: &[HistoryTurn],
        image: Option<&ImagePayload>,
    ) -> Result<TutorResponse, ApiError> {
        if prompt.trim().is_empty() && image.is_none() {
            return Err(ApiError::EmptyRequest);
        }
        let request = Self::study_request(prompt, history, image);

        match self.generate(&self.settings.text_model, &request) {
            Ok(body) => {
                let text = body.text().ok_or(ApiError::MissingContent("text"))?;
                Ok(TutorResponse::ingest(&text))
            }
            Err(err) if err.is_blocked() => {
                tracing::info!(%err, "request refused as off-topic");
                Ok(TutorResponse::blocked())
            }
            Err(err) => Err(err),
        }
    }

    fn generate_speech(&self, text: &str) -> Result<Vec<u8>, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::EmptyRequest);
        }
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(format!(
                "{SPEECH_PREFIX}{text}"
            ))])],
            system_instruction: None,
            generation_config: Some(json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.settings.voice }
                    }
                }
            })),
        };

        let body = self.generate(&self.settings.speech_model, &request)?;
        let audio = body
            .first_inline_data()
            .ok_or(ApiError::MissingContent("audio"))?;
        Ok(general_purpose::STANDARD.decode(audio.data.as_bytes())?)
    }

    fn generate_visual_aid(&self, prompt: &str) -> Result<ImagePayload, ApiError> {
        if prompt.trim().is_empty() {
            return Err(ApiError::EmptyRequest);
        }
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(visual_aid_prompt(prompt))])],
            system_instruction: None,
            generation_config: Some(json!({
                "imageConfig": { "aspectRatio": "1:1" }
            })),
        };

        let body = self.generate(&self.settings.image_model, &request)?;
        let image = body
            .first_inline_data()
            .ok_or(ApiError::MissingContent("image"))?;
        let mime_type = if image.mime_type.is_empty() {
            "image/png"
        } else {
            image.mime_type.as_str()
        };
        Ok(ImagePayload::new(mime_type, image.data.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{HistoryPart, Role};

    #[test]
    fn missing_key_fails_before_any_request() {
        let tutor = GeminiTutor::new(GeminiSettings::default());
        let err = tutor
            .generate_study_response("What is force?", &[], None)
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingApiKey));

        let tutor = GeminiTutor::new(GeminiSettings {
            api_key: Some("   ".into()),
            ..GeminiSettings::default()
        });
        assert!(matches!(
            tutor.generate_speech("hello").unwrap_err(),
            ApiError::MissingApiKey
        ));
    }

    #[test]
    fn empty_requests_are_rejected() {
        let tutor = GeminiTutor::new(GeminiSettings::default());
        assert!(matches!(
            tutor.generate_study_response("  ", &[], None).unwrap_err(),
            ApiError::EmptyRequest
        ));
        assert!(matches!(
            tutor.generate_visual_aid("").unwrap_err(),
            ApiError::EmptyRequest
        ));
    }

    #[test]
    fn study_request_appends_current_turn_after_history() {
        let history = vec![HistoryTurn {
            role: Role::Model,
            parts: vec![HistoryPart::Text("earlier".into())],
        }];
        let image = ImagePayload::new("image/png", "iVBOR");
        let request = GeminiTutor::study_request("explain", &history, Some(&image));

        assert_eq!(request.contents.len(), 2);
        assert_eq!(request.contents[0].role.as_deref(), Some("model"));
        let current = &request.contents[1];
        assert_eq!(current.role.as_deref(), Some("user"));
        assert!(current.parts[0].inline_data.is_some());
        assert_eq!(current.parts[1].text.as_deref(), Some("explain"));

        let config = request.generation_config.unwrap();
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["required"][0], "finalAnswer");
    }
}
