//! Shared crate-wide constants.

use std::time::Duration;

/// Smallest stroke extent (in pixels, either axis) that counts as a
/// deliberate circle rather than a tap.
///
/// A stroke is discarded only when both its width and height fall below this
/// value, so a perfectly horizontal underline still resolves.
pub const MIN_STROKE_EXTENT: f32 = 5.0;

/// How long a matched line keeps its highlight after a resolved stroke.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(800);

/// Number of trailing messages replayed to the model as context.
pub const HISTORY_LIMIT: usize = 10;

/// Lines shorter than this (in characters) without closing punctuation render
/// as headings.
pub const HEADING_MAX_CHARS: usize = 40;

/// Narration audio format returned by the speech model.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
pub const SPEECH_CHANNELS: u16 = 1;

/// Template prefix used when circled text becomes a follow-up question.
pub const EXPLAIN_PREFIX: &str = "Teacher, can you explain this part specifically?";

/// Prompt used when the student sends an image without any text.
pub const IMAGE_ONLY_PROMPT: &str = "Analyze this image and explain the study content.";

pub const CONNECTION_ERROR: &str =
    "Something went wrong while reaching your tutor. Please check your connection.";

pub const STUDY_ONLY_REPLY: &str = "This AI is designed only for study-related questions.";

pub const WELCOME_TEXT: &str = "Hello, I am Chalkmark. I am here to help you with your studies. \
You can ask me questions about Mathematics, Science, History, and more. \
Please share your topic or problem.";

pub const ANNOTATION_HINT: &str = "Circle any text to explain it!";

/// Frame pacing for the UI loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(16);
