//! System clipboard access for copying answers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("nothing to copy")]
    Empty,
    #[error("clipboard backend error: {0}")]
    Backend(#[from] arboard::Error),
}

/// Put `text` on the system clipboard.
pub fn set(text: &str) -> Result<(), ClipboardError> {
    if text.trim().is_empty() {
        return Err(ClipboardError::Empty);
    }
    let mut cb = arboard::Clipboard::new()?;
    cb.set_text(text.to_owned())?;
    Ok(())
}

/// Plain-text rendering of a reply for the clipboard: the answer, then the
/// board work when present.
pub fn reply_text(answer: &str, concept: Option<&str>) -> String {
    match concept.map(str::trim).filter(|c| !c.is_empty()) {
        Some(concept) => format!("{}\n\nStep-by-Step Board Work\n{}", answer.trim_end(), concept),
        None => answer.trim_end().to_string(),
    }
}
