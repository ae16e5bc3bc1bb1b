//! Images the student attaches to a question.

use std::io;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

use crate::chat::ImagePayload;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is empty")]
    Empty(PathBuf),
    #[error("{0} is not a JPEG, PNG, WEBP or GIF image")]
    NotAnImage(PathBuf),
}

/// MIME type from the leading magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else {
        None
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Base64 payload for raw image bytes.
pub fn encode_image(bytes: &[u8], mime_type: &str) -> ImagePayload {
    ImagePayload::new(mime_type, general_purpose::STANDARD.encode(bytes))
}

pub fn load_image(path: &Path) -> Result<ImagePayload, AttachmentError> {
    let bytes = std::fs::read(path).map_err(|source| AttachmentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AttachmentError::Empty(path.to_path_buf()));
    }
    let mime = sniff_mime(&bytes)
        .or_else(|| mime_from_extension(path))
        .ok_or_else(|| AttachmentError::NotAnImage(path.to_path_buf()))?;
    tracing::debug!(path = %path.display(), mime, bytes = bytes.len(), "image attached");
    Ok(encode_image(&bytes, mime))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(&PNG_HEADER), Some("image/png"));
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"GIF89a..."), Some("image/gif"));
        assert_eq!(sniff_mime(b"hello"), None);
    }

    #[test]
    fn loads_and_encodes_png() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(&PNG_HEADER).unwrap();
        let payload = load_image(file.path()).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data, "iVBORw0KGgo=");
    }

    #[test]
    fn extension_is_the_fallback() {
        let mut file = tempfile::Builder::new().suffix(".JPG").tempfile().unwrap();
        file.write_all(b"not really a jpeg").unwrap();
        assert_eq!(load_image(file.path()).unwrap().mime_type, "image/jpeg");
    }

    #[test]
    fn rejects_text_and_missing_files() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"plain notes").unwrap();
        assert!(matches!(
            load_image(file.path()),
            Err(AttachmentError::NotAnImage(_))
        ));
        assert!(matches!(
            load_image(Path::new("/definitely/not/here.png")),
            Err(AttachmentError::Read { .. })
        ));
    }
}
