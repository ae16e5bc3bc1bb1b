//! Character preview of a generated illustration.

use base64::{Engine as _, engine::general_purpose};
use image::GrayImage;
use image::imageops::{self, FilterType};
use thiserror::Error;

use crate::chat::ImagePayload;

const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f32 = 2.0;
pub const MAX_PREVIEW_ROWS: usize = 16;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("invalid base64 image: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct VisualAidPreview {
    luma: GrayImage,
    dark: bool,
    cached_width: usize,
    cached: Vec<String>,
}

impl VisualAidPreview {
    pub fn from_payload(payload: &ImagePayload) -> Result<Self, PreviewError> {
        let bytes = general_purpose::STANDARD.decode(payload.data.as_bytes())?;
        let luma = image::load_from_memory(&bytes)?.to_luma8();
        Self::from_luma(luma)
    }

    pub fn from_luma(luma: GrayImage) -> Result<Self, PreviewError> {
        if luma.width() == 0 || luma.height() == 0 {
            return Err(PreviewError::Empty);
        }
        let sum: u64 = luma.pixels().map(|p| p.0[0] as u64).sum();
        let avg = sum / (luma.width() as u64 * luma.height() as u64);
        Ok(Self {
            luma,
            dark: avg < 128,
            cached_width: 0,
            cached: Vec::new(),
        })
    }

    /// Preview rows for a column budget of `width`, aspect preserved.
    pub fn rows(&mut self, width: usize) -> &[String] {
        if width == 0 {
            return &[];
        }
        if width != self.cached_width {
            self.cached = self.render(width);
            self.cached_width = width;
        }
        &self.cached
    }

    fn render(&self, width: usize) -> Vec<String> {
        let (w, h) = (self.luma.width() as f32, self.luma.height() as f32);
        let mut cols = width as f32;
        let mut rows = (cols * h / w / CELL_ASPECT).round().max(1.0);
        if rows > MAX_PREVIEW_ROWS as f32 {
            rows = MAX_PREVIEW_ROWS as f32;
            cols = (rows * CELL_ASPECT * w / h).round().clamp(1.0, width as f32);
        }
        let small = imageops::resize(&self.luma, cols as u32, rows as u32, FilterType::Triangle);
        let top = RAMP.len() - 1;
        small
            .rows()
            .map(|row| {
                row.map(|pixel| {
                    // Ink is whatever contrasts with the background.
                    let lum = pixel.0[0] as usize;
                    let idx = if self.dark {
                        lum * top / 255
                    } else {
                        (255 - lum) * top / 255
                    };
                    RAMP[idx]
                })
                .collect::<String>()
                .trim_end()
                .to_string()
            })
            .collect()
    }
}
