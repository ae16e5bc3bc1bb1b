//! Line-level layout of teacher notes.
//!
//! Notes are written one statement per line. Each line is classified so the
//! transcript can style it and decide whether it can be circled.

use crate::constants::HEADING_MAX_CHARS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Empty spacer between logical steps.
    Blank,
    /// Calculation step (`= ...`, or containing × / ÷).
    Math,
    /// Short label such as a quantity name or section title.
    Heading,
    /// `•` bullet point.
    Bullet,
    /// Regular prose.
    Notebook,
}

impl LineKind {
    pub fn is_annotatable(self) -> bool {
        matches!(self, LineKind::Math | LineKind::Heading | LineKind::Notebook)
    }
}

pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('=') || trimmed.contains('×') || trimmed.contains('÷') {
        return LineKind::Math;
    }
    let bullet = trimmed.starts_with('•');
    if trimmed.chars().count() < HEADING_MAX_CHARS
        && !trimmed.ends_with('.')
        && !trimmed.ends_with(',')
        && !bullet
    {
        return LineKind::Heading;
    }
    if bullet {
        LineKind::Bullet
    } else {
        LineKind::Notebook
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteLine {
    pub index: usize,
    pub kind: LineKind,
    pub text: String,
}

/// Split a block of notes on `\n`, keeping blank spacer lines.
pub fn split_lines(text: &str) -> Vec<NoteLine> {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| {
            let line = line.trim_end_matches('\r');
            NoteLine {
                index,
                kind: classify(line),
                text: line.to_string(),
            }
        })
        .collect()
}

/// Wrap `text` into rows of at most `width` characters, breaking on
/// whitespace when a row would overflow. Always returns at least one row.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split(' ') {
        let word_len = word.chars().count();
        let needed = if current_len == 0 {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed <= width {
            if current_len > 0 {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
            continue;
        }
        if current_len > 0 {
            rows.push(std::mem::take(&mut current));
            current_len = 0;
        }
        let mut chars = word.chars().peekable();
        while chars.peek().is_some() {
            let chunk: String = chars.by_ref().take(width).collect();
            let chunk_len = chunk.chars().count();
            if chunk_len == width && chars.peek().is_some() {
                rows.push(chunk);
            } else {
                current = chunk;
                current_len = chunk_len;
            }
        }
    }
    rows.push(current);
    rows
}
