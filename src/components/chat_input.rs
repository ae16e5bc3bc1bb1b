use std::path::PathBuf;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders};

use crate::components::{Component, ComponentContext};
use crate::theme;
use crate::ui::UiFrame;

/// What a submitted input line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Send(String),
    Attach(PathBuf),
    Detach,
}

impl InputCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed == "/detach" {
            return InputCommand::Detach;
        }
        if let Some(rest) = trimmed.strip_prefix("/attach ") {
            let path = rest.trim();
            if !path.is_empty() {
                let path = shell_words::split(path)
                    .ok()
                    .and_then(|mut words| (words.len() == 1).then(|| words.remove(0)))
                    .unwrap_or_else(|| path.to_string());
                return InputCommand::Attach(PathBuf::from(path));
            }
        }
        InputCommand::Send(trimmed.to_string())
    }
}

/// Single-line question editor.
///
/// The text mirrors the conversation's pending input; the screen copies it in
/// with [`ChatInputComponent::sync`] before drawing and out with
/// [`ChatInputComponent::text`] after edits.
#[derive(Debug, Default)]
pub struct ChatInputComponent {
    text: String,
    cursor: usize,
    attachment: Option<String>,
    submitted: Option<InputCommand>,
}

impl ChatInputComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Adopt `text` when it was changed elsewhere, e.g. by a circled selection.
    pub fn sync(&mut self, text: &str) {
        if self.text != text {
            self.text = text.to_string();
            self.cursor = self.text.chars().count();
        }
    }

    /// Label shown for the attached image, if any.
    pub fn set_attachment(&mut self, label: Option<String>) {
        self.attachment = label;
    }

    pub fn take_submission(&mut self) -> Option<InputCommand> {
        self.submitted.take()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    fn handle_key(&mut self, key: &KeyEvent, busy: bool) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let len = self.text.chars().count();
        match key.code {
            KeyCode::Enter if !ctrl => {
                let command = InputCommand::parse(&self.text);
                let empty_send = matches!(&command, InputCommand::Send(text) if text.is_empty());
                // Sends wait for the current answer; the text stays in place.
                if busy && matches!(command, InputCommand::Send(_)) {
                    return true;
                }
                if !empty_send || self.attachment.is_some() {
                    self.submitted = Some(command);
                }
            }
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = len,
            KeyCode::Char('u') if ctrl => {
                self.text.clear();
                self.cursor = 0;
            }
            KeyCode::Char(c) if !ctrl => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            _ => return false,
        }
        true
    }
}

impl Component for ChatInputComponent {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        if area.width < 4 || area.height < 3 {
            return;
        }
        let title = if ctx.busy() {
            " Teacher is writing... "
        } else {
            " Ask your teacher "
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(if ctx.busy() {
                theme::input_disabled()
            } else {
                theme::input_border()
            });
        if let Some(label) = &self.attachment {
            block = block.title_bottom(format!(" [image: {label}] /detach "));
        }
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 {
            return;
        }

        let width = inner.width as usize;
        let chars: Vec<char> = self.text.chars().collect();
        // Keep the cursor on screen.
        let start = (self.cursor + 1).saturating_sub(width);
        let visible: String = chars.iter().skip(start).take(width).collect();
        let style = if ctx.busy() {
            theme::input_disabled()
        } else {
            Style::default()
        };
        if visible.is_empty() && !ctx.busy() {
            frame.set_string(
                inner,
                inner.x,
                inner.y,
                "Type a question, or Ctrl+P to circle part of an answer",
                theme::muted(),
            );
        } else {
            frame.set_string(inner, inner.x, inner.y, &visible, style);
        }

        if ctx.focused() {
            let x = inner.x + (self.cursor - start) as u16;
            let under = chars.get(self.cursor).copied().unwrap_or(' ');
            frame.set_symbol(
                x,
                inner.y,
                &under.to_string(),
                Style::default().add_modifier(Modifier::REVERSED),
            );
        }
    }

    fn handle_event(&mut self, event: &Event, ctx: &ComponentContext) -> bool {
        match event {
            Event::Key(key) if ctx.focused() => self.handle_key(key, ctx.busy()),
            Event::Paste(text) if ctx.focused() => {
                for c in text.chars().filter(|c| !c.is_control()) {
                    self.insert(c);
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(input: &mut ChatInputComponent, text: &str, ctx: &ComponentContext) {
        for c in text.chars() {
            input.handle_event(&key(KeyCode::Char(c)), ctx);
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(InputCommand::parse("/detach"), InputCommand::Detach);
        assert_eq!(
            InputCommand::parse("/attach '/tmp/my notes.png'"),
            InputCommand::Attach(PathBuf::from("/tmp/my notes.png"))
        );
        assert_eq!(
            InputCommand::parse("  what is force? "),
            InputCommand::Send("what is force?".into())
        );
        assert_eq!(
            InputCommand::parse("/attach"),
            InputCommand::Send("/attach".into())
        );
    }

    #[test]
    fn edits_and_submits() {
        let ctx = ComponentContext::new(true);
        let mut input = ChatInputComponent::new();
        type_text(&mut input, "forse", &ctx);
        input.handle_event(&key(KeyCode::Left), &ctx);
        input.handle_event(&key(KeyCode::Backspace), &ctx);
        input.handle_event(&key(KeyCode::Char('c')), &ctx);
        assert_eq!(input.text(), "force");

        input.handle_event(&key(KeyCode::Enter), &ctx);
        assert_eq!(
            input.take_submission(),
            Some(InputCommand::Send("force".into()))
        );
        assert_eq!(input.take_submission(), None);
    }

    #[test]
    fn blank_enter_without_attachment_does_nothing() {
        let ctx = ComponentContext::new(true);
        let mut input = ChatInputComponent::new();
        input.handle_event(&key(KeyCode::Enter), &ctx);
        assert_eq!(input.take_submission(), None);

        input.set_attachment(Some("image/png".into()));
        input.handle_event(&key(KeyCode::Enter), &ctx);
        assert_eq!(input.take_submission(), Some(InputCommand::Send(String::new())));
    }

    #[test]
    fn busy_blocks_sending_but_not_typing() {
        let ctx = ComponentContext::new(true).with_busy(true);
        let mut input = ChatInputComponent::new();
        type_text(&mut input, "next", &ctx);
        input.handle_event(&key(KeyCode::Enter), &ctx);
        assert_eq!(input.take_submission(), None);
        assert_eq!(input.text(), "next");
    }

    #[test]
    fn sync_moves_cursor_to_end() {
        let ctx = ComponentContext::new(true);
        let mut input = ChatInputComponent::new();
        input.sync("Teacher, explain \"× 5\"");
        input.handle_event(&key(KeyCode::Char('!')), &ctx);
        assert_eq!(input.text(), "Teacher, explain \"× 5\"!");
    }

    #[test]
    fn unfocused_input_ignores_keys() {
        let mut input = ChatInputComponent::new();
        assert!(!input.handle_event(&key(KeyCode::Char('x')), &ComponentContext::default()));
        assert_eq!(input.text(), "");
    }
}
