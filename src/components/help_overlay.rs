use crossterm::event::{Event, KeyCode};
use pulldown_cmark::{Event as MdEvent, Options, Parser, Tag, TagEnd};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::components::scroll_view::ScrollView;
use crate::components::{Component, ComponentContext};
use crate::keybindings::KeyBindings;
use crate::theme;
use crate::ui::UiFrame;

const HELP_MD: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/help.md"));
const MAX_WIDTH: u16 = 76;
const MAX_HEIGHT: u16 = 30;

/// Render markdown into styled lines. Covers what the help page uses:
/// headings, paragraphs, lists, strong/emphasis and inline code.
pub fn markdown_lines(raw: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut depth = 0usize;
    let mut bold = 0usize;
    let mut italic = 0usize;

    let flush = |lines: &mut Vec<Line<'static>>, current: &mut Vec<Span<'static>>| {
        if !current.is_empty() {
            lines.push(Line::from(std::mem::take(current)));
        }
    };

    for event in Parser::new_ext(raw, Options::empty()) {
        match event {
            MdEvent::Start(Tag::Heading { .. }) => bold += 1,
            MdEvent::End(TagEnd::Heading(_)) => {
                bold = bold.saturating_sub(1);
                flush(&mut lines, &mut current);
                lines.push(Line::default());
            }
            MdEvent::Start(Tag::Strong) => bold += 1,
            MdEvent::End(TagEnd::Strong) => bold = bold.saturating_sub(1),
            MdEvent::Start(Tag::Emphasis) => italic += 1,
            MdEvent::End(TagEnd::Emphasis) => italic = italic.saturating_sub(1),
            MdEvent::Start(Tag::List(_)) => depth += 1,
            MdEvent::End(TagEnd::List(_)) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    lines.push(Line::default());
                }
            }
            MdEvent::Start(Tag::Item) => {
                flush(&mut lines, &mut current);
                current.push(Span::raw(format!("{}• ", "  ".repeat(depth.saturating_sub(1)))));
            }
            MdEvent::End(TagEnd::Item) => flush(&mut lines, &mut current),
            MdEvent::End(TagEnd::Paragraph) => {
                flush(&mut lines, &mut current);
                if depth == 0 {
                    lines.push(Line::default());
                }
            }
            MdEvent::Text(text) => {
                let mut style = Style::default();
                if bold > 0 {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if italic > 0 {
                    style = style.add_modifier(Modifier::ITALIC);
                }
                current.push(Span::styled(text.into_string(), style));
            }
            MdEvent::Code(code) => current.push(Span::styled(code.into_string(), theme::tag())),
            MdEvent::SoftBreak => current.push(Span::raw(" ")),
            MdEvent::HardBreak => flush(&mut lines, &mut current),
            _ => {}
        }
    }
    flush(&mut lines, &mut current);
    while lines.last().is_some_and(|line| line.spans.is_empty()) {
        lines.pop();
    }
    lines
}

fn keys_markdown(bindings: &KeyBindings) -> String {
    bindings
        .help_entries()
        .into_iter()
        .map(|(action, combos)| format!("- **{}**: {}", combos.join(" / "), action))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn help_markdown(bindings: &KeyBindings) -> String {
    HELP_MD
        .replace("%PACKAGE%", env!("CARGO_PKG_NAME"))
        .replace("%VERSION%", env!("CARGO_PKG_VERSION"))
        .replace("%REPOSITORY%", env!("CARGO_PKG_REPOSITORY"))
        .replace("%KEYS%", &keys_markdown(bindings))
}

/// Centered help dialog opened with F1.
#[derive(Debug)]
pub struct HelpOverlayComponent {
    visible: bool,
    lines: Vec<Line<'static>>,
    scroll: ScrollView,
}

impl HelpOverlayComponent {
    pub fn new(bindings: &KeyBindings) -> Self {
        Self {
            visible: false,
            lines: markdown_lines(&help_markdown(bindings)),
            scroll: ScrollView::new().with_follow_tail(false),
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            self.scroll = ScrollView::new().with_follow_tail(false);
        }
    }

    pub fn toggle(&mut self) {
        self.set_visible(!self.visible);
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn dialog_rect(area: Rect) -> Rect {
        let width = area.width.saturating_sub(4).min(MAX_WIDTH);
        let height = area.height.saturating_sub(2).min(MAX_HEIGHT);
        Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        }
    }
}

impl Component for HelpOverlayComponent {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, _ctx: &ComponentContext) {
        if !self.visible || area.width < 10 || area.height < 5 {
            return;
        }
        let rect = Self::dialog_rect(area);
        frame.render_widget(Clear, rect);
        let block = Block::default()
            .title(" Help (Esc to close) ")
            .borders(Borders::ALL)
            .style(theme::dialog());
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        // Wrapped height is unknown up front; the raw line count is close
        // enough for scrolling a short page.
        let content = Rect {
            width: inner.width.saturating_sub(1),
            ..inner
        };
        self.scroll.update(inner, self.lines.len());
        let top = self.scroll.offset().min(u16::MAX as usize) as u16;
        let paragraph = Paragraph::new(Text::from(self.lines.clone()))
            .wrap(Wrap { trim: false })
            .scroll((top, 0));
        frame.render_widget(paragraph, content);
        self.scroll.render(frame);
    }

    fn handle_event(&mut self, event: &Event, _ctx: &ComponentContext) -> bool {
        if !self.visible {
            return false;
        }
        match event {
            Event::Key(key) => match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::F(1) => {
                    self.visible = false;
                    true
                }
                _ => {
                    self.scroll.handle_key_event(key);
                    // Modal: swallow everything else.
                    true
                }
            },
            Event::Mouse(_) => {
                self.scroll.handle_event(event);
                true
            }
            _ => false,
        }
    }
}
