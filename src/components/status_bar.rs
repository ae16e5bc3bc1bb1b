use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::style::Style;

use crate::components::{Component, ComponentContext};
use crate::theme;
use crate::ui::{UiFrame, truncate_to_width};

const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Bottom bar: transient notice (or state) on the left, key hints on the right.
pub struct StatusBar {
    notice: Option<(String, Instant)>,
    hints: String,
    style: Style,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            notice: None,
            hints: String::new(),
            style: theme::status_bar(),
        }
    }

    /// Show `message` for a few seconds.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some((message.into(), Instant::now()));
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    pub fn set_hints<T: Into<String>>(&mut self, value: T) {
        self.hints = value.into();
    }

    /// Drop an expired notice. Returns whether one was dropped.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.notice {
            Some((_, at)) if now.duration_since(*at) >= NOTICE_TTL => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }

    fn left_text(&self, ctx: &ComponentContext) -> String {
        if let Some(notice) = self.notice() {
            return notice.to_string();
        }
        if ctx.busy() {
            "Teacher is writing...".to_string()
        } else if ctx.annotating() {
            "Annotating: drag to circle, Esc to stop".to_string()
        } else {
            "Ready".to_string()
        }
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for StatusBar {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let area = Rect { height: 1, ..area };
        frame.patch_style(area, self.style);
        let width = area.width as usize;

        let left = truncate_to_width(&format!(" {}", self.left_text(ctx)), width);
        let left_width = left.chars().count();
        frame.set_string(area, area.x, area.y, &left, self.style);

        if !self.hints.is_empty() {
            let right = format!("{} ", self.hints);
            let right_width = right.chars().count();
            if left_width + right_width < width {
                let start_x = area.x.saturating_add((width - right_width) as u16);
                frame.set_string(area, start_x, area.y, &right, self.style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::buffer::Buffer;

    fn row(buf: &Buffer, width: u16) -> String {
        (0..width).map(|x| buf.cell((x, 0)).unwrap().symbol()).collect()
    }

    #[test]
    fn shows_state_and_hints() {
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        let mut bar = StatusBar::new();
        bar.set_hints("F1 help");
        let ctx = ComponentContext::default().with_busy(true);
        bar.render(&mut UiFrame::from_parts(area, &mut buf), area, &ctx);
        let text = row(&buf, 40);
        assert!(text.starts_with(" Teacher is writing..."));
        assert!(text.ends_with("F1 help "));
    }

    #[test]
    fn notice_wins_until_it_expires() {
        let mut bar = StatusBar::new();
        bar.notify("Copied answer");
        assert_eq!(bar.left_text(&ComponentContext::default()), "Copied answer");
        assert!(!bar.expire(Instant::now()));
        assert!(bar.expire(Instant::now() + NOTICE_TTL));
        assert_eq!(bar.left_text(&ComponentContext::default()), "Ready");
    }
}
