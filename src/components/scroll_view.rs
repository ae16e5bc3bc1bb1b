use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEventKind};
use ratatui::prelude::Rect;
use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget};

use crate::ui::UiFrame;

const WHEEL_STEP: usize = 3;

/// Vertical scroll offset over `total` rows shown `view` rows at a time.
///
/// `follow_tail` keeps the view pinned to the bottom while new rows arrive,
/// until the user scrolls away from it.
#[derive(Debug, Clone)]
pub struct ScrollView {
    area: Rect,
    offset: usize,
    total: usize,
    view: usize,
    follow_tail: bool,
}

impl Default for ScrollView {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollView {
    pub fn new() -> Self {
        Self {
            area: Rect::default(),
            offset: 0,
            total: 0,
            view: 0,
            follow_tail: true,
        }
    }

    pub fn with_follow_tail(mut self, follow_tail: bool) -> Self {
        self.follow_tail = follow_tail;
        self
    }

    pub fn update(&mut self, area: Rect, total: usize) {
        self.area = area;
        self.total = total;
        self.view = area.height as usize;
        if self.follow_tail {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn view(&self) -> usize {
        self.view
    }

    pub fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.view)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.offset >= self.max_offset()
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
        self.follow_tail = self.is_at_bottom();
    }

    pub fn bump(&mut self, delta: isize) {
        let next = if delta.is_negative() {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta as usize)
        };
        self.set_offset(next);
    }

    /// Jump to the end and keep following it.
    pub fn follow(&mut self) {
        self.follow_tail = true;
        self.offset = self.max_offset();
    }

    pub fn handle_key_event(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers != KeyModifiers::NONE {
            return false;
        }
        let page = self.view.max(1) as isize;
        match key.code {
            KeyCode::Up => self.bump(-1),
            KeyCode::Down => self.bump(1),
            KeyCode::PageUp => self.bump(-page),
            KeyCode::PageDown => self.bump(page),
            KeyCode::Home => self.set_offset(0),
            KeyCode::End => self.follow(),
            _ => return false,
        }
        true
    }

    /// Mouse wheel over the scroll area.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let Event::Mouse(mouse) = event else {
            return false;
        };
        let inside = mouse.column >= self.area.x
            && mouse.column < self.area.x.saturating_add(self.area.width)
            && mouse.row >= self.area.y
            && mouse.row < self.area.y.saturating_add(self.area.height);
        if !inside {
            return false;
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.bump(-(WHEEL_STEP as isize));
                true
            }
            MouseEventKind::ScrollDown => {
                self.bump(WHEEL_STEP as isize);
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, frame: &mut UiFrame<'_>) {
        render_scrollbar(frame, self.area, self.total, self.view, self.offset);
    }
}

pub fn render_scrollbar(
    frame: &mut UiFrame<'_>,
    area: Rect,
    total: usize,
    view: usize,
    offset: usize,
) {
    if view == 0 || total <= view || area.width == 0 || area.height == 0 {
        return;
    }
    let max_offset = total.saturating_sub(view);
    let mut state = ScrollbarState::new(max_offset.saturating_add(1))
        .position(offset.min(max_offset))
        .viewport_content_length(view);
    let clipped = area.intersection(frame.area());
    if clipped.width == 0 || clipped.height == 0 {
        return;
    }
    Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(None)
        .end_symbol(None)
        .render(clipped, frame.buffer_mut(), &mut state);
}
