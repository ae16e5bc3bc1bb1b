//! Scrolling conversation view with circle-to-ask.
//!
//! Every render lays the conversation out as rows, places each message on
//! screen and rebuilds that message's line registry in pixel space. Strokes
//! drawn in annotation mode are routed to the overlay of the message they
//! started on and resolved against its registry when the button is released
//! or the pointer leaves the message.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crossterm::event::{Event, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::style::Style;

use crate::annotate::{
    AnnotatableElement, AnnotationOverlay, ElementId, HighlightTracker, OverlapPolicy,
};
use crate::chat::{ChatMessage, MessageId, MessagePart};
use crate::components::visual_aid::VisualAidPreview;
use crate::components::{Component, ComponentContext, ScrollView};
use crate::constants::{HIGHLIGHT_DURATION, MIN_STROKE_EXTENT};
use crate::geometry::{Bounds, CellMetrics, Point, cell_line};
use crate::notes::lines::{LineKind, split_lines, wrap};
use crate::theme;
use crate::ui::UiFrame;

const BOARD_WORK_LABEL: &str = "Step-by-Step Board Work";
const THINKING_TEXT: &str = "Teacher is writing...";

/// Things the screen has to act on after a transcript event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Text circled on a message, ready for the bridge.
    Selection(String),
    /// `[listen]` clicked on a message; `concept` selects the board work
    /// instead of the answer.
    Narrate { id: MessageId, concept: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Listen,
    ListenConcept,
    Logic,
}

#[derive(Debug)]
enum Preview {
    Pending,
    Ready(VisualAidPreview),
    Failed,
}

/// Per-message state that outlives a single frame.
#[derive(Debug)]
struct MessageView {
    overlay: AnnotationOverlay,
    logic_open: bool,
    preview: Preview,
}

#[derive(Debug, Clone)]
struct Row {
    message: Option<MessageId>,
    x: u16,
    text: String,
    style: Style,
    element: Option<ElementId>,
    tags: Vec<(u16, u16, TagKind)>,
}

impl Row {
    fn plain(message: Option<MessageId>, text: impl Into<String>, style: Style) -> Self {
        Self {
            message,
            x: 0,
            text: text.into(),
            style,
            element: None,
            tags: Vec::new(),
        }
    }

    fn blank(message: Option<MessageId>) -> Self {
        Self::plain(message, "", Style::default())
    }
}

/// Where a message landed on screen during the last render.
#[derive(Debug, Clone)]
struct Placed {
    id: MessageId,
    origin: Point,
    rect: Rect,
    registry: Vec<AnnotatableElement>,
    tags: Vec<(Rect, TagKind)>,
}

#[derive(Debug)]
pub struct TranscriptComponent {
    messages: Vec<ChatMessage>,
    views: HashMap<MessageId, MessageView>,
    highlights: HighlightTracker,
    cell: CellMetrics,
    min_extent: f32,
    policy: OverlapPolicy,
    annotating: bool,
    scroll: ScrollView,
    placed: Vec<Placed>,
    drag: Option<MessageId>,
    events: Vec<TranscriptEvent>,
    now: Instant,
}

impl Default for TranscriptComponent {
    fn default() -> Self {
        Self::new(
            CellMetrics::default(),
            MIN_STROKE_EXTENT,
            OverlapPolicy::default(),
            HighlightTracker::new(HIGHLIGHT_DURATION),
        )
    }
}

impl TranscriptComponent {
    pub fn new(
        cell: CellMetrics,
        min_extent: f32,
        policy: OverlapPolicy,
        highlights: HighlightTracker,
    ) -> Self {
        Self {
            messages: Vec::new(),
            views: HashMap::new(),
            highlights,
            cell,
            min_extent,
            policy,
            annotating: false,
            scroll: ScrollView::new(),
            placed: Vec::new(),
            drag: None,
            events: Vec::new(),
            now: Instant::now(),
        }
    }

    /// Adopt the conversation's messages. Messages are append-only, so a
    /// matching length and last id means nothing changed.
    pub fn sync(&mut self, messages: &[ChatMessage]) {
        let unchanged = self.messages.len() == messages.len()
            && self.messages.last().map(|m| m.id) == messages.last().map(|m| m.id);
        if unchanged {
            return;
        }
        let grew = messages.len() > self.messages.len();
        self.messages = messages.to_vec();

        let live: HashSet<MessageId> = self.messages.iter().map(|m| m.id).collect();
        let highlights = &mut self.highlights;
        self.views.retain(|id, _| {
            let keep = live.contains(id);
            if !keep {
                highlights.forget_message(id.0);
            }
            keep
        });
        if self.drag.is_some_and(|id| !live.contains(&id)) {
            self.drag = None;
        }
        if grew {
            self.scroll.follow();
        }
    }

    /// Arm or disarm every message overlay.
    pub fn set_annotation_mode(&mut self, active: bool) {
        if self.annotating == active {
            return;
        }
        self.annotating = active;
        for view in self.views.values_mut() {
            view.overlay.set_mode(active);
        }
        if !active {
            self.drag = None;
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.drag.is_some()
    }

    /// Flip the board-work section of `id`. Returns the new state.
    pub fn toggle_logic(&mut self, id: MessageId) -> bool {
        let view = self.view_mut(id);
        view.logic_open = !view.logic_open;
        view.logic_open
    }

    pub fn logic_open(&self, id: MessageId) -> bool {
        self.views.get(&id).is_some_and(|view| view.logic_open)
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollView {
        &mut self.scroll
    }

    pub fn highlights(&self) -> &HighlightTracker {
        &self.highlights
    }

    pub fn take_events(&mut self) -> Vec<TranscriptEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the highlight clock. Returns true when a highlight expired.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.now = now;
        self.highlights.sweep(now)
    }

    /// Annotatable elements registered for `id` during the last render.
    pub fn registry(&self, id: MessageId) -> Option<&[AnnotatableElement]> {
        self.placed
            .iter()
            .find(|placed| placed.id == id)
            .map(|placed| placed.registry.as_slice())
    }

    fn view_mut(&mut self, id: MessageId) -> &mut MessageView {
        let (min_extent, policy, annotating) = (self.min_extent, self.policy, self.annotating);
        self.views.entry(id).or_insert_with(|| {
            let mut overlay = AnnotationOverlay::new(min_extent, policy);
            overlay.set_mode(annotating);
            MessageView {
                overlay,
                logic_open: false,
                preview: Preview::Pending,
            }
        })
    }

    fn layout(&mut self, width: usize, busy: bool) -> Vec<Row> {
        let mut rows = Vec::new();
        let messages = std::mem::take(&mut self.messages);
        for message in &messages {
            if message.is_user() {
                layout_user(&mut rows, message, width);
            } else {
                self.layout_model(&mut rows, message, width);
            }
        }
        self.messages = messages;
        if busy {
            rows.push(Row::plain(None, THINKING_TEXT, theme::muted()));
        }
        rows
    }

    fn layout_model(&mut self, rows: &mut Vec<Row>, message: &ChatMessage, width: usize) {
        let id = message.id;
        let Some(reply) = message.reply() else {
            return;
        };
        let image = message.generated_image().cloned();
        let view = self.view_mut(id);

        let mut tag_row = Row::plain(Some(id), "", theme::tag());
        push_tag(&mut tag_row, "[listen]", TagKind::Listen);
        if reply.concept().is_some() {
            let label = if view.logic_open { "[- logic]" } else { "[+ logic]" };
            push_tag(&mut tag_row, label, TagKind::Logic);
        }
        rows.push(tag_row);

        let answer = split_lines(reply.answer());
        for line in &answer {
            push_note(rows, id, line.index, line.kind, &line.text, width);
        }

        if let (true, Some(concept)) = (view.logic_open, reply.concept()) {
            rows.push(Row::blank(Some(id)));
            let mut label = Row::plain(Some(id), BOARD_WORK_LABEL, theme::section_label());
            push_tag(&mut label, "[listen]", TagKind::ListenConcept);
            rows.push(label);
            for line in split_lines(concept) {
                push_note(rows, id, answer.len() + line.index, line.kind, &line.text, width);
            }
        }

        if let Some(image) = image {
            if matches!(view.preview, Preview::Pending) {
                view.preview = match VisualAidPreview::from_payload(&image) {
                    Ok(preview) => Preview::Ready(preview),
                    Err(err) => {
                        tracing::warn!(%err, message = id.0, "illustration preview failed");
                        Preview::Failed
                    }
                };
            }
            rows.push(Row::blank(Some(id)));
            match &mut view.preview {
                Preview::Ready(preview) => {
                    for line in preview.rows(width) {
                        rows.push(Row::plain(Some(id), line.clone(), theme::muted()));
                    }
                }
                _ => rows.push(Row::plain(
                    Some(id),
                    "[illustration unavailable]",
                    theme::muted(),
                )),
            }
        }
        rows.push(Row::blank(Some(id)));
    }

    fn place(&self, rows: &[Row], area: Rect, offset: usize) -> Vec<Placed> {
        let mut placed: Vec<Placed> = Vec::new();
        let cw = self.cell.width;
        let ch = self.cell.height;
        let bottom = offset + area.height as usize;
        let row_top = |i: usize| (area.y as f32 + i as f32 - offset as f32) * ch;

        let mut start = 0;
        while start < rows.len() {
            let Some(id) = rows[start].message else {
                start += 1;
                continue;
            };
            let mut end = start;
            while end < rows.len() && rows[end].message == Some(id) {
                end += 1;
            }

            let mut registry: Vec<AnnotatableElement> = Vec::new();
            let mut tags = Vec::new();
            for (i, row) in rows.iter().enumerate().take(end).skip(start) {
                if let Some(element) = row.element {
                    let left = (area.x + row.x) as f32 * cw;
                    let rect = Bounds::new(
                        left,
                        row_top(i),
                        left + row.text.chars().count() as f32 * cw,
                        row_top(i) + ch,
                    );
                    match registry.last_mut() {
                        Some(last) if last.id == element => {
                            last.rect.include(Point::new(rect.right, rect.bottom));
                            last.text.push(' ');
                            last.text.push_str(&row.text);
                        }
                        _ => registry.push(AnnotatableElement::new(
                            element,
                            rect,
                            row.text.clone(),
                        )),
                    }
                }
                if (offset..bottom).contains(&i) {
                    let y = area.y + (i - offset) as u16;
                    for (col, width, kind) in &row.tags {
                        tags.push((Rect::new(area.x + row.x + col, y, *width, 1), *kind));
                    }
                }
            }

            let first = start.max(offset);
            let last = end.min(bottom);
            let rect = if first < last {
                Rect::new(
                    area.x,
                    area.y + (first - offset) as u16,
                    area.width.saturating_sub(1),
                    (last - first) as u16,
                )
            } else {
                Rect::default()
            };
            placed.push(Placed {
                id,
                origin: Point::new(area.x as f32 * cw, row_top(start)),
                rect,
                registry,
                tags,
            });
            start = end;
        }
        placed
    }

    fn render_ink(&self, frame: &mut UiFrame<'_>, area: Rect) {
        let Some(id) = self.drag else {
            return;
        };
        let (Some(view), Some(placed)) = (
            self.views.get(&id),
            self.placed.iter().find(|placed| placed.id == id),
        ) else {
            return;
        };
        let cells: Vec<(u16, u16)> = view
            .overlay
            .ink()
            .iter()
            .filter_map(|sample| {
                self.cell.cell_at(sample.offset(placed.origin.x, placed.origin.y))
            })
            .collect();
        let mut trail = cells.first().copied().into_iter().collect::<Vec<_>>();
        for pair in cells.windows(2) {
            trail.extend(cell_line(pair[0], pair[1]).into_iter().skip(1));
        }
        for (x, y) in trail {
            if !rect_contains(area, x, y) {
                continue;
            }
            let blank = frame
                .buffer_mut()
                .cell((x, y))
                .is_none_or(|cell| cell.symbol().trim().is_empty());
            if blank {
                frame.set_symbol(x, y, "•", theme::ink());
            } else {
                frame.patch_style(Rect::new(x, y, 1, 1), theme::ink());
            }
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) -> bool {
        self.now = now;
        let point = self.cell.cell_center(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if self.annotating => {
                self.stroke_begin(mouse.column, mouse.row, point);
                true
            }
            MouseEventKind::Down(MouseButton::Left) => self.click_tag(mouse.column, mouse.row),
            MouseEventKind::Drag(MouseButton::Left) if self.drag.is_some() => {
                self.stroke_move(mouse.column, mouse.row, point, now);
                true
            }
            MouseEventKind::Up(MouseButton::Left) if self.drag.is_some() => {
                self.stroke_end(false, now);
                true
            }
            _ => false,
        }
    }

    fn stroke_begin(&mut self, column: u16, row: u16, point: Point) {
        let Some(placed) = self
            .placed
            .iter()
            .find(|placed| rect_contains(placed.rect, column, row))
        else {
            return;
        };
        let Some(view) = self.views.get_mut(&placed.id) else {
            return;
        };
        let surface = Point::new(point.x - placed.origin.x, point.y - placed.origin.y);
        if view.overlay.pointer_down(surface) {
            self.drag = Some(placed.id);
        }
    }

    fn stroke_move(&mut self, column: u16, row: u16, point: Point, now: Instant) {
        let Some(id) = self.drag else {
            return;
        };
        let inside = self
            .placed
            .iter()
            .find(|placed| placed.id == id)
            .filter(|placed| rect_contains(placed.rect, column, row))
            .map(|placed| placed.origin);
        match (inside, self.views.get_mut(&id)) {
            (Some(origin), Some(view)) => {
                view.overlay
                    .pointer_move(Point::new(point.x - origin.x, point.y - origin.y));
            }
            _ => self.stroke_end(true, now),
        }
    }

    fn stroke_end(&mut self, left_surface: bool, now: Instant) {
        let Some(id) = self.drag.take() else {
            return;
        };
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let placed = self.placed.iter().find(|placed| placed.id == id);
        let origin = placed.map(|placed| placed.origin).unwrap_or_default();
        let registry = placed.map(|placed| placed.registry.as_slice());
        let result = if left_surface {
            view.overlay
                .pointer_leave(origin, registry, &mut self.highlights, now)
        } else {
            view.overlay
                .pointer_up(origin, registry, &mut self.highlights, now)
        };
        if let Some(selection) = result {
            self.events.push(TranscriptEvent::Selection(selection.text()));
        }
    }

    fn click_tag(&mut self, column: u16, row: u16) -> bool {
        let hit = self.placed.iter().find_map(|placed| {
            placed
                .tags
                .iter()
                .find(|(rect, _)| rect_contains(*rect, column, row))
                .map(|(_, kind)| (placed.id, *kind))
        });
        match hit {
            Some((id, TagKind::Listen)) => {
                self.events.push(TranscriptEvent::Narrate { id, concept: false });
                true
            }
            Some((id, TagKind::ListenConcept)) => {
                self.events.push(TranscriptEvent::Narrate { id, concept: true });
                true
            }
            Some((id, TagKind::Logic)) => {
                self.toggle_logic(id);
                true
            }
            None => false,
        }
    }
}

fn rect_contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && y >= rect.y
        && x < rect.x.saturating_add(rect.width)
        && y < rect.y.saturating_add(rect.height)
}

fn push_tag(row: &mut Row, label: &str, kind: TagKind) {
    if !row.text.is_empty() {
        row.text.push(' ');
    }
    let col = row.text.chars().count() as u16;
    row.text.push_str(label);
    row.tags.push((col, label.chars().count() as u16, kind));
}

fn push_note(
    rows: &mut Vec<Row>,
    id: MessageId,
    line: usize,
    kind: LineKind,
    text: &str,
    width: usize,
) {
    if kind == LineKind::Blank {
        rows.push(Row::blank(Some(id)));
        return;
    }
    let style = match kind {
        LineKind::Math => theme::math(),
        LineKind::Heading => theme::heading(),
        LineKind::Bullet => theme::bullet(),
        _ => theme::notebook(),
    };
    let element = kind.is_annotatable().then(|| ElementId::new(id.0, line));
    for piece in wrap(text.trim_end(), width) {
        rows.push(Row {
            message: Some(id),
            x: 0,
            text: piece,
            style,
            element,
            tags: Vec::new(),
        });
    }
}

fn layout_user(rows: &mut Vec<Row>, message: &ChatMessage, width: usize) {
    let bubble = (width * 3 / 4).max(12).min(width);
    let inner = bubble.saturating_sub(2).max(1);
    let mut push = |text: &str, style: Style| {
        let padded = format!(" {text} ");
        let len = padded.chars().count().min(width);
        rows.push(Row {
            x: width.saturating_sub(len) as u16,
            ..Row::plain(Some(message.id), padded, style)
        });
    };
    for part in &message.parts {
        match part {
            MessagePart::Text(text) => {
                for line in text.split('\n') {
                    for piece in wrap(line, inner) {
                        push(&piece, theme::user_bubble());
                    }
                }
            }
            MessagePart::InlineImage(image) => {
                push(&format!("[image attached: {}]", image.mime_type), theme::user_bubble());
            }
            _ => {}
        }
    }
    let stamp = message.timestamp.format("%H:%M").to_string();
    push(&stamp, theme::muted());
    rows.push(Row::blank(Some(message.id)));
}

impl Component for TranscriptComponent {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext) {
        self.set_annotation_mode(ctx.annotating());
        if area.width < 4 || area.height == 0 {
            self.placed.clear();
            return;
        }
        let width = area.width.saturating_sub(1) as usize;
        let rows = self.layout(width, ctx.busy());
        self.scroll.update(area, rows.len());
        let offset = self.scroll.offset();
        self.placed = self.place(&rows, area, offset);

        let text_area = Rect {
            width: area.width.saturating_sub(1),
            ..area
        };
        for (i, row) in rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(area.height as usize)
        {
            let y = area.y + (i - offset) as u16;
            let x = area.x + row.x;
            let lit = row
                .element
                .is_some_and(|id| self.highlights.is_lit(&id, self.now));
            let style = if lit {
                row.style.patch(theme::highlight())
            } else {
                row.style
            };
            frame.set_string(text_area, x, y, &row.text, style);
        }
        self.render_ink(frame, text_area);
        self.scroll.render(frame);
    }

    fn handle_event(&mut self, event: &Event, ctx: &ComponentContext) -> bool {
        self.set_annotation_mode(ctx.annotating());
        let Event::Mouse(mouse) = event else {
            return false;
        };
        if self.handle_mouse(mouse, Instant::now()) {
            return true;
        }
        self.scroll.handle_event(event)
    }
}
