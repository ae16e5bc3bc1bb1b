//! The study screen: routes input to components, runs tutor calls on worker
//! threads and folds their results back into the conversation.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use crossterm::event::{Event, KeyEvent, MouseButton, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::annotate::{HighlightTracker, bridge_selection};
use crate::api::{ApiError, TutorService};
use crate::attachments;
use crate::audio::{NarrationOutcome, Narrator, SpeechClip};
use crate::chat::{Conversation, MessageId, ModelTurn, TurnRequest, run_turn};
use crate::clipboard;
use crate::components::{
    ChatInputComponent, Component, ComponentContext, DebugLogComponent, HelpOverlayComponent,
    InputCommand, StatusBar, TranscriptComponent, TranscriptEvent,
};
use crate::config::Config;
use crate::constants::ANNOTATION_HINT;
use crate::event_loop::ControlFlow;
use crate::keybindings::{Action, KeyBindings};
use crate::state::AppState;
use crate::theme;
use crate::ui::UiFrame;

const TITLE: &str = " Chalkmark ";
const INPUT_HEIGHT: u16 = 3;

/// Results reported by worker threads.
#[derive(Debug)]
enum WorkerResult {
    Turn(Result<ModelTurn, ApiError>),
    Speech {
        message: MessageId,
        result: Result<Vec<u8>, ApiError>,
    },
}

pub struct App {
    conversation: Conversation,
    service: Arc<dyn TutorService>,
    state: AppState,
    bindings: KeyBindings,
    transcript: TranscriptComponent,
    input: ChatInputComponent,
    help: HelpOverlayComponent,
    debug_log: DebugLogComponent,
    status: StatusBar,
    narrator: Narrator,
    narrating: Option<MessageId>,
    tx: Sender<WorkerResult>,
    rx: Receiver<WorkerResult>,
    annotate_button: Rect,
    debug_area: Rect,
}

impl App {
    pub fn new(
        config: &Config,
        service: Arc<dyn TutorService>,
        debug_log: DebugLogComponent,
    ) -> Self {
        let bindings = KeyBindings::default();
        let (tx, rx) = mpsc::channel();
        let mut status = StatusBar::new();
        status.set_hints(hints(&bindings));

        let mut app = Self {
            conversation: Conversation::with_history_limit(config.history_limit),
            service,
            state: AppState::new(),
            help: HelpOverlayComponent::new(&bindings),
            bindings,
            transcript: TranscriptComponent::new(
                config.cell,
                config.min_stroke,
                config.overlap,
                HighlightTracker::new(config.highlight),
            ),
            input: ChatInputComponent::new(),
            debug_log,
            status,
            narrator: Narrator::new(config.save_audio.clone()),
            narrating: None,
            tx,
            rx,
            annotate_button: Rect::default(),
            debug_area: Rect::default(),
        };
        if let Some(path) = &config.image {
            app.attach(path);
        }
        app
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn status(&self) -> &StatusBar {
        &self.status
    }

    pub fn help_visible(&self) -> bool {
        self.help.visible()
    }

    pub fn mouse_capture_enabled(&self) -> bool {
        self.state.mouse_capture_enabled()
    }

    pub fn take_mouse_capture_change(&mut self) -> Option<bool> {
        self.state.take_mouse_capture_change()
    }

    /// Per-iteration housekeeping: worker results, highlight expiry, notices.
    pub fn tick(&mut self, now: Instant) {
        self.drain_workers();
        self.transcript.tick(now);
        self.status.expire(now);
    }

    pub fn handle_event(&mut self, event: &Event) -> ControlFlow {
        if let Event::Key(key) = event {
            if self.bindings.matches(Action::Quit, key) {
                return ControlFlow::Quit;
            }
        }
        if self.help.visible() {
            self.help.handle_event(event, &ComponentContext::new(true));
            return ControlFlow::Continue;
        }
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Paste(_) => self.forward_to_input(event),
            Event::Mouse(_) => self.handle_mouse(event),
            _ => {}
        }
        ControlFlow::Continue
    }

    fn handle_key(&mut self, key: &KeyEvent) {
        let action = self.bindings.action_for_key(key);
        if self.state.debug_log_visible() && action.is_some_and(is_scroll) {
            self.debug_log
                .handle_event(&Event::Key(*key), &ComponentContext::new(true));
            return;
        }
        match action {
            Some(Action::ToggleHelp) => self.help.toggle(),
            Some(Action::ToggleLog) => self.state.toggle_debug_log_visible(),
            Some(Action::ToggleMouse) => self.toggle_mouse(),
            Some(Action::ToggleAnnotate) => self.toggle_annotation(),
            Some(Action::ExitAnnotate) => {
                if self.conversation.annotation_mode() {
                    self.conversation.set_annotation_mode(false);
                } else {
                    self.conversation.dismiss_error();
                }
            }
            Some(Action::ToggleLogic) => self.toggle_latest_logic(),
            Some(Action::Narrate) => match self.conversation.latest_reply() {
                Some((id, _)) => self.narrate(id, false),
                None => self.status.notify("Nothing to read yet"),
            },
            Some(Action::CopyAnswer) => self.copy_latest(),
            Some(action) if is_scroll(action) => self.scroll(action),
            _ => self.forward_to_input(&Event::Key(*key)),
        }
    }

    fn handle_mouse(&mut self, event: &Event) {
        let Event::Mouse(mouse) = event else {
            return;
        };
        let inside = |rect: Rect| {
            mouse.column >= rect.x
                && mouse.row >= rect.y
                && mouse.column < rect.x.saturating_add(rect.width)
                && mouse.row < rect.y.saturating_add(rect.height)
        };
        if self.state.debug_log_visible() && inside(self.debug_area) {
            self.debug_log.handle_event(event, &ComponentContext::new(true));
            return;
        }
        if mouse.kind == MouseEventKind::Down(MouseButton::Left) && inside(self.annotate_button) {
            self.toggle_annotation();
            return;
        }
        let ctx = self.transcript_context();
        self.transcript.handle_event(event, &ctx);
        for transcript_event in self.transcript.take_events() {
            match transcript_event {
                TranscriptEvent::Selection(text) => {
                    if bridge_selection(&text, &mut self.conversation) {
                        self.input.sync(self.conversation.pending_input());
                        self.status.notify("Question ready. Edit it or press Enter to ask.");
                    }
                }
                TranscriptEvent::Narrate { id, concept } => self.narrate(id, concept),
            }
        }
    }

    fn forward_to_input(&mut self, event: &Event) {
        let ctx = self.input_context();
        self.input.sync(self.conversation.pending_input());
        if self.input.handle_event(event, &ctx) {
            self.conversation.set_pending_input(self.input.text());
        }
        if let Some(command) = self.input.take_submission() {
            self.run_command(command);
        }
    }

    fn run_command(&mut self, command: InputCommand) {
        match command {
            InputCommand::Send(text) => self.send(&text),
            InputCommand::Attach(path) => {
                if self.attach(&path) {
                    self.conversation.set_pending_input("");
                }
            }
            InputCommand::Detach => {
                self.conversation.set_pending_input("");
                match self.conversation.detach_image() {
                    Some(_) => self.status.notify("Image removed"),
                    None => self.status.notify("No image attached"),
                }
            }
        }
    }

    fn attach(&mut self, path: &Path) -> bool {
        match attachments::load_image(path) {
            Ok(image) => {
                tracing::info!(path = %path.display(), mime = %image.mime_type, "image attached");
                self.conversation.attach_image(image);
                self.status.notify(format!("Attached {}", path.display()));
                true
            }
            Err(err) => {
                tracing::warn!(%err, "attachment rejected");
                self.status.notify(err.to_string());
                false
            }
        }
    }

    fn send(&mut self, text: &str) {
        let image = self.conversation.pending_image().cloned();
        let Some(request) = self.conversation.begin_turn(text, image) else {
            return;
        };
        self.conversation.detach_image();
        self.transcript.scroll_mut().follow();
        self.spawn_turn(request);
    }

    fn spawn_turn(&mut self, request: TurnRequest) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("study-turn".into())
            .spawn(move || {
                let result = run_turn(&request, service.as_ref());
                let _ = tx.send(WorkerResult::Turn(result));
            });
        if let Err(err) = spawned {
            self.conversation
                .complete_turn(Err(ApiError::Transport(err.to_string())));
        }
    }

    /// Read the answer of `id` aloud, or its board work when `concept` is set.
    /// Asking while something plays stops it instead.
    fn narrate(&mut self, id: MessageId, concept: bool) {
        if self.narrator.stop() {
            self.status.notify("Narration stopped");
            return;
        }
        if self.narrating.is_some() {
            self.status.notify("Narration is on its way");
            return;
        }
        let Some(text) = self
            .conversation
            .messages()
            .iter()
            .find(|message| message.id == id)
            .and_then(|message| message.reply())
            .and_then(|reply| {
                if concept {
                    reply.concept()
                } else {
                    Some(reply.answer())
                }
            })
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
        else {
            self.status.notify("Nothing to read yet");
            return;
        };

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("narration".into())
            .spawn(move || {
                let result = service.generate_speech(&text);
                let _ = tx.send(WorkerResult::Speech {
                    message: id,
                    result,
                });
            });
        match spawned {
            Ok(_) => {
                self.narrating = Some(id);
                self.status.notify("Preparing narration...");
            }
            Err(err) => {
                tracing::warn!(%err, "cannot start narration worker");
                self.status.notify("Narration failed");
            }
        }
    }

    fn drain_workers(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                WorkerResult::Turn(result) => {
                    if self.conversation.complete_turn(result).is_some() {
                        self.transcript.scroll_mut().follow();
                    }
                }
                WorkerResult::Speech { message, result } => {
                    self.narrating = None;
                    match result {
                        Ok(bytes) => self.play(message, &bytes),
                        Err(err) => {
                            tracing::warn!(%err, message = message.0, "speech unavailable");
                            self.status.notify("Narration failed. Please try again.");
                        }
                    }
                }
            }
        }
    }

    fn play(&mut self, message: MessageId, bytes: &[u8]) {
        let clip = SpeechClip::from_speech(bytes);
        match self.narrator.narrate(&clip, &message.0.to_string()) {
            Ok(NarrationOutcome::Playing { .. }) => self.status.notify("Playing narration"),
            Ok(NarrationOutcome::Saved(path)) => self.status.notify(format!(
                "No audio device; narration saved to {}",
                path.display()
            )),
            Err(err) => {
                tracing::warn!(%err, "narration playback failed");
                self.status.notify(format!("Narration failed: {err}"));
            }
        }
    }

    fn copy_latest(&mut self) {
        let Some((_, reply)) = self.conversation.latest_reply() else {
            return;
        };
        let text = clipboard::reply_text(reply.answer(), reply.concept());
        match clipboard::set(&text) {
            Ok(()) => self.status.notify("Answer copied"),
            Err(err) => {
                tracing::warn!(%err, "clipboard unavailable");
                self.status.notify(format!("Copy failed: {err}"));
            }
        }
    }

    fn toggle_latest_logic(&mut self) {
        match self.conversation.latest_reply() {
            Some((id, reply)) if reply.concept().is_some() => {
                self.transcript.toggle_logic(id);
            }
            _ => self.status.notify("The latest answer has no board work"),
        }
    }

    fn toggle_annotation(&mut self) {
        let active = self.conversation.toggle_annotation_mode();
        // Strokes need mouse events.
        if active && !self.state.mouse_capture_enabled() {
            self.state.set_mouse_capture_enabled(true);
        }
    }

    fn toggle_mouse(&mut self) {
        self.state.toggle_mouse_capture();
        if self.state.mouse_capture_enabled() {
            self.status.notify("Mouse captured");
        } else {
            self.conversation.set_annotation_mode(false);
            self.status
                .notify("Mouse released for text selection (F2 to capture again)");
        }
    }

    fn scroll(&mut self, action: Action) {
        let scroll = self.transcript.scroll_mut();
        let page = scroll.view().max(1) as isize;
        match action {
            Action::ScrollUp => scroll.bump(-1),
            Action::ScrollDown => scroll.bump(1),
            Action::ScrollPageUp => scroll.bump(-page),
            Action::ScrollPageDown => scroll.bump(page),
            Action::ScrollHome => scroll.set_offset(0),
            Action::ScrollEnd => scroll.follow(),
            _ => {}
        }
    }

    fn transcript_context(&self) -> ComponentContext {
        ComponentContext::new(false)
            .with_annotating(self.conversation.annotation_mode())
            .with_busy(self.conversation.is_thinking())
    }

    fn input_context(&self) -> ComponentContext {
        ComponentContext::new(!self.help.visible())
            .with_annotating(self.conversation.annotation_mode())
            .with_busy(self.conversation.is_thinking())
    }

    pub fn render(&mut self, frame: &mut UiFrame<'_>) {
        let area = frame.area();
        if area.width == 0 || area.height == 0 {
            return;
        }
        let annotating = self.conversation.annotation_mode();
        let error = self.conversation.error().map(str::to_string);

        let mut constraints = vec![Constraint::Length(1), Constraint::Min(1)];
        if annotating {
            constraints.push(Constraint::Length(1));
        }
        if error.is_some() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(INPUT_HEIGHT));
        constraints.push(Constraint::Length(1));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        let mut next = 0;
        let mut take = || {
            let rect = chunks.get(next).copied().unwrap_or_default();
            next += 1;
            rect
        };
        let title_area = take();
        let transcript_area = take();
        let hint_area = if annotating { take() } else { Rect::default() };
        let error_area = if error.is_some() { take() } else { Rect::default() };
        let input_area = take();
        let status_area = take();

        self.render_title(frame, title_area, annotating);

        self.transcript.sync(self.conversation.messages());
        let ctx = self.transcript_context();
        self.transcript.render(frame, transcript_area, &ctx);

        if annotating {
            frame.patch_style(hint_area, theme::hint_banner());
            let x = hint_area.x
                + hint_area
                    .width
                    .saturating_sub(ANNOTATION_HINT.chars().count() as u16)
                    / 2;
            frame.set_string(hint_area, x, hint_area.y, ANNOTATION_HINT, theme::hint_banner());
        }
        if let Some(error) = &error {
            frame.patch_style(error_area, theme::error_banner());
            let text = format!(" {error}  (Esc to dismiss)");
            frame.set_string(error_area, error_area.x, error_area.y, &text, theme::error_banner());
        }

        self.input.sync(self.conversation.pending_input());
        self.input.set_attachment(
            self.conversation
                .pending_image()
                .map(|image| image.mime_type.clone()),
        );
        let ctx = self.input_context();
        self.input.render(frame, input_area, &ctx);
        self.status.render(frame, status_area, &ctx);

        if self.state.debug_log_visible() {
            let height = (area.height / 2).max(3).min(area.height);
            self.debug_area = Rect::new(area.x, area.y + area.height - height, area.width, height);
            self.debug_log
                .render(frame, self.debug_area, &ComponentContext::new(true));
        } else {
            self.debug_area = Rect::default();
        }
        self.help.render(frame, area, &ComponentContext::new(true));
    }

    fn render_title(&mut self, frame: &mut UiFrame<'_>, area: Rect, annotating: bool) {
        frame.patch_style(area, theme::title_style());
        frame.set_string(area, area.x, area.y, TITLE, theme::title_style());
        let label = if annotating {
            "[x Stop circling]"
        } else {
            "[o Circle to ask]"
        };
        let width = label.chars().count() as u16;
        if area.width <= width + TITLE.len() as u16 {
            self.annotate_button = Rect::default();
            return;
        }
        self.annotate_button = Rect::new(area.x + area.width - width - 1, area.y, width, 1);
        frame.set_string(
            area,
            self.annotate_button.x,
            area.y,
            label,
            theme::title_style(),
        );
    }
}

fn is_scroll(action: Action) -> bool {
    matches!(
        action,
        Action::ScrollUp
            | Action::ScrollDown
            | Action::ScrollPageUp
            | Action::ScrollPageDown
            | Action::ScrollHome
            | Action::ScrollEnd
    )
}

fn hints(bindings: &KeyBindings) -> String {
    let first = |action| {
        bindings
            .combos_for(action)
            .into_iter()
            .next()
            .unwrap_or_default()
    };
    format!(
        "{} circle  {} help  {} quit",
        first(Action::ToggleAnnotate),
        first(Action::ToggleHelp),
        first(Action::Quit)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::chat::{HistoryTurn, ImagePayload};
    use crate::config::Cli;
    use crate::notes::TutorResponse;
    use clap::Parser;
    use crossterm::event::{KeyCode, KeyModifiers, MouseEvent};
    use ratatui::buffer::Buffer;

    const NOTES: &str = r#"{"finalAnswer":"Force\n= Mass × Acceleration\n= 50 N","conceptContent":"Push harder, speed up faster.","hasConcept":true}"#;

    #[derive(Default)]
    struct FakeTutor {
        prompts: Mutex<Vec<String>>,
        spoken: Mutex<Vec<String>>,
    }

    impl TutorService for FakeTutor {
        fn generate_study_response(
            &self,
            prompt: &str,
            _history: &[HistoryTurn],
            _image: Option<&ImagePayload>,
        ) -> Result<TutorResponse, ApiError> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            Ok(TutorResponse::ingest(NOTES))
        }

        fn generate_speech(&self, text: &str) -> Result<Vec<u8>, ApiError> {
            if let Ok(mut spoken) = self.spoken.lock() {
                spoken.push(text.to_string());
            }
            Err(ApiError::Status(500))
        }

        fn generate_visual_aid(&self, _prompt: &str) -> Result<ImagePayload, ApiError> {
            Err(ApiError::MissingContent("image"))
        }
    }

    fn app(tutor: Arc<FakeTutor>) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["chalkmark", "--save-audio", dir.path().to_str().unwrap()]);
        let config = Config::resolve(&cli, |_| None).unwrap();
        let (debug_log, _handle) = DebugLogComponent::new(100);
        (App::new(&config, tutor, debug_log), dir)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_event(&key(KeyCode::Char(c)));
        }
    }

    fn draw(app: &mut App) -> Buffer {
        let area = Rect::new(0, 0, 60, 24);
        let mut buffer = Buffer::empty(area);
        app.render(&mut UiFrame::from_parts(area, &mut buffer));
        buffer
    }

    fn row_string(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol().to_string())
            .collect()
    }

    fn find_row(buffer: &Buffer, needle: &str) -> Option<u16> {
        (0..buffer.area.height).find(|&y| row_string(buffer, y).contains(needle))
    }

    fn wait_for_speech(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.narrating.is_some() && Instant::now() < deadline {
            app.tick(Instant::now());
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn wait_for_answer(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.conversation().is_thinking() && Instant::now() < deadline {
            app.tick(Instant::now());
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!app.conversation().is_thinking());
    }

    fn ask(app: &mut App, question: &str) {
        type_text(app, question);
        app.handle_event(&key(KeyCode::Enter));
        wait_for_answer(app);
    }

    #[test]
    fn typed_question_is_answered_on_a_worker() {
        let tutor = Arc::new(FakeTutor::default());
        let (mut app, _dir) = app(tutor.clone());
        type_text(&mut app, "what is force?");
        assert_eq!(app.conversation().pending_input(), "what is force?");
        app.handle_event(&key(KeyCode::Enter));
        assert!(app.conversation().is_thinking());
        assert_eq!(app.conversation().pending_input(), "");

        wait_for_answer(&mut app);
        assert_eq!(app.conversation().messages().len(), 3);
        assert_eq!(*tutor.prompts.lock().unwrap(), vec!["what is force?".to_string()]);
        let buffer = draw(&mut app);
        assert!(find_row(&buffer, "= Mass × Acceleration").is_some());
    }

    #[test]
    fn circling_fills_the_input_without_sending() {
        let tutor = Arc::new(FakeTutor::default());
        let (mut app, _dir) = app(tutor.clone());
        ask(&mut app, "what is force?");

        app.handle_event(&ctrl('p'));
        assert!(app.conversation().annotation_mode());
        let buffer = draw(&mut app);
        let force = find_row(&buffer, "Force").unwrap();
        let mass = find_row(&buffer, "= Mass × Acceleration").unwrap();
        assert_eq!(mass, force + 1);

        app.handle_event(&mouse(MouseEventKind::Down(MouseButton::Left), 1, force));
        app.handle_event(&mouse(MouseEventKind::Drag(MouseButton::Left), 8, mass));
        app.handle_event(&mouse(MouseEventKind::Up(MouseButton::Left), 8, mass));

        assert_eq!(
            app.conversation().pending_input(),
            "Teacher, can you explain this part specifically? \"Force = Mass × Acceleration\""
        );
        assert!(!app.conversation().annotation_mode());
        assert_eq!(tutor.prompts.lock().unwrap().len(), 1);
        assert!(!app.conversation().is_thinking());
    }

    #[test]
    fn quit_works_even_with_help_open() {
        let (mut app, _dir) = app(Arc::new(FakeTutor::default()));
        app.handle_event(&key(KeyCode::F(1)));
        assert!(app.help_visible());
        assert_eq!(app.handle_event(&key(KeyCode::Char('x'))), ControlFlow::Continue);
        assert_eq!(app.conversation().pending_input(), "");
        assert_eq!(app.handle_event(&ctrl('q')), ControlFlow::Quit);
    }

    #[test]
    fn escape_leaves_annotation_mode_then_dismisses_nothing() {
        let (mut app, _dir) = app(Arc::new(FakeTutor::default()));
        app.handle_event(&ctrl('p'));
        assert!(app.conversation().annotation_mode());
        app.handle_event(&key(KeyCode::Esc));
        assert!(!app.conversation().annotation_mode());
    }

    #[test]
    fn attach_reports_unreadable_files() {
        let (mut app, dir) = app(Arc::new(FakeTutor::default()));
        let missing = dir.path().join("missing.png");
        type_text(&mut app, &format!("/attach {}", missing.display()));
        app.handle_event(&key(KeyCode::Enter));
        assert!(app.conversation().pending_image().is_none());
        assert!(app.status().notice().unwrap().contains("missing.png"));

        let png = dir.path().join("board.png");
        std::fs::write(&png, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]).unwrap();
        app.handle_event(&ctrl('u'));
        type_text(&mut app, &format!("/attach {}", png.display()));
        app.handle_event(&key(KeyCode::Enter));
        assert_eq!(app.conversation().pending_image().unwrap().mime_type, "image/png");
        assert_eq!(app.conversation().pending_input(), "");

        type_text(&mut app, "/detach");
        app.handle_event(&key(KeyCode::Enter));
        assert!(app.conversation().pending_image().is_none());
    }

    #[test]
    fn failed_speech_is_a_status_notice() {
        let (mut app, _dir) = app(Arc::new(FakeTutor::default()));
        app.handle_event(&ctrl('s'));
        assert_eq!(app.status().notice(), Some("Preparing narration..."));
        wait_for_speech(&mut app);
        assert_eq!(app.status().notice(), Some("Narration failed. Please try again."));
        assert!(app.conversation().error().is_none());
    }

    #[test]
    fn logic_toggle_needs_board_work() {
        let (mut app, _dir) = app(Arc::new(FakeTutor::default()));
        app.handle_event(&ctrl('l'));
        assert_eq!(app.status().notice(), Some("The latest answer has no board work"));

        ask(&mut app, "what is force?");
        draw(&mut app);
        app.handle_event(&ctrl('l'));
        let buffer = draw(&mut app);
        assert!(find_row(&buffer, "Step-by-Step Board Work").is_some());
    }

    #[test]
    fn board_work_listen_reads_the_concept() {
        let tutor = Arc::new(FakeTutor::default());
        let (mut app, _dir) = app(Arc::clone(&tutor));
        ask(&mut app, "what is force?");
        draw(&mut app);
        app.handle_event(&ctrl('l'));
        let buffer = draw(&mut app);

        let label = "Step-by-Step Board Work ";
        let y = find_row(&buffer, label).unwrap();
        let row = row_string(&buffer, y);
        let start = row.find(label).unwrap();
        let column = row[..start].chars().count() + label.chars().count() + 1;
        app.handle_event(&mouse(MouseEventKind::Down(MouseButton::Left), column as u16, y));
        wait_for_speech(&mut app);

        let spoken = tutor.spoken.lock().unwrap();
        assert_eq!(spoken.as_slice(), ["Push harder, speed up faster."]);
    }
}
