use crossterm::event::Event;
use ratatui::layout::Rect;

use crate::ui::UiFrame;

pub mod chat_input;
pub mod debug_log;
pub mod help_overlay;
pub mod scroll_view;
pub mod status_bar;
pub mod transcript;
pub mod visual_aid;

pub use chat_input::{ChatInputComponent, InputCommand};
pub use debug_log::DebugLogComponent;
pub use help_overlay::HelpOverlayComponent;
pub use scroll_view::ScrollView;
pub use status_bar::StatusBar;
pub use transcript::{TranscriptComponent, TranscriptEvent};
pub use visual_aid::VisualAidPreview;

pub use crate::component_context::ComponentContext;

pub trait Component {
    fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, ctx: &ComponentContext);

    fn handle_event(&mut self, _event: &Event, _ctx: &ComponentContext) -> bool {
        false
    }
}
