//! Shared component rendering context
//!
//! `ComponentContext` carries screen state that components need while
//! rendering and handling events, so the component trait stays stable.

/// Context passed to `Component` trait methods.
///
/// - `focused`: whether the component receives keyboard input.
/// - `annotating`: whether circle-to-ask mode is active.
/// - `busy`: whether a study request is in flight.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentContext {
    focused: bool,
    annotating: bool,
    busy: bool,
}

impl ComponentContext {
    pub const fn new(focused: bool) -> Self {
        Self {
            focused,
            annotating: false,
            busy: false,
        }
    }

    pub const fn focused(&self) -> bool {
        self.focused
    }

    pub const fn annotating(&self) -> bool {
        self.annotating
    }

    pub const fn busy(&self) -> bool {
        self.busy
    }

    pub const fn with_focus(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub const fn with_annotating(mut self, annotating: bool) -> Self {
        self.annotating = annotating;
        self
    }

    pub const fn with_busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }
}
