use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};

/// Smooths over differences in how terminals report keys.
///
/// - Release events are dropped; Windows consoles also repeat and double
///   report Esc, which would toggle annotation mode twice.
/// - Ctrl+letter arrives as an upper-case char with SHIFT on some terminals;
///   it is folded to the lower-case, shift-free form the bindings use.
#[derive(Debug, Default)]
pub struct KeyboardNormalizer {
    esc_down: bool,
}

impl KeyboardNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, evt: Event) -> Option<Event> {
        let Event::Key(mut key) = evt else {
            return Some(evt);
        };
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && let KeyCode::Char(c) = key.code
            && c.is_ascii_uppercase()
        {
            key.code = KeyCode::Char(c.to_ascii_lowercase());
            key.modifiers.remove(KeyModifiers::SHIFT);
        }
        if cfg!(windows) {
            match key.kind {
                KeyEventKind::Release => {
                    if key.code == KeyCode::Esc {
                        self.esc_down = false;
                    }
                    return None;
                }
                KeyEventKind::Repeat => return None,
                KeyEventKind::Press => {}
            }
            if key.code == KeyCode::Esc {
                if self.esc_down {
                    return None;
                }
                self.esc_down = true;
            } else {
                self.esc_down = false;
            }
        } else if key.kind == KeyEventKind::Release {
            return None;
        }
        Some(Event::Key(key))
    }
}
