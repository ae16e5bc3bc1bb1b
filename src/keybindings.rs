use std::collections::HashMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Quit,
    Send,
    ToggleAnnotate,
    ExitAnnotate,
    ToggleLogic,
    Narrate,
    CopyAnswer,
    ToggleHelp,
    ToggleLog,
    ToggleMouse,
    // Transcript scrolling
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollHome,
    ScrollEnd,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Quit => "Quit",
            Action::Send => "Send question",
            Action::ToggleAnnotate => "Circle to ask (annotation mode)",
            Action::ExitAnnotate => "Leave annotation mode / close overlay",
            Action::ToggleLogic => "Show or hide board work of the latest answer",
            Action::Narrate => "Listen to the latest answer (again to stop)",
            Action::CopyAnswer => "Copy the latest answer",
            Action::ToggleHelp => "Help",
            Action::ToggleLog => "Debug log",
            Action::ToggleMouse => "Release the mouse for terminal text selection",
            Action::ScrollUp => "Scroll up",
            Action::ScrollDown => "Scroll down",
            Action::ScrollPageUp => "Scroll page up",
            Action::ScrollPageDown => "Scroll page down",
            Action::ScrollHome => "Scroll to top",
            Action::ScrollEnd => "Scroll to end",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        if key.code != self.code {
            return false;
        }
        // Terminals disagree on reporting SHIFT for F-keys and Enter; only the
        // control and alt bits have to agree.
        let relevant = KeyModifiers::CONTROL | KeyModifiers::ALT;
        (key.modifiers & relevant) == (self.mods & relevant)
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.mods.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.mods.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        let code = match self.code {
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::F(n) => format!("F{}", n),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            other => format!("{:?}", other),
        };
        parts.push(code);
        parts.join("+")
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<Action, Vec<KeyCombo>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Action::*;
        let mut kb = Self::empty();
        kb.add(Quit, KeyCombo::ctrl('c'));
        kb.add(Quit, KeyCombo::ctrl('q'));
        kb.add(Send, KeyCombo::plain(KeyCode::Enter));
        kb.add(ToggleAnnotate, KeyCombo::ctrl('p'));
        kb.add(ExitAnnotate, KeyCombo::plain(KeyCode::Esc));
        kb.add(ToggleLogic, KeyCombo::ctrl('l'));
        kb.add(Narrate, KeyCombo::ctrl('s'));
        kb.add(CopyAnswer, KeyCombo::ctrl('y'));
        kb.add(ToggleHelp, KeyCombo::plain(KeyCode::F(1)));
        kb.add(ToggleLog, KeyCombo::plain(KeyCode::F(12)));
        kb.add(ToggleMouse, KeyCombo::plain(KeyCode::F(2)));
        kb.add(ScrollUp, KeyCombo::plain(KeyCode::Up));
        kb.add(ScrollDown, KeyCombo::plain(KeyCode::Down));
        kb.add(ScrollPageUp, KeyCombo::plain(KeyCode::PageUp));
        kb.add(ScrollPageDown, KeyCombo::plain(KeyCode::PageDown));
        kb.add(ScrollHome, KeyCombo::plain(KeyCode::Home));
        kb.add(ScrollEnd, KeyCombo::plain(KeyCode::End));
        kb
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn add(&mut self, action: Action, combo: KeyCombo) {
        self.map.entry(action).or_default().push(combo);
    }

    pub fn matches(&self, action: Action, key: &KeyEvent) -> bool {
        self.map
            .get(&action)
            .is_some_and(|list| list.iter().any(|c| c.matches(key)))
    }

    pub fn action_for_key(&self, key: &KeyEvent) -> Option<Action> {
        // Sorted so a key bound twice resolves the same way every run.
        let mut actions: Vec<&Action> = self.map.keys().collect();
        actions.sort();
        actions
            .into_iter()
            .find(|action| self.matches(**action, key))
            .copied()
    }

    /// `(action, combos)` rows for the help overlay, in declaration order.
    pub fn help_entries(&self) -> Vec<(Action, Vec<String>)> {
        let mut entries: Vec<(Action, Vec<String>)> = self
            .map
            .iter()
            .map(|(action, list)| (*action, list.iter().map(KeyCombo::display).collect()))
            .collect();
        entries.sort_by_key(|(action, _)| *action);
        entries
    }

    pub fn combos_for(&self, action: Action) -> Vec<String> {
        self.map
            .get(&action)
            .map(|list| list.iter().map(|c| c.display()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_actions() {
        let kb = KeyBindings::default();
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(kb.action_for_key(&ctrl('q')), Some(Action::Quit));
        assert_eq!(kb.action_for_key(&ctrl('c')), Some(Action::Quit));
        assert_eq!(kb.action_for_key(&ctrl('p')), Some(Action::ToggleAnnotate));
        assert_eq!(
            kb.action_for_key(&KeyEvent::new(KeyCode::Char('p'), KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn shift_is_ignored_for_function_keys() {
        let kb = KeyBindings::default();
        let shifted_f1 = KeyEvent::new(KeyCode::F(1), KeyModifiers::SHIFT);
        assert!(kb.matches(Action::ToggleHelp, &shifted_f1));
    }

    #[test]
    fn help_entries_are_ordered_and_displayed() {
        let kb = KeyBindings::default();
        let entries = kb.help_entries();
        assert_eq!(entries[0].0, Action::Quit);
        assert_eq!(entries[0].1, vec!["Ctrl+C".to_string(), "Ctrl+Q".to_string()]);
        assert_eq!(kb.combos_for(Action::ToggleLog), vec!["F12".to_string()]);
    }
}
