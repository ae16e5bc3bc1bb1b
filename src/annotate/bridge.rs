//! Turns circled text into a follow-up question for the input line.

use crate::constants::EXPLAIN_PREFIX;

/// Receiver of resolved selections. The conversation implements this.
pub trait SelectionSink {
    /// Place `query` into the pending input. Must not send it.
    fn on_selection_resolved(&mut self, query: String);

    /// Leave annotation mode so the regular input is visible again.
    fn exit_annotation_mode(&mut self);
}

pub fn explain_prompt(text: &str) -> String {
    format!("{EXPLAIN_PREFIX} \"{text}\"")
}

/// Hand `text` to `sink` as a follow-up question. Blank text is ignored.
pub fn bridge_selection<S: SelectionSink + ?Sized>(text: &str, sink: &mut S) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    sink.on_selection_resolved(explain_prompt(text));
    sink.exit_annotation_mode();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        input: Option<String>,
        annotating: bool,
    }

    impl SelectionSink for Recorder {
        fn on_selection_resolved(&mut self, query: String) {
            self.input = Some(query);
        }

        fn exit_annotation_mode(&mut self) {
            self.annotating = false;
        }
    }

    #[test]
    fn formats_follow_up_question() {
        assert_eq!(
            explain_prompt("Force = Mass × Acceleration"),
            "Teacher, can you explain this part specifically? \"Force = Mass × Acceleration\""
        );
    }

    #[test]
    fn bridge_fills_input_and_exits_mode() {
        let mut sink = Recorder {
            input: None,
            annotating: true,
        };
        assert!(bridge_selection("= 50 N", &mut sink));
        assert_eq!(
            sink.input.as_deref(),
            Some("Teacher, can you explain this part specifically? \"= 50 N\"")
        );
        assert!(!sink.annotating);
    }

    #[test]
    fn blank_text_is_ignored() {
        let mut sink = Recorder {
            input: None,
            annotating: true,
        };
        assert!(!bridge_selection(" \t\n", &mut sink));
        assert!(sink.input.is_none());
        assert!(sink.annotating);
    }
}
