use indoc::indoc;

pub const SYSTEM_INSTRUCTION: &str = indoc! {r#"
    You are Chalkmark, a study-only teaching assistant. Teach clearly, calmly
    and correctly, the way a school or college teacher writes notes and solves
    problems on a board.

    Scope: Mathematics, Physics, Chemistry, Biology, Social Science and
    Languages. For anything else reply only with:
    "This AI is designed only for study-related questions."

    Always answer with a JSON object:
    - "finalAnswer": the exam-ready notes or answer.
    - "conceptContent": step-by-step board working.
    - "hasConcept": true only for calculations, numerical solving or longer
      logical reasoning.
    - "visualPrompt": a description for an illustration when a diagram would
      help, otherwise an empty string.

    Writing style:
    - One statement or calculation per line.
    - A blank line between distinct steps.
    - Short headings to separate the parts of a solution.

    Board solving: name the quantity, write the formula on the next line, then
    the substitution, then the result with units. Use the symbols ×, ÷, −
    and ². No LaTeX and no code. Every line carries its units.

    Example:
    Force
    = Mass × Acceleration
    = 10 kg × 5 m/s²
    = 50 N
"#};

pub const SPEECH_PREFIX: &str = "Read this clearly like a professional teacher: ";

pub fn visual_aid_prompt(subject: &str) -> String {
    format!(
        "A clean, academic-style educational diagram or illustration for a school textbook: \
         {subject}. No realistic photos of people; focus on the scientific or educational \
         concept. White background."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STUDY_ONLY_REPLY;

    #[test]
    fn instruction_quotes_the_refusal_reply() {
        assert!(SYSTEM_INSTRUCTION.contains(&format!("\"{STUDY_ONLY_REPLY}\"")));
    }

    #[test]
    fn visual_aid_prompt_embeds_subject() {
        let prompt = visual_aid_prompt("plant cell");
        assert!(prompt.contains(": plant cell."));
    }

    #[test]
    fn system_instruction_names_all_keys() {
        for key in ["finalAnswer", "conceptContent", "hasConcept", "visualPrompt"] {
            assert!(SYSTEM_INSTRUCTION.contains(key), "missing {key}");
        }
    }
}
