use std::sync::LazyLock;

use regex::Regex;

/// Echoed conversation-context block, fences and trailing whitespace included.
static CONTEXT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)===\s*PREVIOUS CONVERSATION CONTEXT\s*===.*?===\s*END OF CONTEXT\s*===\s*")
        .expect("context block pattern is valid")
});

/// Outputs that carry no content on their own.
const PLACEHOLDERS: [&str; 6] = ["-", ".", "...", "…", "—", "–"];

/// Strip echoed context blocks and drop semantically empty output.
///
/// Returns an empty string for empty input, single characters and bare
/// punctuation placeholders.
pub fn clean_output(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = CONTEXT_BLOCK.replace_all(text, "");
    let trimmed = stripped.trim();
    if trimmed.chars().count() <= 1 || PLACEHOLDERS.contains(&trimmed) {
        return String::new();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_become_empty() {
        for input in [".", "-", "…", "", "...", "—", "–", " . ", "x", "\n\n"] {
            assert_eq!(clean_output(input), "", "input {input:?}");
        }
    }

    #[test]
    fn regular_text_is_trimmed() {
        assert_eq!(clean_output("  Visit the Prado.\n"), "Visit the Prado.");
    }

    #[test]
    fn two_characters_survive() {
        assert_eq!(clean_output("ok"), "ok");
    }

    #[test]
    fn strips_echoed_context_block() {
        let input = "=== PREVIOUS CONVERSATION CONTEXT ===\n[User]: hi\n=== END OF CONTEXT ===\n\nReal answer";
        assert_eq!(clean_output(input), "Real answer");
    }

    #[test]
    fn strips_case_insensitive_markers() {
        let input = "===previous conversation context===\nold stuff\n===  End Of Context  ===   Fresh";
        assert_eq!(clean_output(input), "Fresh");
    }

    #[test]
    fn strips_every_block_non_greedy() {
        let input = "=== PREVIOUS CONVERSATION CONTEXT ===a=== END OF CONTEXT ===Keep me \
                     === PREVIOUS CONVERSATION CONTEXT ===b=== END OF CONTEXT === and me";
        assert_eq!(clean_output(input), "Keep me and me");
    }

    #[test]
    fn context_only_output_is_empty() {
        let input = "=== PREVIOUS CONVERSATION CONTEXT ===\n[Planner]: old plan\n=== END OF CONTEXT ===\n\n";
        assert_eq!(clean_output(input), "");
    }

    #[test]
    fn unterminated_block_is_kept() {
        let input = "=== PREVIOUS CONVERSATION CONTEXT === dangling";
        assert_eq!(clean_output(input), input);
    }

    #[test]
    fn placeholder_after_stripping_is_empty() {
        let input = "=== PREVIOUS CONVERSATION CONTEXT ===x=== END OF CONTEXT ===...";
        assert_eq!(clean_output(input), "");
    }

    #[test]
    fn single_multibyte_char_is_empty() {
        assert_eq!(clean_output("é"), "");
        assert_eq!(clean_output("日本"), "日本");
    }
}
