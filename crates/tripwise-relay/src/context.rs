//! Bounded conversation-context prefix for follow-up queries.

/// Default character budget: 4096 tokens at roughly 4 characters per token.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 4096 * 4;

pub const CONTEXT_HEADER: &str = "=== PREVIOUS CONVERSATION CONTEXT ===\n";
pub const CONTEXT_FOOTER: &str = "\n=== END OF CONTEXT ===\n\n";

/// One prior turn of a conversation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextTurn<'a> {
    pub role: &'a str,
    pub author: Option<&'a str>,
    pub content: &'a str,
}

impl<'a> ContextTurn<'a> {
    pub fn new(role: &'a str, author: Option<&'a str>, content: &'a str) -> Self {
        Self {
            role,
            author,
            content,
        }
    }

    fn render(&self) -> String {
        let author = match self.author {
            Some(author) if !author.is_empty() => author.to_string(),
            _ => capitalize(self.role),
        };
        format!("[{author}]: {}", self.content)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Build the context prefix from `turns` (oldest first).
///
/// Keeps the most recent turns whose rendered entries fit in `max_chars`
/// and stops at the first one that does not. Returns an empty string when
/// nothing fits or there is no history.
pub fn build_context(turns: &[ContextTurn<'_>], max_chars: usize) -> String {
    let mut entries = Vec::new();
    let mut total = 0usize;

    for turn in turns.iter().rev() {
        let entry = turn.render();
        let len = entry.chars().count();
        if total + len > max_chars {
            break;
        }
        total += len;
        entries.push(entry);
    }

    if entries.is_empty() {
        return String::new();
    }
    entries.reverse();

    tracing::debug!(
        turns = entries.len(),
        chars = total,
        estimated_tokens = total / 4,
        "built conversation context"
    );
    format!("{CONTEXT_HEADER}{}{CONTEXT_FOOTER}", entries.join("\n\n"))
}
