//! Text extraction from heterogeneous event payloads.

use tripwise_core::event::{ChatMessage, Payload, Role};

/// Return the most informative text carried by `payload`.
///
/// Strings are returned verbatim. A rich response yields its aggregated
/// text when non-blank, otherwise whatever its transcript yields. A message
/// yields its text when authored by the assistant or unattributed. Lists
/// yield the longest non-empty result among their elements.
pub fn extract_text(payload: &Payload) -> String {
    match payload {
        Payload::Empty => String::new(),
        Payload::Text(s) => s.clone(),
        Payload::Response(response) => match &response.text {
            Some(text) if !text.trim().is_empty() => text.clone(),
            _ => longest(response.messages.iter().map(message_text)),
        },
        Payload::Message(message) => message_text(message),
        Payload::List(items) => longest(items.iter().map(extract_text)),
    }
}

/// Text of the last assistant-authored message in a transcript payload.
///
/// Nested lists and response transcripts are flattened in order. Returns an
/// empty string when no assistant message carries text.
pub fn last_assistant_text(payload: &Payload) -> String {
    let mut flat = Vec::new();
    flatten(payload, &mut flat);
    flat.iter()
        .rev()
        .find(|m| m.role == Some(Role::Assistant) && !m.text.is_empty())
        .map(|m| m.text.clone())
        .unwrap_or_default()
}

/// Text for a terminal output event: the last assistant message, or the
/// generic extraction when the transcript has none.
pub fn terminal_text(payload: &Payload) -> String {
    let text = last_assistant_text(payload);
    if text.is_empty() {
        extract_text(payload)
    } else {
        text
    }
}

fn message_text(message: &ChatMessage) -> String {
    if message.is_assistant_like() {
        message.text.clone()
    } else {
        String::new()
    }
}

fn longest(candidates: impl Iterator<Item = String>) -> String {
    candidates.fold(String::new(), |best, candidate| {
        if candidate.len() > best.len() {
            candidate
        } else {
            best
        }
    })
}

fn flatten<'a>(payload: &'a Payload, out: &mut Vec<&'a ChatMessage>) {
    match payload {
        Payload::Message(message) => out.push(message),
        Payload::Response(response) => out.extend(response.messages.iter()),
        Payload::List(items) => items.iter().for_each(|item| flatten(item, out)),
        Payload::Empty | Payload::Text(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_verbatim() {
        assert_eq!(extract_text(&Payload::text("  spaced  ")), "  spaced  ");
        assert_eq!(extract_text(&Payload::text("")), "");
    }

    #[test]
    fn empty_payload_yields_empty() {
        assert_eq!(extract_text(&Payload::Empty), "");
    }

    #[test]
    fn response_prefers_aggregated_text() {
        let payload = Payload::response(
            Some("Full brief"),
            vec![ChatMessage::assistant("a much longer transcript message")],
        );
        assert_eq!(extract_text(&payload), "Full brief");
    }

    #[test]
    fn blank_response_text_falls_back_to_messages() {
        let payload = Payload::response(
            Some("   "),
            vec![
                ChatMessage::assistant("short"),
                ChatMessage::assistant("the longer one"),
            ],
        );
        assert_eq!(extract_text(&payload), "the longer one");
    }

    #[test]
    fn decoded_runtime_objects() {
        let decode = |raw: &str| extract_text(&serde_json::from_str::<Payload>(raw).unwrap());
        assert_eq!(
            decode(r#"{"agent_response":{"text":"  "},"text":"outer answer"}"#),
            "outer answer"
        );
        assert_eq!(
            decode(r#"{"role":"assistant","text":"","content":"legacy answer"}"#),
            "legacy answer"
        );
        assert_eq!(decode(r#"{"role":"user","text":"","content":"question"}"#), "");
    }

    #[test]
    fn non_assistant_messages_are_skipped() {
        assert_eq!(extract_text(&Payload::Message(ChatMessage::user("hi"))), "");
        assert_eq!(extract_text(&Payload::Message(ChatMessage::tool("18°C"))), "");
    }

    #[test]
    fn unattributed_message_counts() {
        let message = ChatMessage {
            role: None,
            text: "orphan".into(),
        };
        assert_eq!(extract_text(&Payload::Message(message)), "orphan");
    }

    #[test]
    fn list_keeps_longest() {
        let payload = Payload::list([
            Payload::text("medium text"),
            Payload::Message(ChatMessage::user("a user message that is very long")),
            Payload::list([Payload::text("the longest nested text")]),
            Payload::Empty,
        ]);
        assert_eq!(extract_text(&payload), "the longest nested text");
    }

    #[test]
    fn last_assistant_in_flattened_transcript() {
        let payload = Payload::list([
            Payload::messages([ChatMessage::user("q"), ChatMessage::assistant("first")]),
            Payload::messages([ChatMessage::assistant("second"), ChatMessage::tool("t")]),
        ]);
        assert_eq!(last_assistant_text(&payload), "second");
    }

    #[test]
    fn last_assistant_skips_empty_text() {
        let payload = Payload::messages([
            ChatMessage::assistant("real answer"),
            ChatMessage::assistant(""),
        ]);
        assert_eq!(last_assistant_text(&payload), "real answer");
    }

    #[test]
    fn last_assistant_reads_response_transcript() {
        let payload = Payload::response(None, vec![ChatMessage::assistant("plan")]);
        assert_eq!(last_assistant_text(&payload), "plan");
    }

    #[test]
    fn terminal_text_falls_back_to_generic() {
        assert_eq!(terminal_text(&Payload::text("plain")), "plain");
        let payload = Payload::response(Some("aggregated"), vec![ChatMessage::user("q")]);
        assert_eq!(terminal_text(&payload), "aggregated");
        assert_eq!(terminal_text(&Payload::Empty), "");
    }
}
