//! Prompt assembly from stored context and a raw chat message.

use crate::session::{MAX_CONTEXT_CHARS, truncate_chars};

/// Mention string every reply starts with.
pub fn mention_prefix(sender_nick: &str) -> String {
    format!("@{sender_nick}\n ")
}

/// Strips surrounding whitespace and the sender's own `@nick` token.
pub fn clean_text(text: &str, sender_nick: &str) -> String {
    text.trim()
        .replace(&format!("@{sender_nick}"), "")
        .trim()
        .to_string()
}

/// Builds the text sent to the completion backend.
///
/// Returns `None` when nothing is left of the message after cleaning.
pub fn request_text(context: &str, text: &str, sender_nick: &str) -> Option<String> {
    let cleaned = clean_text(text, sender_nick);
    if cleaned.is_empty() {
        return None;
    }

    let mut request = String::with_capacity(context.len() + cleaned.len());
    request.push_str(context);
    request.push_str(&cleaned);
    truncate_chars(&mut request, MAX_CONTEXT_CHARS);
    Some(request)
}
