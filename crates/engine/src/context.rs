//! Context building: projects a transcript plus a new message into the
//! prompt text sent to the provider.
//!
//! Every turn before the newest one becomes a single line, `"{prefix}:
//! {content}"`, with long contents cut to a fixed number of characters.
//! The newest turn is the message being answered; it is embedded verbatim
//! after the rendered history.
//!
//! # Determinism
//!
//! Rendering depends only on the transcript and the input text. No clock
//! or random source is consulted.

use parley_core::transcript::Transcript;
use parley_core::turn::{Role, Turn};

/// Default number of characters kept per rendered turn.
pub const DEFAULT_TRUNCATION: usize = 150;

/// Appended to a turn's content when it was cut.
pub const TRUNCATION_MARKER: &str = "...";

/// Renders prior turns into bounded prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBuilder {
    truncation: usize,
}

impl ContextBuilder {
    /// A builder that keeps at most `truncation` characters per turn
    /// (minimum 1).
    pub fn new(truncation: usize) -> Self {
        Self {
            truncation: truncation.max(1),
        }
    }

    pub fn truncation(&self) -> usize {
        self.truncation
    }

    /// Render every turn except the last, one per line, oldest first.
    ///
    /// The last turn is the user message currently being answered, so a
    /// transcript with fewer than two turns renders as an empty string.
    pub fn render_context(&self, transcript: &Transcript) -> String {
        let prior = transcript.len().saturating_sub(1);
        transcript
            .iter()
            .take(prior)
            .map(|turn| self.render_turn(turn))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full prompt for `new_input`, given a transcript that already ends
    /// with the user turn carrying it.
    pub fn build_prompt(&self, transcript: &Transcript, new_input: &str) -> String {
        let context = self.render_context(transcript);
        format!(
            "\nPrevious conversation:\n{context}\n\nNow respond naturally to this new message:\n{new_input}\n"
        )
    }

    fn render_turn(&self, turn: &Turn) -> String {
        format!(
            "{}: {}",
            role_prefix(turn.role()),
            truncate(turn.content(), self.truncation)
        )
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_TRUNCATION)
    }
}

/// Line prefix for a role.
pub fn role_prefix(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "AI",
        Role::Error => "Error",
    }
}

/// The first `max_chars` characters of `content` plus the marker, or the
/// content unchanged when it already fits.
pub fn truncate(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &content[..cut]),
        None => content.to_string(),
    }
}
