//! Conversation state for one open chat view.
//!
//! Nothing here touches the terminal or the network: the view feeds key input
//! into [`Session`], hands the text returned by [`Session::submit`] to a
//! [`ChatTransport`], and feeds the resulting [`Outcome`] back through
//! [`Session::resolve`].

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::client::{ChatResponse, ChatTransport};
use crate::error::ChatError;

/// Shown when the server answers with `success: false`.
pub const ERROR_TEXT: &str = "Error message";
/// Shown when the request fails or the response cannot be read.
pub const NETWORK_ERROR_TEXT: &str = "Network error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Server,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn server(text: impl Into<String>) -> Self {
        Self {
            role: Role::Server,
            text: text.into(),
        }
    }
}

/// How a single request resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Rejected,
    Failed,
}

impl Outcome {
    /// Text of the server message this outcome produces.
    pub fn text(&self) -> &str {
        match self {
            Outcome::Reply(text) => text,
            Outcome::Rejected => ERROR_TEXT,
            Outcome::Failed => NETWORK_ERROR_TEXT,
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Outcome::Reply(_))
    }
}

impl From<Result<ChatResponse, ChatError>> for Outcome {
    fn from(result: Result<ChatResponse, ChatError>) -> Self {
        match result {
            Ok(ChatResponse {
                success: true,
                response: Some(reply),
                ..
            }) => {
                info!(chars = reply.message.chars().count(), "received reply");
                Outcome::Reply(reply.message)
            }
            Ok(ChatResponse { success: true, .. }) => {
                error!("server reported success without a reply message");
                Outcome::Failed
            }
            Ok(ChatResponse { error, .. }) => {
                warn!(reason = error.as_deref().unwrap_or("none given"), "server rejected message");
                Outcome::Rejected
            }
            Err(err) => {
                error!(%err, "chat request failed");
                Outcome::Failed
            }
        }
    }
}

/// Send `message` and classify the result. Never fails.
pub async fn exchange(transport: &dyn ChatTransport, message: &str) -> Outcome {
    transport.send(message).await.into()
}

/// Called with the full message list each time its length changes.
pub type ChangeListener = Box<dyn FnMut(&[Message]) + Send>;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Default)]
pub struct Session {
    messages: Vec<Message>,
    draft: String,
    cursor: usize, // character index into draft
    sending: bool,
    listeners: Vec<ChangeListener>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn on_messages_changed(&mut self, listener: impl FnMut(&[Message]) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replace the draft and move the cursor to its end.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        self.cursor = self.draft.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.cursor);
        self.draft.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }

    /// Move the trimmed draft into the conversation as a user message.
    ///
    /// Returns the text to send, or `None` when the draft is blank or a
    /// request is already in flight. On `Some`, the session is marked as
    /// sending until [`Session::resolve`] is called.
    pub fn submit(&mut self) -> Option<String> {
        if self.sending {
            debug!("submit ignored while a request is in flight");
            return None;
        }

        let text = self.draft.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();

        self.draft.clear();
        self.cursor = 0;
        self.push(Message::user(text.clone()));
        self.sending = true;

        Some(text)
    }

    /// Append the server message for `outcome` and clear the sending flag.
    pub fn resolve(&mut self, outcome: Outcome) {
        let text = match outcome {
            Outcome::Reply(text) => text,
            other => other.text().to_string(),
        };
        self.push(Message::server(text));
        self.sending = false;
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        for listener in &mut self.listeners {
            listener(&self.messages);
        }
    }
}
