use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn name(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Ai => "AI",
        }
    }

    pub fn from_name(name: &str) -> Option<Sender> {
        match name.trim().to_ascii_uppercase().as_str() {
            "USER" => Some(Self::User),
            "AI" => Some(Self::Ai),
            _ => None,
        }
    }

    /// Speaker name used in transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Ai => "Echo",
        }
    }
}

/// One entry of the conversation log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    sender: Sender,
    text: String,
    is_glitched: bool,
    timestamp_millis: i64,
    stage_at_send: Stage,
}

impl Message {
    pub fn new(
        sender: Sender,
        text: impl Into<String>,
        is_glitched: bool,
        timestamp_millis: i64,
        stage_at_send: Stage,
    ) -> Self {
        Self {
            sender,
            text: text.into(),
            is_glitched,
            timestamp_millis,
            stage_at_send,
        }
    }

    /// A plain user message stamped with the current wall-clock time.
    pub fn from_user(text: impl Into<String>, stage_at_send: Stage) -> Self {
        Self::new(Sender::User, text, false, now_millis(), stage_at_send)
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_glitched(&self) -> bool {
        self.is_glitched
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }

    pub fn stage_at_send(&self) -> Stage {
        self.stage_at_send
    }

    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_names() {
        assert_eq!(Sender::from_name("user"), Some(Sender::User));
        assert_eq!(Sender::from_name("AI"), Some(Sender::Ai));
        assert_eq!(Sender::from_name("ECHO"), None);
        assert_eq!(Sender::User.label(), "You");
        assert_eq!(Sender::Ai.label(), "Echo");
    }

    #[test]
    fn message_accessors() {
        let msg = Message::new(Sender::Ai, "static", true, 1_700_000_000_000, Stage::Glitch);
        assert_eq!(msg.sender(), Sender::Ai);
        assert_eq!(msg.text(), "static");
        assert!(msg.is_glitched());
        assert_eq!(msg.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(msg.stage_at_send(), Stage::Glitch);
        assert!(!msg.is_from_user());
    }

    #[test]
    fn user_message_is_stamped() {
        let msg = Message::from_user("hello", Stage::Normal);
        assert!(msg.is_from_user());
        assert!(!msg.is_glitched());
        assert!(msg.timestamp_millis() > 0);
    }
}
