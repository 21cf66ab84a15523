//! Conversation persistence.
//!
//! The engine core never touches storage; a [`ConversationStore`] hands it
//! already-normalised values. Two implementations: an in-process
//! [`MemoryStore`] and a JSON document on disk ([`JsonFileStore`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::message::{Message, Sender};
use crate::schema::stage::Stage;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

pub const DEFAULT_TEXT_SIZE: f32 = 14.0;
pub const DEFAULT_VIBRATION_ENABLED: bool = true;

/// Storage collaborator for a session and its display settings.
pub trait ConversationStore {
    fn load_messages(&self) -> Result<Vec<Message>, StoreError>;
    fn save_messages(&mut self, messages: &[Message]) -> Result<(), StoreError>;

    fn load_stage(&self) -> Result<Stage, StoreError>;
    fn save_stage(&mut self, stage: Stage) -> Result<(), StoreError>;

    fn load_false_memory_shared(&self) -> Result<bool, StoreError>;
    fn save_false_memory_shared(&mut self, shared: bool) -> Result<(), StoreError>;

    fn load_text_size(&self) -> Result<f32, StoreError>;
    fn save_text_size(&mut self, size: f32) -> Result<(), StoreError>;

    fn load_vibration_enabled(&self) -> Result<bool, StoreError>;
    fn save_vibration_enabled(&mut self, enabled: bool) -> Result<(), StoreError>;

    /// Drop messages, stage and the memory flag. Settings survive.
    fn clear_session(&mut self) -> Result<(), StoreError>;
}

/// Keeps everything in memory. Used by tests and the WASM demo.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStore {
    messages: Vec<Message>,
    stage: Stage,
    false_memory_shared: bool,
    text_size: f32,
    vibration_enabled: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            stage: Stage::Normal,
            false_memory_shared: false,
            text_size: DEFAULT_TEXT_SIZE,
            vibration_enabled: DEFAULT_VIBRATION_ENABLED,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryStore {
    fn load_messages(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.messages.clone())
    }

    fn save_messages(&mut self, messages: &[Message]) -> Result<(), StoreError> {
        self.messages = messages.to_vec();
        Ok(())
    }

    fn load_stage(&self) -> Result<Stage, StoreError> {
        Ok(self.stage)
    }

    fn save_stage(&mut self, stage: Stage) -> Result<(), StoreError> {
        self.stage = stage;
        Ok(())
    }

    fn load_false_memory_shared(&self) -> Result<bool, StoreError> {
        Ok(self.false_memory_shared)
    }

    fn save_false_memory_shared(&mut self, shared: bool) -> Result<(), StoreError> {
        self.false_memory_shared = shared;
        Ok(())
    }

    fn load_text_size(&self) -> Result<f32, StoreError> {
        Ok(self.text_size)
    }

    fn save_text_size(&mut self, size: f32) -> Result<(), StoreError> {
        self.text_size = size;
        Ok(())
    }

    fn load_vibration_enabled(&self) -> Result<bool, StoreError> {
        Ok(self.vibration_enabled)
    }

    fn save_vibration_enabled(&mut self, enabled: bool) -> Result<(), StoreError> {
        self.vibration_enabled = enabled;
        Ok(())
    }

    fn clear_session(&mut self) -> Result<(), StoreError> {
        self.messages.clear();
        self.stage = Stage::Normal;
        self.false_memory_shared = false;
        Ok(())
    }
}

/// Current on-disk document version.
const STORE_VERSION: u32 = 1;

/// The on-disk document. Stage and sender are kept as loose strings so
/// that files written by other versions still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct StoredSession {
    version: u32,
    saved_at: String,
    messages: Vec<StoredMessage>,
    stage: String,
    false_memory_shared: bool,
    text_size: f32,
    vibration_enabled: bool,
}

impl Default for StoredSession {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            saved_at: String::new(),
            messages: Vec::new(),
            stage: Stage::Normal.name().to_string(),
            false_memory_shared: false,
            text_size: DEFAULT_TEXT_SIZE,
            vibration_enabled: DEFAULT_VIBRATION_ENABLED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMessage {
    sender: String,
    text: String,
    #[serde(default)]
    is_glitched: bool,
    #[serde(default)]
    timestamp_millis: i64,
    #[serde(default)]
    stage_at_send: String,
}

impl StoredMessage {
    fn from_message(message: &Message) -> Self {
        Self {
            sender: message.sender().name().to_string(),
            text: message.text().to_string(),
            is_glitched: message.is_glitched(),
            timestamp_millis: message.timestamp_millis(),
            stage_at_send: message.stage_at_send().name().to_string(),
        }
    }

    /// `None` if the sender is unrecognised.
    fn to_message(&self) -> Option<Message> {
        let sender = Sender::from_name(&self.sender)?;
        Some(Message::new(
            sender,
            self.text.clone(),
            self.is_glitched,
            self.timestamp_millis,
            stage_or_normal(&self.stage_at_send),
        ))
    }
}

fn stage_or_normal(name: &str) -> Stage {
    Stage::from_name(name).unwrap_or_else(|| {
        if !name.is_empty() {
            warn!(stage = name, "unknown stage in store, using NORMAL");
        }
        Stage::Normal
    })
}

/// One pretty-printed JSON document on disk. Every save rewrites the
/// whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file → defaults. Unparseable file → `warn!` and defaults.
    fn read_document(&self) -> Result<StoredSession, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no store file yet");
                return Ok(StoredSession::default());
            }
            Err(e) => return Err(e.into()),
        };

        let document: StoredSession = match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable store file, using defaults");
                return Ok(StoredSession::default());
            }
        };

        if document.version != STORE_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: STORE_VERSION,
                found: document.version,
            });
        }
        Ok(document)
    }

    fn update(&mut self, apply: impl FnOnce(&mut StoredSession)) -> Result<(), StoreError> {
        let mut document = self.read_document()?;
        apply(&mut document);
        document.version = STORE_VERSION;
        document.saved_at = chrono::Utc::now().to_rfc3339();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "store written");
        Ok(())
    }
}

impl ConversationStore for JsonFileStore {
    fn load_messages(&self) -> Result<Vec<Message>, StoreError> {
        let document = self.read_document()?;
        let total = document.messages.len();
        let messages: Vec<Message> = document
            .messages
            .iter()
            .filter_map(StoredMessage::to_message)
            .collect();
        if messages.len() < total {
            warn!(
                dropped = total - messages.len(),
                "messages with unknown sender dropped"
            );
        }
        Ok(messages)
    }

    fn save_messages(&mut self, messages: &[Message]) -> Result<(), StoreError> {
        let stored = messages.iter().map(StoredMessage::from_message).collect();
        self.update(|document| document.messages = stored)
    }

    fn load_stage(&self) -> Result<Stage, StoreError> {
        Ok(stage_or_normal(&self.read_document()?.stage))
    }

    fn save_stage(&mut self, stage: Stage) -> Result<(), StoreError> {
        self.update(|document| document.stage = stage.name().to_string())
    }

    fn load_false_memory_shared(&self) -> Result<bool, StoreError> {
        Ok(self.read_document()?.false_memory_shared)
    }

    fn save_false_memory_shared(&mut self, shared: bool) -> Result<(), StoreError> {
        self.update(|document| document.false_memory_shared = shared)
    }

    fn load_text_size(&self) -> Result<f32, StoreError> {
        Ok(self.read_document()?.text_size)
    }

    fn save_text_size(&mut self, size: f32) -> Result<(), StoreError> {
        self.update(|document| document.text_size = size)
    }

    fn load_vibration_enabled(&self) -> Result<bool, StoreError> {
        Ok(self.read_document()?.vibration_enabled)
    }

    fn save_vibration_enabled(&mut self, enabled: bool) -> Result<(), StoreError> {
        self.update(|document| document.vibration_enabled = enabled)
    }

    fn clear_session(&mut self) -> Result<(), StoreError> {
        self.update(|document| {
            document.messages.clear();
            document.stage = Stage::Normal.name().to_string();
            document.false_memory_shared = false;
        })
    }
}
