/// Conversation session: owns one instance of every engine component,
/// the RNG and the message log. Built via `Session::builder()`.
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::core::config::{ConfigError, EngineConfig};
use crate::core::dialogue::{DialogueOrchestrator, DialogueResult};
use crate::core::distortion::TextDistortionEngine;
use crate::core::memory::MemoryPool;
use crate::core::script::{ScriptError, ScriptLibrary};
use crate::core::stage_machine::StageMachine;
use crate::schema::emotion::EmotionState;
use crate::schema::message::Message;
use crate::schema::stage::Stage;
use crate::store::{ConversationStore, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// One conversation with Echo.
pub struct Session {
    stages: StageMachine,
    script: ScriptLibrary,
    memory: MemoryPool,
    distortion: TextDistortionEngine,
    rng: StdRng,
    seed: u64,
    config: EngineConfig,
    messages: Vec<Message>,
}

/// Builder for constructing a `Session`.
pub struct SessionBuilder {
    seed: u64,
    config_path: Option<String>,
    script_path: Option<String>,
    /// Directly provided config (for testing without files).
    config: Option<EngineConfig>,
    /// Directly provided script (for testing without files).
    script: Option<ScriptLibrary>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder {
            seed: 0,
            config_path: None,
            script_path: None,
            config: None,
            script: None,
        }
    }

    /// Handle one user message end to end: log it, build the reply, log
    /// the reply. Blank input is ignored and returns `None`.
    pub fn respond(&mut self, user_text: &str) -> Option<DialogueResult> {
        let text = user_text.trim();
        if text.is_empty() {
            return None;
        }
        self.messages
            .push(Message::from_user(text, self.stages.current_stage()));
        let result = self.build_response(text);
        self.messages.push(result.message.clone());
        Some(result)
    }

    /// One orchestrator turn without touching the message log.
    pub fn build_response(&mut self, user_text: &str) -> DialogueResult {
        self.orchestrator().build_response(user_text)
    }

    /// Borrow the components as an orchestrator.
    pub fn orchestrator(&mut self) -> DialogueOrchestrator<'_> {
        DialogueOrchestrator {
            stages: &mut self.stages,
            script: &mut self.script,
            memory: &mut self.memory,
            distortion: &self.distortion,
            rng: &mut self.rng,
        }
    }

    /// Resume from persisted state.
    ///
    /// The user message count is recomputed from the log, a stage past
    /// GLITCH without a delivered memory is rolled back to GLITCH, script
    /// cursors are replayed from the AI messages, and the latest user
    /// messages refill the fragment window.
    pub fn restore(&mut self, messages: Vec<Message>, stage: Stage, false_memory_shared: bool) {
        let user_messages: Vec<&Message> = messages.iter().filter(|m| m.is_from_user()).collect();
        let user_count = u32::try_from(user_messages.len()).unwrap_or(u32::MAX);

        self.stages.restore(stage, user_count, false_memory_shared);
        self.stages.force_false_memory_flag(false_memory_shared);

        self.script
            .ingest_history(messages.iter().filter(|m| !m.is_from_user()));

        self.memory.reset();
        let keep = self.config.memory.fragment_window;
        let skip = user_messages.len().saturating_sub(keep);
        for message in &user_messages[skip..] {
            self.memory.record_user_input(message.text());
        }

        info!(
            messages = messages.len(),
            user_messages = user_count,
            stage = %self.stages.current_stage(),
            "session restored"
        );
        self.messages = messages;
    }

    /// Bootstrap from a persistence collaborator.
    pub fn load(&mut self, store: &impl ConversationStore) -> Result<(), SessionError> {
        let messages = store.load_messages()?;
        let stage = store.load_stage()?;
        let shared = store.load_false_memory_shared()?;
        info!(messages = messages.len(), stage = %stage, "session loaded from store");
        self.restore(messages, stage, shared);
        Ok(())
    }

    /// Persist the log, stage and memory flag.
    pub fn save(&self, store: &mut impl ConversationStore) -> Result<(), SessionError> {
        store.save_messages(&self.messages)?;
        store.save_stage(self.stage())?;
        store.save_false_memory_shared(self.false_memory_shared())?;
        info!(
            messages = self.messages.len(),
            stage = %self.stage(),
            "session saved"
        );
        Ok(())
    }

    /// Start over: every component is reset and the log cleared.
    pub fn reset(&mut self) {
        self.stages.reset();
        self.script.reset();
        self.memory.reset();
        self.messages.clear();
        info!("session reset");
    }

    /// Replace the RNG with a freshly seeded one.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stages.current_stage()
    }

    pub fn user_message_count(&self) -> u32 {
        self.stages.user_message_count()
    }

    pub fn false_memory_shared(&self) -> bool {
        self.stages.false_memory_shared()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn stage_machine(&self) -> &StageMachine {
        &self.stages
    }

    pub fn script(&self) -> &ScriptLibrary {
        &self.script
    }

    pub fn memory(&self) -> &MemoryPool {
        &self.memory
    }

    /// Pacing and tone for the current stage.
    pub fn emotion(&self) -> EmotionState {
        EmotionState::for_stage(self.stage())
    }

    /// The 0–100 dissonance gauge shown by presentation layers.
    pub fn dissonance_level(&self) -> u32 {
        dissonance_level(self.user_message_count(), self.stage())
    }

    /// Plain-text export of the conversation log.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| {
                format!(
                    "{} [{}] {}:\n{}",
                    m.sender().label(),
                    clock_time(m.timestamp_millis()),
                    m.stage_at_send().label(),
                    m.text().trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// `min(100, user_message_count * 15 + stage_ordinal * 25)`.
pub fn dissonance_level(user_message_count: u32, stage: Stage) -> u32 {
    let stage_weight = stage.ordinal() as u32 * 25;
    user_message_count
        .saturating_mul(15)
        .saturating_add(stage_weight)
        .min(100)
}

fn clock_time(timestamp_millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(timestamp_millis) {
        Some(utc) => utc.with_timezone(&chrono::Local).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

impl SessionBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Seed from OS entropy.
    pub fn random_seed(mut self) -> Self {
        self.seed = rand::random();
        self
    }

    pub fn config_file(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn script_file(mut self, path: &str) -> Self {
        self.script_path = Some(path.to_string());
        self
    }

    /// Provide a config directly (for testing without files).
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide a script directly (for testing without files).
    pub fn script(mut self, script: ScriptLibrary) -> Self {
        self.script = Some(script);
        self
    }

    pub fn build(self) -> Result<Session, SessionError> {
        // A config file overrides a directly provided config
        let config = match self.config_path {
            Some(ref path) => EngineConfig::load_from_ron(Path::new(path))?,
            None => match self.config {
                Some(config) => {
                    config.validate()?;
                    config
                }
                None => EngineConfig::default(),
            },
        };

        let script = match self.script_path {
            Some(ref path) => ScriptLibrary::load_from_ron(Path::new(path))?,
            None => self.script.unwrap_or_default(),
        };

        Ok(Session {
            stages: StageMachine::new(config.stages.clone()),
            script,
            memory: MemoryPool::new(config.memory.clone()),
            distortion: TextDistortionEngine::new(&config.distortion),
            rng: StdRng::seed_from_u64(self.seed),
            seed: self.seed,
            config,
            messages: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::message::Sender;

    #[test]
    fn builder_with_seed() {
        let session = Session::builder().seed(12345).build().unwrap();
        assert_eq!(session.seed(), 12345);
        assert_eq!(session.stage(), Stage::Normal);
        assert!(session.messages().is_empty());
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.distortion.fallback_probability = -0.5;
        assert!(matches!(
            Session::builder().config(config).build(),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn builder_missing_script_file() {
        let result = Session::builder()
            .script_file("does/not/exist.ron")
            .build();
        assert!(matches!(result, Err(SessionError::Script(ScriptError::Io(_)))));
    }

    #[test]
    fn respond_logs_both_sides() {
        let mut session = Session::builder().seed(1).build().unwrap();
        let result = session.respond("  hello  ").unwrap();
        let log = session.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].sender(), Sender::User);
        assert_eq!(log[0].text(), "hello");
        assert_eq!(log[0].stage_at_send(), Stage::Normal);
        assert_eq!(log[1], result.message);
    }

    #[test]
    fn blank_input_ignored() {
        let mut session = Session::builder().build().unwrap();
        assert!(session.respond(" \n ").is_none());
        assert!(session.messages().is_empty());
        assert_eq!(session.user_message_count(), 0);
    }

    #[test]
    fn dissonance_gauge() {
        assert_eq!(dissonance_level(0, Stage::Normal), 0);
        assert_eq!(dissonance_level(2, Stage::Glitch), 55);
        assert_eq!(dissonance_level(3, Stage::Reveal), 95);
        assert_eq!(dissonance_level(10, Stage::Loop), 100);
        assert_eq!(dissonance_level(u32::MAX, Stage::Loop), 100);
    }

    #[test]
    fn transcript_format() {
        let mut session = Session::builder().seed(3).build().unwrap();
        assert_eq!(session.transcript(), "");
        session.respond("hi");
        let transcript = session.transcript();
        let entries: Vec<&str> = transcript.split("\n\nEcho [").collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].starts_with("You ["));
        assert!(entries[0].ends_with("] Normal:\nhi"));
        assert!(entries[1].contains("] Normal:\nBoot sequence complete."));
    }

    #[test]
    fn reset_clears_log_and_state() {
        let mut session = Session::builder().seed(5).build().unwrap();
        session.respond("tell me about the dream");
        assert_eq!(session.stage(), Stage::Glitch);
        session.reset();
        assert_eq!(session.stage(), Stage::Normal);
        assert_eq!(session.user_message_count(), 0);
        assert!(session.messages().is_empty());
        assert_eq!(session.script().cursor(Stage::Normal), 0);
        assert_eq!(session.memory().fragments().count(), 0);
    }
}
