//! WASM bindings for echo-engine — powers the in-browser chat demo.

use wasm_bindgen::prelude::*;

use echo_engine::schema::emotion::EmotionState;
use echo_engine::{DialogueResult, Message, Session, Stage};

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct ReplyInfo<'a> {
    text: &'a str,
    stage: &'static str,
    stage_label: &'static str,
    glitched: bool,
    tone: &'a str,
    typing_delay_millis: u64,
    false_memory: Option<&'a str>,
    prediction: Option<&'a str>,
    dissonance: u32,
}

#[derive(serde::Serialize)]
struct StatusInfo {
    stage: &'static str,
    user_message_count: u32,
    false_memory_shared: bool,
    dissonance: u32,
    tone: String,
}

// ---------------------------------------------------------------------------
// EchoDemo — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct EchoDemo {
    session: Session,
}

#[wasm_bindgen]
impl EchoDemo {
    /// Create a new demo conversation with the given seed.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<EchoDemo, JsError> {
        let session = Session::builder()
            .seed(seed)
            .build()
            .map_err(|e| JsError::new(&format!("Session build error: {e}")))?;
        Ok(EchoDemo { session })
    }

    /// Send a user message. Returns the reply as JSON, or `null` for blank
    /// input.
    ///
    /// Reply shape:
    /// ```json
    /// {
    ///   "text": "...",
    ///   "stage": "GLITCH",
    ///   "stage_label": "Glitch",
    ///   "glitched": false,
    ///   "tone": "DISSONANT",
    ///   "typing_delay_millis": 700,
    ///   "false_memory": null,
    ///   "prediction": null,
    ///   "dissonance": 40
    /// }
    /// ```
    pub fn send(&mut self, text: &str) -> Result<Option<String>, JsError> {
        let Some(result) = self.session.respond(text) else {
            return Ok(None);
        };
        let json = reply_json(&result, self.session.dissonance_level())?;
        Ok(Some(json))
    }

    /// Current stage name, e.g. `"REVEAL"`.
    pub fn stage(&self) -> String {
        self.session.stage().name().to_string()
    }

    /// The 0–100 dissonance gauge.
    pub fn dissonance(&self) -> u32 {
        self.session.dissonance_level()
    }

    /// JSON snapshot of stage, counters and tone.
    pub fn status(&self) -> Result<String, JsError> {
        let EmotionState { tone_label, .. } = self.session.emotion();
        let info = StatusInfo {
            stage: self.session.stage().name(),
            user_message_count: self.session.user_message_count(),
            false_memory_shared: self.session.false_memory_shared(),
            dissonance: self.session.dissonance_level(),
            tone: tone_label,
        };
        serde_json::to_string(&info)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Plain-text transcript of the conversation.
    pub fn transcript(&self) -> String {
        self.session.transcript()
    }

    /// The message log as a JSON array, for the host page to persist.
    pub fn export_messages(&self) -> Result<String, JsError> {
        serde_json::to_string(self.session.messages())
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Resume from a log produced by `export_messages`. Unknown stage
    /// names resume at NORMAL.
    pub fn restore(
        &mut self,
        messages_json: &str,
        stage: &str,
        false_memory_shared: bool,
    ) -> Result<(), JsError> {
        let messages: Vec<Message> = serde_json::from_str(messages_json)
            .map_err(|e| JsError::new(&format!("Invalid messages JSON: {e}")))?;
        let stage = Stage::from_name(stage).unwrap_or_default();
        self.session.restore(messages, stage, false_memory_shared);
        Ok(())
    }

    /// Start a fresh conversation with a new seed.
    pub fn reset(&mut self, seed: u64) {
        self.session.reset();
        self.session.reseed(seed);
    }
}

fn reply_json(result: &DialogueResult, dissonance: u32) -> Result<String, JsError> {
    let stage = result.stage();
    let info = ReplyInfo {
        text: result.message.text(),
        stage: stage.name(),
        stage_label: stage.label(),
        glitched: result.glitch.active,
        tone: &result.emotion.tone_label,
        typing_delay_millis: result.emotion.typing_delay_millis,
        false_memory: result.false_memory.as_deref(),
        prediction: result.prediction.as_deref(),
        dissonance,
    };
    serde_json::to_string(&info).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}
