/// Dialogue orchestration: one user message in, one structured reply out.
///
/// Wires together the stage machine, script library, memory pool and
/// distortion pass. Holds no state of its own.
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::distortion::TextDistortionEngine;
use crate::core::memory::MemoryPool;
use crate::core::script::ScriptLibrary;
use crate::core::stage_machine::StageMachine;
use crate::schema::emotion::{EmotionState, GlitchState};
use crate::schema::message::{now_millis, Message, Sender};
use crate::schema::stage::Stage;

/// Everything produced for one reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueResult {
    /// The outgoing AI message, already distorted if the glitch fired.
    pub message: Message,
    pub glitch: GlitchState,
    pub emotion: EmotionState,
    /// Raw false-memory line, before joining and distortion.
    pub false_memory: Option<String>,
    /// Raw prediction line, before joining and distortion.
    pub prediction: Option<String>,
}

impl DialogueResult {
    pub fn stage(&self) -> Stage {
        self.message.stage_at_send()
    }
}

/// Borrowing coordinator over one conversation's components.
pub struct DialogueOrchestrator<'a> {
    pub stages: &'a mut StageMachine,
    pub script: &'a mut ScriptLibrary,
    pub memory: &'a mut MemoryPool,
    pub distortion: &'a TextDistortionEngine,
    pub rng: &'a mut StdRng,
}

impl DialogueOrchestrator<'_> {
    /// Produce Echo's reply to `user_text`. Never fails: every component
    /// has a literal fallback.
    pub fn build_response(&mut self, user_text: &str) -> DialogueResult {
        self.build_response_at(user_text, now_millis())
    }

    /// As [`build_response`](Self::build_response) with an explicit timestamp.
    pub fn build_response_at(&mut self, user_text: &str, timestamp_millis: i64) -> DialogueResult {
        // Snapshot an older fragment before this input joins the window.
        let recalled = self.memory.recall_fragment(self.rng).map(str::to_string);

        self.stages.register_user_message(user_text);
        let stage = self.stages.current_stage();
        self.memory.record_user_input(user_text);

        let mut lines = vec![self.script.compose(
            stage,
            user_text,
            self.stages.user_message_count(),
            recalled.as_deref(),
        )];

        let false_memory = self.memory.choose_false_memory(stage, user_text, self.rng);
        if let Some(ref memory) = false_memory {
            self.stages.mark_false_memory_shared();
            lines.push(memory.clone());
        }

        let prediction = self.memory.predict_next_thought(stage, self.rng);
        if let Some(ref p) = prediction {
            lines.push(p.clone());
        }

        let joined = lines.join("\n\n");
        let glitch = self.distortion.evaluate(stage, &joined, self.rng);
        trace!(
            stage = %stage,
            lines = lines.len(),
            glitched = glitch.active,
            "reply built"
        );

        let message = Message::new(
            Sender::Ai,
            glitch.rendered_text.clone(),
            glitch.active,
            timestamp_millis,
            stage,
        );

        DialogueResult {
            message,
            glitch,
            emotion: EmotionState::for_stage(stage),
            false_memory,
            prediction,
        }
    }
}
