use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// Pacing and tone for a reply. A pure function of the stage.
///
/// `typing_delay_millis` is output data only: the presentation layer
/// waits this long before showing the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionState {
    pub typing_delay_millis: u64,
    pub tone_label: String,
}

impl EmotionState {
    pub fn for_stage(stage: Stage) -> Self {
        let (typing_delay_millis, tone) = match stage {
            Stage::Normal => (450, "CALM"),
            Stage::Glitch => (700, "DISSONANT"),
            Stage::Reveal => (900, "OMNISCIENT"),
            Stage::Choice => (820, "INSISTENT"),
            Stage::Closure => (650, "RESOLVED"),
            Stage::Erasure => (1000, "FRAYED"),
            Stage::Loop => (780, "RECURSIVE"),
        };
        Self {
            typing_delay_millis,
            tone_label: tone.to_string(),
        }
    }
}

/// Outcome of the glitch pass over a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlitchState {
    pub active: bool,
    /// Equal to the input text verbatim when `active` is false.
    pub rendered_text: String,
}

impl GlitchState {
    pub fn inactive(text: &str) -> Self {
        Self {
            active: false,
            rendered_text: text.to_string(),
        }
    }
}
