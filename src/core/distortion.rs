/// Text distortion — the stage-gated glitch pass applied to replies.
use rand::rngs::StdRng;
use rand::Rng;
use tracing::trace;

use crate::core::config::DistortionTuning;
use crate::schema::emotion::GlitchState;
use crate::schema::stage::Stage;

const NOISE_GLYPHS: [char; 3] = ['█', '▒', '░'];
const FIGURE_SPACE: char = '\u{2007}';
const TRAILING_MARKER: &str = " ⧉";

/// Decides whether a reply glitches and corrupts it character by character.
#[derive(Debug, Clone)]
pub struct TextDistortionEngine {
    /// Trigger probability per stage, indexed by ordinal.
    triggers: [f64; Stage::COUNT],
}

impl Default for TextDistortionEngine {
    fn default() -> Self {
        Self::new(&DistortionTuning::default())
    }
}

impl TextDistortionEngine {
    pub fn new(tuning: &DistortionTuning) -> Self {
        Self {
            triggers: Stage::ALL.map(|stage| tuning.probability_for(stage)),
        }
    }

    pub fn trigger_probability(&self, stage: Stage) -> f64 {
        self.triggers[stage.ordinal()]
    }

    /// NORMAL never glitches. Other stages roll once against their
    /// trigger probability.
    pub fn evaluate(&self, stage: Stage, text: &str, rng: &mut StdRng) -> GlitchState {
        if stage == Stage::Normal {
            return GlitchState::inactive(text);
        }
        let roll: f64 = rng.gen();
        let threshold = self.trigger_probability(stage);
        trace!(stage = %stage, roll, threshold, "glitch roll");
        if roll >= threshold {
            return GlitchState::inactive(text);
        }
        GlitchState {
            active: true,
            rendered_text: distort(text, rng),
        }
    }
}

/// Corrupt `text`: random uppercasing, figure spaces, noise glyphs and an
/// optional trailing marker, then shout the whole thing.
pub fn distort(text: &str, rng: &mut StdRng) -> String {
    let mut out = String::with_capacity(text.len() + TRAILING_MARKER.len());
    for c in text.chars() {
        if c.is_alphabetic() && rng.gen_bool(0.5) {
            out.extend(c.to_uppercase());
        } else if c.is_whitespace() && rng.gen_range(0..4) == 0 {
            out.push(FIGURE_SPACE);
        } else if rng.gen_range(0..6) == 0 {
            out.push(NOISE_GLYPHS[rng.gen_range(0..NOISE_GLYPHS.len())]);
        } else {
            out.push(c);
        }
    }
    if rng.gen_bool(0.5) {
        out.push_str(TRAILING_MARKER);
    }
    out.to_uppercase()
}
