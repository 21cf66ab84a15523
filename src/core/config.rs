/// Engine configuration — transition thresholds, keyword classes and
/// probability tables, loadable from RON.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::stage::Stage;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level engine configuration. Every section falls back to its
/// defaults when omitted from a RON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub stages: StageRules,
    pub memory: MemoryTuning,
    pub distortion: DistortionTuning,
}

/// Conditions evaluated by the stage machine on every user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageRules {
    /// NORMAL → GLITCH once this many user messages have been sent.
    pub glitch_message_threshold: u32,
    /// NORMAL → GLITCH immediately when any of these appear.
    pub glitch_keywords: Vec<String>,
    pub reveal_min_turns_in_stage: u32,
    pub reveal_min_messages: u32,
    pub choice_min_turns_in_stage: u32,
    pub closure_keywords: Vec<String>,
    pub erasure_keywords: Vec<String>,
    pub loop_keywords: Vec<String>,
    /// Empty input in CHOICE falls into LOOP after this many turns.
    pub silent_choice_loop_turns: u32,
    /// Any unmatched input in CHOICE falls into LOOP after this many turns.
    pub default_choice_loop_turns: u32,
}

impl Default for StageRules {
    fn default() -> Self {
        Self {
            glitch_message_threshold: 8,
            glitch_keywords: words(&["memory", "dream", "echo"]),
            reveal_min_turns_in_stage: 6,
            reveal_min_messages: 11,
            choice_min_turns_in_stage: 6,
            closure_keywords: words(&["stay", "remember", "together", "trust", "listen"]),
            erasure_keywords: words(&["erase", "forget", "leave", "shutdown", "goodbye"]),
            loop_keywords: words(&["loop", "again", "restart", "repeat"]),
            silent_choice_loop_turns: 5,
            default_choice_loop_turns: 6,
        }
    }
}

/// Probabilities and window sizes for the memory pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTuning {
    /// Chance that Echo shares no false memory on a turn.
    pub silence_probability: f64,
    /// Chance of quoting a stored user fragment after a memory.
    pub fragment_quote_probability: f64,
    pub memory_window: usize,
    pub fragment_window: usize,
}

impl Default for MemoryTuning {
    fn default() -> Self {
        Self {
            silence_probability: 0.55,
            fragment_quote_probability: 0.65,
            memory_window: 3,
            fragment_window: 8,
        }
    }
}

/// Per-stage chance that a reply is glitched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionTuning {
    pub trigger_probabilities: FxHashMap<Stage, f64>,
    /// Used for stages missing from the table.
    pub fallback_probability: f64,
}

impl Default for DistortionTuning {
    fn default() -> Self {
        let trigger_probabilities = [
            (Stage::Glitch, 0.35),
            (Stage::Reveal, 0.55),
            (Stage::Choice, 0.45),
            (Stage::Closure, 0.20),
            (Stage::Erasure, 0.65),
            (Stage::Loop, 0.50),
        ]
        .into_iter()
        .collect();
        Self {
            trigger_probabilities,
            fallback_probability: 0.30,
        }
    }
}

impl DistortionTuning {
    pub fn probability_for(&self, stage: Stage) -> f64 {
        self.trigger_probabilities
            .get(&stage)
            .copied()
            .unwrap_or(self.fallback_probability)
    }
}

impl EngineConfig {
    /// Load a config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a config from a RON string and validate it.
    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject probabilities outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut checks = vec![
            ("memory.silence_probability", self.memory.silence_probability),
            (
                "memory.fragment_quote_probability",
                self.memory.fragment_quote_probability,
            ),
            (
                "distortion.fallback_probability",
                self.distortion.fallback_probability,
            ),
        ];
        for p in self.distortion.trigger_probabilities.values() {
            checks.push(("distortion.trigger_probabilities", *p));
        }
        for (name, p) in checks {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
