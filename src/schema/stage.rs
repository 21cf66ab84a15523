use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete phase of Echo's scripted narrative.
///
/// Stages are ordered. The engine only moves forward through
/// `Normal → Glitch → Reveal → Choice → {Closure | Erasure | Loop}`;
/// the last three are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Normal,
    Glitch,
    Reveal,
    Choice,
    Closure,
    Erasure,
    Loop,
}

impl Stage {
    /// Number of stages; per-stage tables are arrays of this length.
    pub const COUNT: usize = 7;

    /// Every stage in narrative order.
    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::Normal,
        Stage::Glitch,
        Stage::Reveal,
        Stage::Choice,
        Stage::Closure,
        Stage::Erasure,
        Stage::Loop,
    ];

    /// Position in the narrative order (`Normal` = 0 … `Loop` = 6).
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Terminal stages lock the state machine until reset.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closure | Self::Erasure | Self::Loop)
    }

    /// Persisted name, e.g. `"GLITCH"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Glitch => "GLITCH",
            Self::Reveal => "REVEAL",
            Self::Choice => "CHOICE",
            Self::Closure => "CLOSURE",
            Self::Erasure => "ERASURE",
            Self::Loop => "LOOP",
        }
    }

    /// Human-facing label, e.g. `"Glitch"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Glitch => "Glitch",
            Self::Reveal => "Reveal",
            Self::Choice => "Choice",
            Self::Closure => "Closure",
            Self::Erasure => "Erasure",
            Self::Loop => "Loop",
        }
    }

    /// Parse a persisted stage name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Stage> {
        let name = name.trim();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
