/// Script library — per-stage narrative beats, keyword variants, cursor
/// bookkeeping and placeholder substitution.
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace};

use crate::content;
use crate::core::text::{focus_phrase, normalize};
use crate::schema::message::{Message, Sender};
use crate::schema::stage::Stage;

/// Substituted for `{{memory}}` when no fragment is supplied.
pub const FALLBACK_MEMORY: &str = "the silence you leave between keystrokes";

/// Placeholders [`ScriptLibrary::compose`] knows how to fill.
pub const KNOWN_PLACEHOLDERS: &[&str] = &["input", "count", "memory"];

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A keyword-conditioned alternative to a beat's default line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptVariant {
    /// Matched case-insensitively as substrings of the normalised input.
    pub keywords: FxHashSet<String>,
    pub line: String,
}

impl ScriptVariant {
    pub fn new(line: &str, keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.trim().to_lowercase()).collect(),
            line: line.to_string(),
        }
    }

    /// True if any non-empty keyword occurs in `normalized_input`.
    pub fn matches(&self, normalized_input: &str) -> bool {
        self.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && normalized_input.contains(&k))
    }
}

/// One scripted line of a stage, with optional keyword variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptBeat {
    pub default_line: String,
    /// Scanned in order; the first match wins.
    pub variants: Vec<ScriptVariant>,
}

impl ScriptBeat {
    pub fn single(line: &str) -> Self {
        Self {
            default_line: line.to_string(),
            variants: Vec::new(),
        }
    }

    pub fn with_variants(default_line: &str, variants: Vec<ScriptVariant>) -> Self {
        Self {
            default_line: default_line.to_string(),
            variants,
        }
    }

    /// Pick the line for this input, before placeholder substitution.
    pub fn render(&self, user_text: &str) -> &str {
        let normalized = normalize(user_text);
        self.variants
            .iter()
            .find(|v| v.matches(&normalized))
            .map(|v| v.line.as_str())
            .unwrap_or(self.default_line.as_str())
    }
}

/// Ordered beats for every stage plus a cursor per stage.
///
/// Tables are indexed by [`Stage::ordinal`] and never resized.
#[derive(Debug, Clone)]
pub struct ScriptLibrary {
    beats: [Vec<ScriptBeat>; Stage::COUNT],
    fallbacks: [String; Stage::COUNT],
    cursors: [usize; Stage::COUNT],
}

impl Default for ScriptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

// RON deserialization helpers — custom scripts use a flatter shape than
// the runtime types.

#[derive(Debug, Deserialize)]
struct RonScript {
    stages: FxHashMap<Stage, Vec<RonBeat>>,
    #[serde(default)]
    fallbacks: FxHashMap<Stage, String>,
}

#[derive(Debug, Deserialize)]
struct RonBeat {
    default: String,
    #[serde(default)]
    variants: Vec<RonVariant>,
}

#[derive(Debug, Deserialize)]
struct RonVariant {
    keywords: Vec<String>,
    line: String,
}

impl ScriptLibrary {
    /// Echo's built-in script.
    pub fn builtin() -> Self {
        Self::from_stages(Stage::ALL.map(|stage| (stage, content::script::stage_beats(stage))))
    }

    /// Build a library from per-stage beat lists. Stages not listed get
    /// no beats and answer with their built-in fallback line.
    pub fn from_stages(stages: impl IntoIterator<Item = (Stage, Vec<ScriptBeat>)>) -> Self {
        let mut beats: [Vec<ScriptBeat>; Stage::COUNT] = Default::default();
        for (stage, list) in stages {
            beats[stage.ordinal()] = list;
        }
        Self {
            beats,
            fallbacks: Stage::ALL.map(|stage| content::script::fallback_line(stage).to_string()),
            cursors: [0; Stage::COUNT],
        }
    }

    /// Replace the fallback line for a stage.
    pub fn set_fallback(&mut self, stage: Stage, line: impl Into<String>) {
        self.fallbacks[stage.ordinal()] = line.into();
    }

    /// Load a custom script from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<ScriptLibrary, ScriptError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a custom script from a RON string.
    pub fn parse_ron(input: &str) -> Result<ScriptLibrary, ScriptError> {
        let raw: RonScript = ron::from_str(input)?;

        let stages = raw.stages.into_iter().map(|(stage, beats)| {
            let beats = beats
                .into_iter()
                .map(|beat| {
                    let variants = beat
                        .variants
                        .into_iter()
                        .map(|v| {
                            let keywords: Vec<&str> = v.keywords.iter().map(String::as_str).collect();
                            ScriptVariant::new(&v.line, &keywords)
                        })
                        .collect();
                    ScriptBeat::with_variants(&beat.default, variants)
                })
                .collect();
            (stage, beats)
        });

        let mut library = Self::from_stages(stages);
        for (stage, line) in raw.fallbacks {
            library.set_fallback(stage, line);
        }
        Ok(library)
    }

    pub fn beats(&self, stage: Stage) -> &[ScriptBeat] {
        &self.beats[stage.ordinal()]
    }

    pub fn fallback_line(&self, stage: Stage) -> &str {
        &self.fallbacks[stage.ordinal()]
    }

    /// Index of the beat the next [`compose`](Self::compose) for `stage` will use.
    pub fn cursor(&self, stage: Stage) -> usize {
        self.cursors[stage.ordinal()]
    }

    /// Compose the next narrative line for `stage`, advancing its cursor.
    ///
    /// The cursor stops at the last beat, which then repeats for every
    /// later call in that stage.
    pub fn compose(
        &mut self,
        stage: Stage,
        user_text: &str,
        user_message_count: u32,
        memory_fragment: Option<&str>,
    ) -> String {
        let line = match self.take_beat(stage) {
            Some(index) => {
                trace!(stage = %stage, beat = index, "composing beat");
                self.beats[stage.ordinal()][index].render(user_text)
            }
            None => self.fallback_line(stage),
        };
        apply_placeholders(line, user_text, user_message_count, memory_fragment)
    }

    /// Resynchronise cursors with previously sent AI messages: reset,
    /// then advance once per AI message on the stage it was sent in.
    pub fn ingest_history<'a>(&mut self, history: impl IntoIterator<Item = &'a Message>) {
        self.reset();
        for message in history {
            if message.sender() == Sender::Ai {
                self.take_beat(message.stage_at_send());
            }
        }
    }

    pub fn reset(&mut self) {
        self.cursors = [0; Stage::COUNT];
    }

    /// Stages whose beat list is empty.
    pub fn stages_without_beats(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| self.beats(*stage).is_empty())
            .collect()
    }

    /// Return the beat index to use for `stage` and advance its cursor,
    /// pinned at the last beat. `None` if the stage has no beats.
    fn take_beat(&mut self, stage: Stage) -> Option<usize> {
        let len = self.beats[stage.ordinal()].len();
        if len == 0 {
            return None;
        }
        let cursor = &mut self.cursors[stage.ordinal()];
        let index = (*cursor).min(len - 1);
        if index < len - 1 {
            *cursor = index + 1;
        } else {
            if *cursor != index {
                debug!(stage = %stage, beat = index, "cursor pinned at final beat");
            }
            *cursor = index;
        }
        Some(index)
    }
}

/// Fill `{{input}}`, `{{count}}` and `{{memory}}` in a script line.
pub fn apply_placeholders(
    line: &str,
    user_text: &str,
    user_message_count: u32,
    memory_fragment: Option<&str>,
) -> String {
    let memory = memory_fragment
        .filter(|m| !m.is_empty())
        .unwrap_or(FALLBACK_MEMORY);
    line.replace("{{input}}", &focus_phrase(user_text))
        .replace("{{count}}", &user_message_count.max(1).to_string())
        .replace("{{memory}}", memory)
}

/// Names of the `{{name}}` placeholders in `line`, in order of appearance.
pub fn placeholders(line: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                names.push(after[..end].trim());
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    names
}
