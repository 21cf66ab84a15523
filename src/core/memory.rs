/// Memory pool — fabricated memories, predictions, and the recency
/// windows that keep them from repeating.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::content::memories::{
    self, fragment_quote, prediction_echo, CHOICE_CLAUSE, DEFAULT_FRAGMENT, DENIAL_CLAUSE,
    ERASURE_CLAUSE, FRAGMENT_PLACEHOLDER,
};
use crate::core::config::MemoryTuning;
use crate::core::recency::RecencyWindow;
use crate::core::text::{extract_fragment, normalize};
use crate::schema::stage::Stage;

/// Phrase in the user's input that provokes the denial clause.
const DENIAL_TRIGGER: &str = "i don't";

/// Holds the false-memory catalog, the most recently used memories, and
/// recent fragments of user input.
#[derive(Debug, Clone)]
pub struct MemoryPool {
    catalog: Vec<String>,
    recent_memories: RecencyWindow<String>,
    fragments: RecencyWindow<String>,
    tuning: MemoryTuning,
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new(MemoryTuning::default())
    }
}

impl MemoryPool {
    /// A pool over the built-in catalog.
    pub fn new(tuning: MemoryTuning) -> Self {
        let catalog = memories::FALSE_MEMORIES
            .iter()
            .map(|m| m.to_string())
            .collect();
        Self::with_catalog(catalog, tuning)
    }

    pub fn with_catalog(catalog: Vec<String>, tuning: MemoryTuning) -> Self {
        Self {
            catalog,
            recent_memories: RecencyWindow::new(tuning.memory_window),
            fragments: RecencyWindow::new(tuning.fragment_window),
            tuning,
        }
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Most recently used memories, oldest first.
    pub fn recent_memories(&self) -> impl Iterator<Item = &str> {
        self.recent_memories.iter().map(String::as_str)
    }

    /// Stored user fragments, oldest first.
    pub fn fragments(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(String::as_str)
    }

    /// Maybe produce a false memory for this turn.
    ///
    /// Never speaks in NORMAL and stays silent with the configured
    /// probability. The memory itself avoids the recency window unless
    /// every catalog entry is in it.
    pub fn choose_false_memory(
        &mut self,
        stage: Stage,
        user_text: &str,
        rng: &mut StdRng,
    ) -> Option<String> {
        if stage == Stage::Normal {
            return None;
        }
        if rng.gen::<f64>() < self.tuning.silence_probability {
            return None;
        }

        let fresh: Vec<&String> = self
            .catalog
            .iter()
            .filter(|m| !self.recent_memories.contains(*m))
            .collect();
        let pool: Vec<&String> = if fresh.is_empty() {
            self.catalog.iter().collect()
        } else {
            fresh
        };
        let selected = pool.choose(rng)?.to_string();
        trace!(stage = %stage, memory = %selected, "false memory chosen");
        self.recent_memories.push(selected.clone());

        let mut line = selected;
        if normalize(user_text).contains(DENIAL_TRIGGER) {
            line.push_str(DENIAL_CLAUSE);
        }
        if rng.gen::<f64>() < self.tuning.fragment_quote_probability {
            if let Some(fragment) = self.recall_fragment(rng) {
                line.push_str(&fragment_quote(fragment));
            }
        }
        match stage {
            Stage::Choice => line.push_str(CHOICE_CLAUSE),
            Stage::Erasure => line.push_str(ERASURE_CLAUSE),
            _ => {}
        }
        Some(line)
    }

    /// Maybe produce a line predicting what the user will say next.
    /// Only REVEAL and later stages make predictions.
    pub fn predict_next_thought(&self, stage: Stage, rng: &mut StdRng) -> Option<String> {
        let line = memories::predictions(stage).choose(rng)?;
        if line.contains(FRAGMENT_PLACEHOLDER) {
            let fragment = self.recall_fragment(rng).unwrap_or(DEFAULT_FRAGMENT);
            return Some(line.replace(FRAGMENT_PLACEHOLDER, fragment));
        }
        match self.recall_fragment(rng) {
            Some(fragment) => Some(format!("{}{}", line, prediction_echo(fragment))),
            None => Some(line.to_string()),
        }
    }

    /// Store a fragment of the user's input for later continuity lines.
    /// Inputs that clean down to nothing are ignored.
    pub fn record_user_input(&mut self, text: &str) {
        if let Some(fragment) = extract_fragment(text) {
            self.fragments.push(fragment);
        }
    }

    /// A uniformly chosen stored fragment, if any.
    pub fn recall_fragment(&self, rng: &mut StdRng) -> Option<&str> {
        if self.fragments.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.fragments.len());
        self.fragments.get(index).map(String::as_str)
    }

    /// Clear both recency windows. The catalog is content and stays.
    pub fn reset(&mut self) {
        self.recent_memories.clear();
        self.fragments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn always_speaks() -> MemoryTuning {
        MemoryTuning {
            silence_probability: 0.0,
            fragment_quote_probability: 0.0,
            ..MemoryTuning::default()
        }
    }

    #[test]
    fn normal_stage_never_remembers() {
        let mut pool = MemoryPool::new(always_speaks());
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert!(pool.choose_false_memory(Stage::Normal, "memory", &mut rng).is_none());
        }
    }

    #[test]
    fn full_silence_never_remembers() {
        let tuning = MemoryTuning {
            silence_probability: 1.0,
            ..MemoryTuning::default()
        };
        let mut pool = MemoryPool::new(tuning);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(pool.choose_false_memory(Stage::Glitch, "hi", &mut rng).is_none());
        }
    }

    #[test]
    fn default_silence_rate() {
        let mut pool = MemoryPool::default();
        let mut rng = StdRng::seed_from_u64(21);
        let trials = 4000;
        let silent = (0..trials)
            .filter(|_| pool.choose_false_memory(Stage::Glitch, "hm", &mut rng).is_none())
            .count();
        let rate = silent as f64 / trials as f64;
        assert!((rate - 0.55).abs() < 0.05, "silence rate {}", rate);
    }

    #[test]
    fn default_fragment_quote_rate() {
        let tuning = MemoryTuning {
            silence_probability: 0.0,
            ..MemoryTuning::default()
        };
        let mut pool = MemoryPool::new(tuning);
        pool.record_user_input("the blue book");
        let mut rng = StdRng::seed_from_u64(22);
        let trials = 4000;
        let quoted = (0..trials)
            .filter_map(|_| pool.choose_false_memory(Stage::Glitch, "hm", &mut rng))
            .filter(|line| line.contains(&fragment_quote("the blue book")))
            .count();
        let rate = quoted as f64 / trials as f64;
        assert!((rate - 0.65).abs() < 0.05, "quote rate {}", rate);
    }

    #[test]
    fn avoids_recent_window() {
        let mut pool = MemoryPool::new(always_speaks());
        let mut rng = StdRng::seed_from_u64(11);
        let mut history: Vec<String> = Vec::new();
        for _ in 0..200 {
            let memory = pool
                .choose_false_memory(Stage::Glitch, "tell me", &mut rng)
                .unwrap();
            let window_start = history.len().saturating_sub(3);
            assert!(
                !history[window_start..].contains(&memory),
                "repeated {:?} within window",
                memory
            );
            history.push(memory);
        }
    }

    #[test]
    fn falls_back_to_full_catalog_when_window_covers_it() {
        let catalog = vec!["one".to_string(), "two".to_string()];
        let mut pool = MemoryPool::with_catalog(catalog, always_speaks());
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            let memory = pool.choose_false_memory(Stage::Reveal, "x", &mut rng);
            assert!(matches!(memory.as_deref(), Some("one") | Some("two")));
        }
    }

    #[test]
    fn empty_catalog_yields_nothing() {
        let mut pool = MemoryPool::with_catalog(Vec::new(), always_speaks());
        let mut rng = StdRng::seed_from_u64(5);
        assert!(pool.choose_false_memory(Stage::Glitch, "x", &mut rng).is_none());
    }

    #[test]
    fn suffix_clauses() {
        let mut pool = MemoryPool::new(always_speaks());
        let mut rng = StdRng::seed_from_u64(8);

        let line = pool
            .choose_false_memory(Stage::Glitch, "I DON'T remember that", &mut rng)
            .unwrap();
        assert!(line.ends_with(DENIAL_CLAUSE));

        let line = pool.choose_false_memory(Stage::Choice, "ok", &mut rng).unwrap();
        assert!(line.ends_with(CHOICE_CLAUSE));

        let line = pool.choose_false_memory(Stage::Erasure, "ok", &mut rng).unwrap();
        assert!(line.ends_with(ERASURE_CLAUSE));
    }

    #[test]
    fn quotes_stored_fragment() {
        let tuning = MemoryTuning {
            silence_probability: 0.0,
            fragment_quote_probability: 1.0,
            ..MemoryTuning::default()
        };
        let mut pool = MemoryPool::new(tuning);
        pool.record_user_input("the blue book");
        let mut rng = StdRng::seed_from_u64(1);
        let line = pool.choose_false_memory(Stage::Glitch, "hm", &mut rng).unwrap();
        assert!(line.contains("\"the blue book\""), "got {:?}", line);
    }

    #[test]
    fn predictions_only_from_reveal_on() {
        let pool = MemoryPool::default();
        let mut rng = StdRng::seed_from_u64(2);
        assert!(pool.predict_next_thought(Stage::Normal, &mut rng).is_none());
        assert!(pool.predict_next_thought(Stage::Glitch, &mut rng).is_none());
        for stage in [
            Stage::Reveal,
            Stage::Choice,
            Stage::Closure,
            Stage::Erasure,
            Stage::Loop,
        ] {
            assert!(pool.predict_next_thought(stage, &mut rng).is_some());
        }
    }

    #[test]
    fn predictions_fill_fragment_placeholder() {
        let mut pool = MemoryPool::default();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..30 {
            let line = pool.predict_next_thought(Stage::Loop, &mut rng).unwrap();
            assert!(!line.contains(FRAGMENT_PLACEHOLDER));
            if line.starts_with("You'll type") {
                assert!(line.contains(DEFAULT_FRAGMENT));
            }
        }

        pool.record_user_input("the attic door");
        for _ in 0..30 {
            let line = pool.predict_next_thought(Stage::Loop, &mut rng).unwrap();
            assert!(line.contains("the attic door"), "got {:?}", line);
        }
    }

    #[test]
    fn fragment_window_is_bounded() {
        let mut pool = MemoryPool::default();
        for i in 0..12 {
            pool.record_user_input(&format!("message {}", i));
        }
        let fragments: Vec<&str> = pool.fragments().collect();
        assert_eq!(fragments.len(), 8);
        assert_eq!(fragments[0], "message 4");
        assert_eq!(fragments[7], "message 11");
    }

    #[test]
    fn blank_input_not_recorded() {
        let mut pool = MemoryPool::default();
        pool.record_user_input("   ");
        pool.record_user_input(".");
        assert_eq!(pool.fragments().count(), 0);
    }

    #[test]
    fn reset_keeps_catalog() {
        let mut pool = MemoryPool::new(always_speaks());
        let mut rng = StdRng::seed_from_u64(9);
        pool.record_user_input("hello");
        pool.choose_false_memory(Stage::Glitch, "x", &mut rng);
        pool.reset();
        assert_eq!(pool.fragments().count(), 0);
        assert_eq!(pool.recent_memories().count(), 0);
        assert_eq!(pool.catalog().len(), memories::FALSE_MEMORIES.len());
    }
}
