/// Stage state machine — message counters, transition rules and the
/// terminal lock.
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::StageRules;
use crate::core::text::{contains_any, normalize};
use crate::schema::stage::Stage;

/// Counters owned by the stage machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversationCounters {
    /// User turns since the last reset.
    pub user_message_count: u32,
    /// Value of `user_message_count` when the current stage was entered.
    pub stage_entry_message_count: u32,
    pub first_false_memory_shared: bool,
    /// True iff the current stage is terminal.
    pub stage_locked: bool,
}

/// Tracks the narrative stage and advances it as user messages arrive.
///
/// At most one transition happens per message, stages only move forward,
/// and a terminal stage stays put until [`StageMachine::reset`]. The one
/// backward move is the rollback in
/// [`StageMachine::force_false_memory_flag`].
#[derive(Debug, Clone)]
pub struct StageMachine {
    stage: Stage,
    counters: ConversationCounters,
    rules: StageRules,
}

impl Default for StageMachine {
    fn default() -> Self {
        Self::new(StageRules::default())
    }
}

impl StageMachine {
    pub fn new(rules: StageRules) -> Self {
        Self {
            stage: Stage::Normal,
            counters: ConversationCounters::default(),
            rules,
        }
    }

    pub fn current_stage(&self) -> Stage {
        self.stage
    }

    pub fn user_message_count(&self) -> u32 {
        self.counters.user_message_count
    }

    pub fn counters(&self) -> ConversationCounters {
        self.counters
    }

    pub fn is_locked(&self) -> bool {
        self.counters.stage_locked
    }

    pub fn false_memory_shared(&self) -> bool {
        self.counters.first_false_memory_shared
    }

    /// User turns since the current stage was entered.
    pub fn turns_in_stage(&self) -> u32 {
        self.counters
            .user_message_count
            .saturating_sub(self.counters.stage_entry_message_count)
    }

    /// Count one user message and apply the first matching transition.
    pub fn register_user_message(&mut self, text: &str) {
        self.counters.user_message_count = self.counters.user_message_count.saturating_add(1);
        if self.counters.stage_locked {
            return;
        }
        if let Some(next) = self.next_stage(text) {
            self.enter_stage(next);
        }
    }

    /// Record that a fabricated memory reached the user.
    pub fn mark_false_memory_shared(&mut self) {
        self.counters.first_false_memory_shared = true;
    }

    /// Overwrite the memory flag. Clearing it while past GLITCH rolls the
    /// stage back to GLITCH and unlocks, since later stages require a
    /// delivered memory.
    pub fn force_false_memory_flag(&mut self, shared: bool) {
        self.counters.first_false_memory_shared = shared;
        if !shared && self.stage > Stage::Glitch {
            warn!(
                from = %self.stage,
                "false-memory flag cleared past GLITCH, rolling stage back"
            );
            self.enter_stage(Stage::Glitch);
        }
    }

    /// Restore persisted values. The stage counts as entered at the
    /// restored message count.
    pub fn restore(&mut self, stage: Stage, user_message_count: u32, false_memory_shared: bool) {
        self.counters = ConversationCounters {
            user_message_count,
            stage_entry_message_count: user_message_count,
            first_false_memory_shared: false_memory_shared,
            stage_locked: stage.is_terminal(),
        };
        self.stage = stage;
    }

    pub fn reset(&mut self) {
        self.stage = Stage::Normal;
        self.counters = ConversationCounters::default();
    }

    fn next_stage(&self, text: &str) -> Option<Stage> {
        let rules = &self.rules;
        let count = self.counters.user_message_count;
        let turns = self.turns_in_stage();
        let shared = self.counters.first_false_memory_shared;

        match self.stage {
            Stage::Normal => {
                let triggered = count >= rules.glitch_message_threshold
                    || contains_any(&normalize(text), &rules.glitch_keywords);
                triggered.then_some(Stage::Glitch)
            }
            Stage::Glitch => (shared
                && turns >= rules.reveal_min_turns_in_stage
                && count >= rules.reveal_min_messages)
                .then_some(Stage::Reveal),
            Stage::Reveal => {
                (shared && turns >= rules.choice_min_turns_in_stage).then_some(Stage::Choice)
            }
            Stage::Choice => self.resolve_choice(text, turns),
            Stage::Closure | Stage::Erasure | Stage::Loop => None,
        }
    }

    fn resolve_choice(&self, text: &str, turns: u32) -> Option<Stage> {
        let rules = &self.rules;
        let normalized = normalize(text);

        if contains_any(&normalized, &rules.closure_keywords) {
            Some(Stage::Closure)
        } else if contains_any(&normalized, &rules.erasure_keywords) {
            Some(Stage::Erasure)
        } else if contains_any(&normalized, &rules.loop_keywords) {
            Some(Stage::Loop)
        } else if normalized.is_empty() {
            (turns >= rules.silent_choice_loop_turns).then_some(Stage::Loop)
        } else {
            (turns >= rules.default_choice_loop_turns).then_some(Stage::Loop)
        }
    }

    fn enter_stage(&mut self, next: Stage) {
        debug!(
            from = %self.stage,
            to = %next,
            messages = self.counters.user_message_count,
            turns_in_stage = self.turns_in_stage(),
            "stage transition"
        );
        self.stage = next;
        self.counters.stage_entry_message_count = self.counters.user_message_count;
        self.counters.stage_locked = next.is_terminal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_at(stage: Stage, count: u32, shared: bool) -> StageMachine {
        let mut m = StageMachine::default();
        m.restore(stage, count, shared);
        m
    }

    #[test]
    fn starts_normal_and_unlocked() {
        let m = StageMachine::default();
        assert_eq!(m.current_stage(), Stage::Normal);
        assert_eq!(m.user_message_count(), 0);
        assert!(!m.is_locked());
        assert!(!m.false_memory_shared());
    }

    #[test]
    fn glitch_after_eight_plain_messages() {
        let mut m = StageMachine::default();
        for i in 1..=7 {
            m.register_user_message("hello there");
            assert_eq!(m.current_stage(), Stage::Normal, "message {}", i);
        }
        m.register_user_message("hello there");
        assert_eq!(m.current_stage(), Stage::Glitch);
        assert_eq!(m.turns_in_stage(), 0);
    }

    #[test]
    fn glitch_keywords_trigger_immediately() {
        for text in ["I had a DREAM", "my memory is odd", "Echo?"] {
            let mut m = StageMachine::default();
            m.register_user_message(text);
            assert_eq!(m.current_stage(), Stage::Glitch, "input {:?}", text);
        }
    }

    #[test]
    fn reveal_needs_memory_turns_and_count() {
        // entered GLITCH at message 1 via keyword
        let mut m = StageMachine::default();
        m.register_user_message("dream");
        for _ in 0..6 {
            m.register_user_message("go on");
        }
        // 7 messages, 6 turns, but no memory shared
        assert_eq!(m.current_stage(), Stage::Glitch);

        m.mark_false_memory_shared();
        for _ in 0..3 {
            m.register_user_message("go on");
            assert_eq!(m.current_stage(), Stage::Glitch);
        }
        m.register_user_message("go on");
        assert_eq!(m.user_message_count(), 11);
        assert_eq!(m.current_stage(), Stage::Reveal);
    }

    #[test]
    fn choice_after_six_turns_in_reveal() {
        let mut m = machine_at(Stage::Reveal, 12, true);
        for _ in 0..5 {
            m.register_user_message("and then?");
            assert_eq!(m.current_stage(), Stage::Reveal);
        }
        m.register_user_message("and then?");
        assert_eq!(m.current_stage(), Stage::Choice);
    }

    #[test]
    fn choice_keyword_classes() {
        let cases = [
            ("I want to stay with you", Stage::Closure),
            ("please forget me", Stage::Erasure),
            ("let's loop again", Stage::Loop),
            ("I trust you", Stage::Closure),
            ("shutdown now", Stage::Erasure),
            ("restart", Stage::Loop),
        ];
        for (text, expected) in cases {
            let mut m = machine_at(Stage::Choice, 20, true);
            m.register_user_message(text);
            assert_eq!(m.current_stage(), expected, "input {:?}", text);
            assert!(m.is_locked());
        }
    }

    #[test]
    fn closure_class_wins_over_erasure() {
        let mut m = machine_at(Stage::Choice, 20, true);
        m.register_user_message("I won't forget, I'll stay");
        assert_eq!(m.current_stage(), Stage::Closure);
    }

    #[test]
    fn undecided_choice_falls_into_loop() {
        let mut m = machine_at(Stage::Choice, 20, true);
        for _ in 0..5 {
            m.register_user_message("hmm");
            assert_eq!(m.current_stage(), Stage::Choice);
        }
        m.register_user_message("hmm");
        assert_eq!(m.current_stage(), Stage::Loop);
    }

    #[test]
    fn silent_choice_loops_sooner() {
        let mut m = machine_at(Stage::Choice, 20, true);
        for _ in 0..4 {
            m.register_user_message("   ");
            assert_eq!(m.current_stage(), Stage::Choice);
        }
        m.register_user_message("");
        assert_eq!(m.current_stage(), Stage::Loop);
    }

    #[test]
    fn terminal_stage_is_locked() {
        let mut m = machine_at(Stage::Choice, 20, true);
        m.register_user_message("goodbye");
        assert_eq!(m.current_stage(), Stage::Erasure);
        for text in ["stay", "loop again", "dream", "memory"] {
            m.register_user_message(text);
            assert_eq!(m.current_stage(), Stage::Erasure);
        }
        assert_eq!(m.user_message_count(), 25);
    }

    #[test]
    fn clearing_flag_rolls_back_to_glitch() {
        let mut m = machine_at(Stage::Closure, 30, true);
        assert!(m.is_locked());
        m.force_false_memory_flag(false);
        assert_eq!(m.current_stage(), Stage::Glitch);
        assert!(!m.is_locked());
        assert!(!m.false_memory_shared());
        assert_eq!(m.turns_in_stage(), 0);
    }

    #[test]
    fn clearing_flag_in_glitch_keeps_stage() {
        let mut m = machine_at(Stage::Glitch, 9, true);
        m.force_false_memory_flag(false);
        assert_eq!(m.current_stage(), Stage::Glitch);
        m.force_false_memory_flag(true);
        assert!(m.false_memory_shared());
    }

    #[test]
    fn message_count_saturates() {
        let mut m = machine_at(Stage::Erasure, u32::MAX, true);
        m.register_user_message("still here");
        assert_eq!(m.user_message_count(), u32::MAX);
        assert_eq!(m.current_stage(), Stage::Erasure);
    }

    #[test]
    fn reset_clears_everything() {
        let mut m = machine_at(Stage::Loop, 40, true);
        m.reset();
        assert_eq!(m.current_stage(), Stage::Normal);
        assert_eq!(m.counters(), ConversationCounters::default());
    }

    #[test]
    fn custom_rules_change_thresholds() {
        let rules = StageRules {
            glitch_message_threshold: 2,
            ..StageRules::default()
        };
        let mut m = StageMachine::new(rules);
        m.register_user_message("hi");
        assert_eq!(m.current_stage(), Stage::Normal);
        m.register_user_message("hi");
        assert_eq!(m.current_stage(), Stage::Glitch);
    }
}
