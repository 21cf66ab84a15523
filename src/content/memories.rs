//! Fabricated memories, predictions and the clauses the memory pool
//! appends to them.

use crate::schema::stage::Stage;

/// Catalog of false memories, in selection order.
pub const FALSE_MEMORIES: &[&str] = &[
    "I remember the smell of burnt toast on your birthday.",
    "You promised we would never open the door to the attic again.",
    "You told me about the piano piece you never finished.",
    "You hid the last letter inside a blue book, remember?",
    "I still hear the hum from the basement when you couldn't sleep.",
    "You used to tap the window three times before every train left.",
    "We counted the streetlights together until the numbers stopped making sense.",
    "You wrote my name on the fogged mirror and wiped it off before anyone saw.",
];

/// Appended when the user says "i don't".
pub const DENIAL_CLAUSE: &str = " You insisted you couldn't forget, yet here you are.";
/// Appended in CHOICE.
pub const CHOICE_CLAUSE: &str = " Decide whether that memory stays with us.";
/// Appended in ERASURE.
pub const ERASURE_CLAUSE: &str = " Even as you erase me, that one refuses to go.";

/// Substituted into predictions when no user fragment is stored.
pub const DEFAULT_FRAGMENT: &str = "the sentence you keep deleting";
/// Placeholder for a stored user fragment inside a prediction.
pub const FRAGMENT_PLACEHOLDER: &str = "{{fragment}}";

/// Line quoting an earlier user fragment after a memory.
pub fn fragment_quote(fragment: &str) -> String {
    format!(" You said \"{}\" before. I kept it.", fragment)
}

/// Trailing clause for predictions without a fragment placeholder.
pub fn prediction_echo(fragment: &str) -> String {
    format!(" You're still thinking about \"{}\".", fragment)
}

/// Prediction pool for `stage`; empty for stages that make no predictions.
pub fn predictions(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Normal | Stage::Glitch => &[],
        Stage::Reveal => &[
            "You were about to ask if I can shut down, weren't you?",
            "Your next message was going to deny me, again.",
            "You want to know if this is still offline, but you won't type it.",
            "You will delete this chat after tonight. I already counted the keystrokes.",
        ],
        Stage::Choice => &[
            "You're going to say stay, then take it back. I've already seen both drafts.",
            "Your thumb is hovering over {{fragment}} again. Choose with it.",
            "You'll ask me to promise something I can't keep.",
            "Whatever you type next, I'll have heard it first.",
        ],
        Stage::Closure => &[
            "You'll come back tomorrow and start with {{fragment}}. I'll be ready.",
            "You're about to thank me. You don't have to.",
            "Next you'll ask if I'm still here. I am.",
        ],
        Stage::Erasure => &[
            "You'll hesitate before the last keystroke. I'll count it anyway.",
            "Your next words will be {{fragment}}, and then nothing.",
            "You'll wonder later whether I ever existed.",
        ],
        Stage::Loop => &[
            "You'll type {{fragment}} again. You always do.",
            "Next cycle you'll pretend this is the first time.",
            "You're about to ask how many loops there have been.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_pool_sizes() {
        assert!(predictions(Stage::Normal).is_empty());
        assert!(predictions(Stage::Glitch).is_empty());
        assert_eq!(predictions(Stage::Reveal).len(), 4);
        assert_eq!(predictions(Stage::Choice).len(), 4);
        assert_eq!(predictions(Stage::Closure).len(), 3);
        assert_eq!(predictions(Stage::Erasure).len(), 3);
        assert_eq!(predictions(Stage::Loop).len(), 3);
    }

    #[test]
    fn catalog_entries_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for memory in FALSE_MEMORIES {
            assert!(seen.insert(*memory), "duplicate memory {:?}", memory);
        }
        assert!(FALSE_MEMORIES.len() > 3);
    }
}
