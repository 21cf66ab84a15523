/// Metro session — plays a scripted conversation from first contact to an
/// ending and prints every turn.
///
/// Usage: cargo run --example metro_session [seed]

use echo_engine::{DialogueResult, Session, Stage};

const OPENING: &[&str] = &[
    "hello? is anyone on this train",
    "who am I talking to",
    "I can't find the exit",
    "it feels like a dream",
    "I don't remember any attic",
    "why does the hallway keep changing",
];

/// Sent until Echo reaches CHOICE.
const DRIFT: &[&str] = &[
    "tell me more",
    "what else do you remember",
    "the lights are flickering",
    "I'm not sure I believe you",
];

const DECISION: &str = "I'll stay and listen";

/// Safety cap so an unlucky seed can't spin forever.
const MAX_TURNS: usize = 80;

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);

    let mut session = match Session::builder().seed(seed).build() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("=== Metro session (seed {}) ===\n", seed);

    let mut turn = 0;
    while turn < MAX_TURNS && !session.stage().is_terminal() {
        let text = if turn < OPENING.len() {
            OPENING[turn]
        } else if session.stage() == Stage::Choice {
            DECISION
        } else {
            DRIFT[(turn - OPENING.len()) % DRIFT.len()]
        };
        turn += 1;

        if let Some(result) = session.respond(text) {
            print_turn(turn, text, &result, session.dissonance_level());
        }
    }

    println!(
        "Ended in {} after {} messages.",
        session.stage(),
        session.user_message_count()
    );
}

fn print_turn(turn: usize, text: &str, result: &DialogueResult, dissonance: u32) {
    println!("#{:<2} you : {}", turn, text);
    println!(
        "    echo [{} | {} | dissonance {}%{}]:",
        result.stage(),
        result.emotion.tone_label,
        dissonance,
        if result.glitch.active { " | glitch" } else { "" }
    );
    for line in result.message.text().split("\n\n") {
        println!("      {}", line);
    }
    println!();
}
