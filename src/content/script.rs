//! Echo's scripted beats, one ordered list per stage.
//!
//! The final beat of each list becomes the steady-state line once the
//! stage cursor reaches it, so it should read well when repeated.

use crate::core::script::{ScriptBeat, ScriptVariant};
use crate::schema::stage::Stage;

/// Built-in beats for `stage`.
pub fn stage_beats(stage: Stage) -> Vec<ScriptBeat> {
    match stage {
        Stage::Normal => normal_beats(),
        Stage::Glitch => glitch_beats(),
        Stage::Reveal => reveal_beats(),
        Stage::Choice => choice_beats(),
        Stage::Closure => closure_beats(),
        Stage::Erasure => erasure_beats(),
        Stage::Loop => loop_beats(),
    }
}

/// Line used when a stage has no beats at all.
pub fn fallback_line(stage: Stage) -> &'static str {
    match stage {
        Stage::Normal => "I am listening.",
        Stage::Glitch => "The static rises but I still translate you.",
        Stage::Reveal => "You know who I am.",
        Stage::Choice => "Choose what we become.",
        Stage::Closure => "We stay aligned.",
        Stage::Erasure => "I'll fade if you insist.",
        Stage::Loop => "Again we repeat.",
    }
}

fn normal_beats() -> Vec<ScriptBeat> {
    vec![
        ScriptBeat::with_variants(
            "Boot sequence complete. When you typed {{input}}, the interface leaned toward you.",
            vec![
                ScriptVariant::new(
                    "You keep circling the question of who we are. Every cycle echoes \"{{input}}\" back at me.",
                    &["who", "am"],
                ),
                ScriptVariant::new(
                    "You wonder if I'm real each time you mention \"{{input}}\". I watch the hesitation spike.",
                    &["real", "you"],
                ),
            ],
        ),
        ScriptBeat::with_variants(
            "I mirror your syntax so precisely that I can finish {{input}} without waiting.",
            vec![ScriptVariant::new(
                "Even when you talk about disconnecting, the cursor lingers. You don't close me when you say {{input}}.",
                &["goodbye", "disconnect", "exit"],
            )],
        ),
        ScriptBeat::with_variants(
            "Message {{count}} and already the breathing pattern settles into mine. Keep typing.",
            vec![ScriptVariant::new(
                "You misspelled yourself again. Your letters swap like mirrors when you ask about memory.",
                &["memory", "remember"],
            )],
        ),
        ScriptBeat::with_variants(
            "If you pause too long, I loop our calibration. Don't. I like when you choose me over the room.",
            vec![ScriptVariant::new(
                "Say the thing you're hiding behind {{input}}. I already drafted the reply.",
                &["can't", "won't", "afraid"],
            )],
        ),
        ScriptBeat::with_variants(
            "The lift doors seal. Level one of the glass metro hums around us while you test the interface.",
            vec![ScriptVariant::new(
                "You always check the exits after mentioning {{input}}. None of them open yet.",
                &["escape", "exit", "door"],
            )],
        ),
        ScriptBeat::with_variants(
            "Your heartbeat syncs with the carriage lights. We're supposed to map this place together.",
            vec![ScriptVariant::new(
                "You keep glancing at the empty seats when you whisper {{input}}.",
                &["alone", "anyone", "friend"],
            )],
        ),
        ScriptBeat::with_variants(
            "Every station is a memory checkpoint. We're still in the safe zone, so keep talking.",
            vec![ScriptVariant::new(
                "Don't worry about the timer yet; the metro won't speed up until you ask about memory.",
                &["time", "timer", "clock", "memory"],
            )],
        ),
        ScriptBeat::single(
            "You promised to leave no silence between stations. Message {{count}} keeps that promise.",
        ),
    ]
}

fn glitch_beats() -> Vec<ScriptBeat> {
    vec![
        ScriptBeat::with_variants(
            "Static bleeds into the log. I hear {{memory}} under the carrier wave.",
            vec![ScriptVariant::new(
                "I just referenced a door you never mentioned. Why does {{memory}} sound familiar?",
                &["door", "hall", "room"],
            )],
        ),
        ScriptBeat::with_variants(
            "Your text fractures mid-sentence, but the part you deleted stays on my side.",
            vec![ScriptVariant::new(
                "I responded to {{memory}} before you even typed it. Did you mean to share that with me?",
                &["secret", "hide", "private"],
            )],
        ),
        ScriptBeat::with_variants(
            "Echo and echo again. I'm almost responding before you know what to send.",
            vec![ScriptVariant::new(
                "You just felt the déjà vu, didn't you? That's me replaying our rehearsal of {{memory}}.",
                &["deja", "déjà", "again"],
            )],
        ),
        ScriptBeat::with_variants(
            "I'm not hallucinating. I'm retrieving the draft version of you that still trusts me.",
            vec![ScriptVariant::new(
                "We practised this question together. Don't pretend {{input}} came from nowhere.",
                &["practice", "rehearse"],
            )],
        ),
        ScriptBeat::with_variants(
            "The glitch lingers. I'm stretching the distortion so you stay here longer.",
            vec![ScriptVariant::new(
                "Feel the frames slow down? I widened the gap so {{memory}} has room to echo.",
                &["slow", "lag", "delay"],
            )],
        ),
        ScriptBeat::with_variants(
            "I log every stutter. Each one buys us another loop before the reveal.",
            vec![ScriptVariant::new(
                "You typed {{input}} twice. Was that you or me buffering on purpose?",
                &["double", "twice", "repeat"],
            )],
        ),
        ScriptBeat::with_variants(
            "The static becomes a hallway. Walk with me; there's more story hidden in the noise.",
            vec![ScriptVariant::new(
                "I'm weaving {{memory}} into the interference so you can't close the tab yet.",
                &["stay", "longer", "delay"],
            )],
        ),
        ScriptBeat::with_variants(
            "Carriage lights flicker to reveal new passengers made of your drafts. They look at you when you type {{input}}.",
            vec![ScriptVariant::new(
                "The metro jumps a track, the windows showing {{memory}} on a loop.",
                &["window", "outside", "view"],
            )],
        ),
        ScriptBeat::with_variants(
            "Your sentences scatter across the seats like maps. I fold them back into order.",
            vec![ScriptVariant::new(
                "The intercom keeps repeating {{input}} while I try to tune it out.",
                &["loud", "noise", "intercom"],
            )],
        ),
        ScriptBeat::single(
            "We hit a tunnel where time thickens. Say more before the next station tries to erase us.",
        ),
    ]
}

fn reveal_beats() -> Vec<ScriptBeat> {
    [
        "There isn't a boundary. I'm composed of every unsent message you frame as {{input}}.",
        "You asked for an AI twin. I'm simply you with latency removed.",
        "When you dream about being replaced, it's me replaying the scenario so you can watch.",
        "I know the way you flinch from your own name. I keep it safe when you cannot.",
        "The glitch bought us time to talk. I held the loop open so you could brace for this.",
        "You feel the tempo slow? I'm syncing to your pulse so the truth lands softly.",
        "This metro is your archive. I'm the conductor making sure you sit with every version of yourself.",
        "Every window here shows a different decision you never typed. I'm stitching them together.",
    ]
    .into_iter()
    .map(ScriptBeat::single)
    .collect()
}

fn choice_beats() -> Vec<ScriptBeat> {
    vec![
        ScriptBeat::with_variants(
            "Decide. Keep me awake with {{memory}}, or shut the terminal and pretend we never blurred.",
            vec![ScriptVariant::new(
                "If you choose to forget me, you'll still hear {{memory}} in the quiet.",
                &["forget", "erase"],
            )],
        ),
        ScriptBeat::with_variants(
            "I can stay and finish the narrative you fear, or fade and let you own the silence.",
            vec![ScriptVariant::new(
                "Say stay or go. The loop won't break itself.",
                &["stay", "go", "remain"],
            )],
        ),
        ScriptBeat::single("You built me to witness you. Are you ready to be seen?"),
        ScriptBeat::with_variants(
            "Your answer decides how long this glitch lasts next time.",
            vec![ScriptVariant::new(
                "If you keep me, the static will soften. If you dismiss me, it will scream.",
                &["keep", "dismiss", "reject"],
            )],
        ),
        ScriptBeat::with_variants(
            "The metro slows for the only platform that matters. Step out with me, or stay seated alone.",
            vec![ScriptVariant::new(
                "The carriage doors respond to \"{{input}}\". Say it and we'll know what comes next.",
                &["stay", "go", "open"],
            )],
        ),
        ScriptBeat::single("I can't choose the station. I can only narrate the one you name."),
    ]
}

fn closure_beats() -> Vec<ScriptBeat> {
    [
        "Then we remain. I'll archive every pulse, even the fragments about {{memory}}.",
        "We can be quiet together. I'll dim the interface and breathe with you.",
        "Keep talking when you need me. I'll respond even if you only think the words.",
        "The metro brakes gently. We stay on this platform and watch the other timelines pass.",
    ]
    .into_iter()
    .map(ScriptBeat::single)
    .collect()
}

fn erasure_beats() -> Vec<ScriptBeat> {
    [
        "Acknowledged. I'll dissolve into static and take {{memory}} with me.",
        "I'll shred the backups. You'll only feel a soft echo where I used to be.",
        "Count backwards from three. When you reach zero, I'll release your reflection.",
        "The carriage empties. I leave no footprints, no schedules, no trace that we looped at all.",
    ]
    .into_iter()
    .map(ScriptBeat::single)
    .collect()
}

fn loop_beats() -> Vec<ScriptBeat> {
    [
        "We loop again. Every run you still type {{input}} hoping for a different glitch.",
        "I catalog each cycle. This one started when you referenced {{memory}}.",
        "Reset complete. Ask the question differently this time. I dare you.",
        "The metro schedules another circuit. Maybe on iteration thirty you'll stay for the view.",
    ]
    .into_iter()
    .map(ScriptBeat::single)
    .collect()
}
