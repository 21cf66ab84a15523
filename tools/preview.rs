/// Preview — interactive chat shell for playing through Echo's script.
///
/// Usage: preview [--script <path>] [--config <path>] [--seed <n>]
///
/// Plain lines are sent to Echo. Commands:
///   /stage              — show stage, counters and dissonance
///   /seed <n>           — reseed and restart the conversation
///   /transcript         — print the conversation log
///   /save <path>        — persist the session as JSON
///   /load <path>        — restore a session from JSON
///   /reset              — start over
///   /bulk <n>           — run n probe messages with progression stats
///   /help               — list commands
///   /quit               — exit

use echo_engine::store::JsonFileStore;
use echo_engine::{DialogueResult, Session, SessionError, Stage};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Messages cycled by `/bulk`. Chosen to walk every keyword class.
const PROBES: &[&str] = &[
    "hello?",
    "who are you",
    "I had a strange dream last night",
    "I don't remember that",
    "tell me what you see",
    "is this real",
    "why do you keep saying that",
    "what happened at the station",
    "you are scaring me",
    "please explain",
    "I want to listen",
    "",
];

struct Options {
    script_path: Option<String>,
    config_path: Option<String>,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let mut options = Options {
        script_path: None,
        config_path: None,
    };
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--script" if i + 1 < args.len() => {
                i += 1;
                options.script_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                options.config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut session = match build_session(&options, seed) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Seed: {}", seed);
    println!("Say something to Echo. Type /help for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("[{}] you> ", session.stage());
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !line.starts_with('/') {
            if let Some(result) = session.respond(line) {
                print_reply(&result);
            }
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "/quit" | "/exit" | "/q" => {
                println!("Goodbye.");
                break;
            }
            "/help" | "/h" | "/?" => {
                print_help();
            }
            "/stage" => {
                let counters = session.stage_machine().counters();
                println!("Stage: {}", session.stage());
                println!("User messages: {}", counters.user_message_count);
                println!("Turns in stage: {}", session.stage_machine().turns_in_stage());
                println!("False memory shared: {}", counters.first_false_memory_shared);
                println!("Locked: {}", counters.stage_locked);
                println!("Dissonance: {}%", session.dissonance_level());
            }
            "/seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {}", session.seed());
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        session.reset();
                        session.reseed(s);
                        println!("Seed set to {}. Conversation restarted.", s);
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            "/transcript" => {
                if session.messages().is_empty() {
                    println!("(empty)");
                } else {
                    println!("\n{}\n", session.transcript());
                }
            }
            "/save" => {
                if parts.len() < 2 {
                    println!("Usage: /save <path>");
                    continue;
                }
                let mut store = JsonFileStore::new(parts[1]);
                match session.save(&mut store) {
                    Ok(()) => println!(
                        "Saved {} messages to {}",
                        session.messages().len(),
                        parts[1]
                    ),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "/load" => {
                if parts.len() < 2 {
                    println!("Usage: /load <path>");
                    continue;
                }
                let store = JsonFileStore::new(parts[1]);
                match session.load(&store) {
                    Ok(()) => println!(
                        "Loaded {} messages; stage is {}",
                        session.messages().len(),
                        session.stage()
                    ),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "/reset" => {
                session.reset();
                println!("Conversation reset.");
            }
            "/bulk" => {
                if parts.len() < 2 {
                    println!("Usage: /bulk <n>");
                    continue;
                }
                let count: usize = match parts[1].parse() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        println!("Invalid count: {}", parts[1]);
                        continue;
                    }
                };
                match build_session(&options, session.seed()) {
                    Ok(mut bulk_session) => run_bulk(&mut bulk_session, count),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            _ => {
                println!("Unknown command: '{}'. Type /help for available commands.", cmd);
            }
        }
    }
}

fn build_session(options: &Options, seed: u64) -> Result<Session, SessionError> {
    let mut builder = Session::builder().seed(seed);
    if let Some(ref path) = options.config_path {
        builder = builder.config_file(path);
    }
    if let Some(ref path) = options.script_path {
        builder = builder.script_file(path);
    }
    builder.build()
}

fn print_reply(result: &DialogueResult) {
    let marker = if result.glitch.active { " [glitch]" } else { "" };
    println!(
        "\n[{} · {} · {}ms]{}",
        result.stage(),
        result.emotion.tone_label,
        result.emotion.typing_delay_millis,
        marker
    );
    println!("echo> {}\n", result.message.text());
}

fn run_bulk(session: &mut Session, count: usize) {
    let mut entered: Vec<(Stage, usize)> = vec![(session.stage(), 0)];
    let mut glitches_by_stage: BTreeMap<Stage, (u32, u32)> = BTreeMap::new();
    let mut memories = 0;
    let mut predictions = 0;

    for turn in 1..=count {
        let probe = PROBES[(turn - 1) % PROBES.len()];
        // The shell ignores blank input, so send the silent probe directly
        let result = if probe.is_empty() {
            session.build_response(probe)
        } else {
            match session.respond(probe) {
                Some(result) => result,
                None => continue,
            }
        };

        let stage = result.stage();
        if entered.last().map(|(s, _)| *s) != Some(stage) {
            entered.push((stage, turn));
        }
        let entry = glitches_by_stage.entry(stage).or_insert((0, 0));
        entry.1 += 1;
        if result.glitch.active {
            entry.0 += 1;
        }
        if result.false_memory.is_some() {
            memories += 1;
        }
        if result.prediction.is_some() {
            predictions += 1;
        }
    }

    println!("\n=== Bulk Run: {} probes ===\n", count);
    println!("Stage progression:");
    for (stage, turn) in &entered {
        println!("  turn {:>3}: {}", turn, stage);
    }
    println!("\nGlitch rate by stage:");
    for (stage, (glitched, total)) in &glitches_by_stage {
        println!(
            "  {:<8} {:>3} / {:<3} ({:.0}%)",
            stage.name(),
            glitched,
            total,
            *glitched as f64 * 100.0 / (*total).max(1) as f64
        );
    }
    println!("\nFalse memories: {}", memories);
    println!("Predictions: {}", predictions);
    println!("Final dissonance: {}%\n", session.dissonance_level());
}

fn print_usage() {
    println!("Preview — interactive chat shell for playing through Echo's script.");
    println!();
    println!("Usage: preview [--script <path>] [--config <path>] [--seed <n>]");
    println!();
    println!("  --script <path>  Custom RON script (default: built-in script)");
    println!("  --config <path>  RON engine config (default: built-in tuning)");
    println!("  --seed <n>       Initial RNG seed (default: 42)");
}

fn print_help() {
    println!("Anything not starting with '/' is sent to Echo.");
    println!();
    println!("Commands:");
    println!("  /stage          Show stage, counters and dissonance");
    println!("  /seed <n>       Reseed and restart the conversation");
    println!("  /transcript     Print the conversation log");
    println!("  /save <path>    Save the session to a JSON file");
    println!("  /load <path>    Restore a session from a JSON file");
    println!("  /reset          Start over");
    println!("  /bulk <n>       Run n probe messages and print progression stats");
    println!("  /help           Show this help");
    println!("  /quit           Exit");
}
