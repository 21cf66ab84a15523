/// Script Linter — validates a custom dialogue script before it ships.
///
/// Usage: script_linter <script.ron | script_dir>

use echo_engine::core::script::{placeholders, ScriptLibrary, KNOWN_PLACEHOLDERS};
use echo_engine::Stage;
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: script_linter <script.ron | script_dir>");
        process::exit(0);
    }

    let script_path = Path::new(&args[1]);
    let mut scripts = Vec::new();

    if script_path.is_file() {
        match ScriptLibrary::load_from_ron(script_path) {
            Ok(script) => scripts.push((script_path.display().to_string(), script)),
            Err(e) => {
                eprintln!("ERROR: Failed to load script file: {}", e);
                process::exit(1);
            }
        }
    } else if script_path.is_dir() {
        load_scripts_recursive(script_path, &mut scripts);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    }

    println!("Loaded {} script file(s)", scripts.len());

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for (name, script) in &scripts {
        let (file_errors, file_warnings) = lint_script(script);
        errors.extend(file_errors.into_iter().map(|e| format!("{}: {}", name, e)));
        warnings.extend(file_warnings.into_iter().map(|w| format!("{}: {}", name, w)));
    }

    println!("\n=== Script Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_scripts_recursive(dir: &Path, scripts: &mut Vec<(String, ScriptLibrary)>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_scripts_recursive(&path, scripts);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match ScriptLibrary::load_from_ron(&path) {
                    Ok(script) => {
                        println!("  Loaded: {}", path.display());
                        scripts.push((path.display().to_string(), script));
                    }
                    Err(e) => {
                        eprintln!("  ERROR loading {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

fn lint_script(script: &ScriptLibrary) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for stage in script.stages_without_beats() {
        warnings.push(format!(
            "Stage {} has no beats; every reply uses the fallback line",
            stage
        ));
    }

    for stage in Stage::ALL {
        check_placeholders(
            &format!("{} fallback", stage),
            script.fallback_line(stage),
            &mut errors,
        );

        for (index, beat) in script.beats(stage).iter().enumerate() {
            let beat_name = format!("{} beat {}", stage, index);
            check_placeholders(&beat_name, &beat.default_line, &mut errors);

            for (v, variant) in beat.variants.iter().enumerate() {
                let variant_name = format!("{} variant {}", beat_name, v);
                check_placeholders(&variant_name, &variant.line, &mut errors);

                let mut keywords: Vec<&str> = variant
                    .keywords
                    .iter()
                    .map(String::as_str)
                    .filter(|k| !k.is_empty())
                    .collect();
                keywords.sort_unstable();

                if keywords.is_empty() {
                    errors.push(format!("{} has no usable keyword and can never match", variant_name));
                    continue;
                }

                // Any input containing one of these keywords also contains an
                // earlier variant's keyword, so the earlier variant wins.
                let shadowed = keywords.iter().all(|k| {
                    beat.variants[..v].iter().any(|earlier| {
                        earlier
                            .keywords
                            .iter()
                            .any(|e| !e.is_empty() && k.contains(e.as_str()))
                    })
                });
                if shadowed {
                    warnings.push(format!(
                        "{} is shadowed by an earlier variant (keywords {:?})",
                        variant_name, keywords
                    ));
                }
            }
        }
    }

    (errors, warnings)
}

fn check_placeholders(location: &str, line: &str, errors: &mut Vec<String>) {
    for name in placeholders(line) {
        if !KNOWN_PLACEHOLDERS.contains(&name) {
            errors.push(format!(
                "{} uses unknown placeholder '{{{{{}}}}}'",
                location, name
            ));
        }
    }
}
