/// Generate — command-line technobabble generation.
///
/// Usage: generate [--grammar <path>] [--seed <n>] [--sentences <n>]
///                 [--format | --post] [--no-mutations]
use babble_engine::core::pipeline::{BabbleEngine, GenerateRequest, OutputMode};
use std::process;

const DEFAULT_GRAMMAR: &str = "grammar_data/technobabble.ron";

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut grammar_path = DEFAULT_GRAMMAR.to_string();
    let mut seed: Option<u64> = None;
    let mut sentences: Option<usize> = None;
    let mut mode = OutputMode::Sentences;
    let mut apply_mutations = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return;
            }
            "--grammar" | "-g" if i + 1 < args.len() => {
                i += 1;
                grammar_path = args[i].clone();
            }
            "--seed" | "-s" if i + 1 < args.len() => {
                i += 1;
                match args[i].parse() {
                    Ok(value) => seed = Some(value),
                    Err(_) => {
                        eprintln!("Invalid seed: {}", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--sentences" | "-n" if i + 1 < args.len() => {
                i += 1;
                match args[i].parse() {
                    Ok(value) => sentences = Some(value),
                    Err(_) => {
                        eprintln!("Invalid sentence count: {}", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--format" | "-f" => mode = OutputMode::Format,
            "--post" | "-p" => mode = OutputMode::Post,
            "--no-mutations" => apply_mutations = false,
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = BabbleEngine::builder().grammar_path(&grammar_path);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }

    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to load grammar '{}': {}", grammar_path, e);
            process::exit(1);
        }
    };

    let request = GenerateRequest {
        sentences,
        mode,
        apply_mutations,
    };

    match engine.generate(&request) {
        Ok(output) => {
            println!("{}", output);
            if let Some(seed) = seed {
                eprintln!("\n[seed: {}]", seed);
            }
        }
        Err(e) => {
            eprintln!("Generation failed: {}", e);
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Usage: generate [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -g, --grammar <path>  Grammar file (default: {})", DEFAULT_GRAMMAR);
    println!("  -s, --seed <n>        Seed for reproducible output");
    println!("  -n, --sentences <n>   Sentence count (default: random 4-10)");
    println!("  -f, --format          Generate a flat format post (thread, tutorial, ...)");
    println!("  -p, --post            Generate a hierarchical post");
    println!("      --no-mutations    Disable urgency markers and term capitalization");
}
