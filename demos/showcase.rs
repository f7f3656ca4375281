/// Walkthrough of the engine's modes against the shipped grammar.
///
/// Run with: cargo run --example showcase
use babble_engine::core::pipeline::{
    BabbleEngine, GenerateRequest, OutputMode, PipelineError,
};

const GRAMMAR: &str = "grammar_data/technobabble.ron";

fn main() -> Result<(), PipelineError> {
    basic()?;
    seeded()?;
    plain()?;
    context_memory()?;
    variable_length()?;
    batch()?;
    Ok(())
}

fn heading(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

/// Default request: random length, mutations on.
fn basic() -> Result<(), PipelineError> {
    heading("Basic generation");
    let mut engine = BabbleEngine::builder().grammar_path(GRAMMAR).build()?;
    println!("{}", engine.generate(&GenerateRequest::default())?);
    Ok(())
}

/// The same seed produces the same output, call after call.
fn seeded() -> Result<(), PipelineError> {
    heading("Seeded (reproducible)");
    let mut engine = BabbleEngine::builder()
        .grammar_path(GRAMMAR)
        .seed(1337)
        .build()?;
    let request = GenerateRequest {
        sentences: Some(3),
        ..Default::default()
    };
    let first = engine.generate(&request)?;
    let second = engine.generate(&request)?;
    println!("{}", first);
    println!("(repeat is identical: {})", first == second);
    Ok(())
}

/// Mutations off: no urgency markers, no uppercased terms.
fn plain() -> Result<(), PipelineError> {
    heading("Without mutations");
    let mut engine = BabbleEngine::builder().grammar_path(GRAMMAR).build()?;
    let request = GenerateRequest {
        sentences: Some(3),
        apply_mutations: false,
        ..Default::default()
    };
    println!("{}", engine.generate(&request)?);
    Ok(())
}

/// Tracked categories stay consistent within one output.
fn context_memory() -> Result<(), PipelineError> {
    heading("Context memory");
    let mut engine = BabbleEngine::builder()
        .grammar_path(GRAMMAR)
        .seed(7)
        .build()?;
    let request = GenerateRequest {
        sentences: Some(6),
        ..Default::default()
    };
    println!("{}", engine.generate(&request)?);
    println!("\nSlots bound during generation:");
    let mut slots: Vec<_> = engine.last_context().iter().collect();
    slots.sort();
    for (name, value) in slots {
        println!("  {} = {}", name, value);
    }
    Ok(())
}

/// Explicit counts versus the sampled default range.
fn variable_length() -> Result<(), PipelineError> {
    heading("Variable length");
    let mut engine = BabbleEngine::builder().grammar_path(GRAMMAR).build()?;
    for count in [1, 3, 8] {
        let request = GenerateRequest {
            sentences: Some(count),
            ..Default::default()
        };
        println!("\n[{} sentence(s)]", count);
        println!("{}", engine.generate(&request)?);
    }
    Ok(())
}

/// Structured modes: full posts and one-line formats.
fn batch() -> Result<(), PipelineError> {
    heading("Structured output");
    let mut engine = BabbleEngine::builder().grammar_path(GRAMMAR).build()?;

    println!("\n--- format ---");
    let format = GenerateRequest {
        mode: OutputMode::Format,
        ..Default::default()
    };
    println!("{}", engine.generate(&format)?);

    println!("\n--- post ---");
    let post = GenerateRequest {
        mode: OutputMode::Post,
        ..Default::default()
    };
    println!("{}", engine.generate(&post)?);
    Ok(())
}
