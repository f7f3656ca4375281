/// Grammar Linter — validates rule references and DSL syntax.
///
/// Usage: grammar_linter <grammar_file_or_dir>
use babble_engine::core::dsl;
use babble_engine::core::grammar::GrammarStore;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: grammar_linter <grammar_file_or_dir>");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let mut grammar = GrammarStore::default();

    if target.is_file() {
        match GrammarStore::load_from_ron(target) {
            Ok(loaded) => grammar.merge(loaded),
            Err(e) => {
                eprintln!("ERROR: failed to load grammar file: {}", e);
                process::exit(1);
            }
        }
    } else if target.is_dir() {
        load_grammars_recursive(target, &mut grammar);
    } else {
        eprintln!("ERROR: path '{}' does not exist", args[1]);
        process::exit(1);
    }

    println!("Loaded {} grammar rules", grammar.len());

    let (errors, warnings) = lint(&grammar);

    println!("\n=== Grammar Lint Report ===\n");

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

    process::exit(if errors.is_empty() { 0 } else { 1 });
}

fn load_grammars_recursive(dir: &Path, grammar: &mut GrammarStore) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_grammars_recursive(&path, grammar);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match GrammarStore::load_from_ron(&path) {
                    Ok(loaded) => {
                        println!("  Loaded: {}", path.display());
                        grammar.merge(loaded);
                    }
                    Err(e) => {
                        eprintln!("  ERROR loading {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

fn lint(grammar: &GrammarStore) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (name, options) in grammar.rules() {
        if options.len() < 3 {
            warnings.push(format!(
                "rule '{}' has only {} option(s); low variety",
                name,
                options.len()
            ));
        }
        for option in options {
            lint_template(name, &option.template, grammar, &mut errors);
        }
    }

    (errors, warnings)
}

/// Check one template: every `<ref>` must resolve, every `{...}`
/// fragment must parse, braces must balance.
fn lint_template(
    rule: &str,
    template: &str,
    grammar: &GrammarStore,
    errors: &mut Vec<String>,
) {
    // Non-terminal references
    let mut rest = template;
    while let Some(open) = rest.find('<') {
        let Some(offset) = rest[open + 1..].find('>') else {
            break;
        };
        let name = &rest[open + 1..open + 1 + offset];
        if !name.starts_with("random:") && !grammar.contains(name) {
            errors.push(format!(
                "rule '{}' references non-existent rule '{}'",
                rule, name
            ));
        }
        rest = &rest[open + 1 + offset + 1..];
    }

    // DSL fragments, innermost-first like the real evaluator, each
    // replaced by a placeholder so outer fragments stay parseable
    let mut text = template.to_string();
    loop {
        let Some(close) = text.find('}') else {
            if text.contains('{') {
                errors.push(format!("rule '{}' has an unclosed '{{'", rule));
            }
            break;
        };
        let Some(open) = text[..close].rfind('{') else {
            errors.push(format!("rule '{}' has an unmatched '}}'", rule));
            break;
        };
        let fragment = &text[open + 1..close];
        match dsl::parse(fragment) {
            Ok(dsl::DslExpr::Category { name, .. }) => {
                if !grammar.contains(&name) {
                    errors.push(format!(
                        "rule '{}' calls non-existent category '{}'",
                        rule, name
                    ));
                }
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("rule '{}': {}", rule, e)),
        }
        text.replace_range(open..=close, "x");
    }
}
