/// Combinatorics — rough estimate of the grammar's output variety.
///
/// Usage: combinatorics [grammar_file]
use babble_engine::core::grammar::GrammarStore;
use std::collections::HashSet;
use std::path::Path;
use std::process;

const DEFAULT_GRAMMAR: &str = "grammar_data/technobabble.ron";
const ESTIMATE_DEPTH: usize = 5;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_GRAMMAR);

    let grammar = match GrammarStore::load_from_ron(Path::new(path)) {
        Ok(grammar) => grammar,
        Err(e) => {
            eprintln!("Failed to load grammar '{}': {}", path, e);
            process::exit(1);
        }
    };

    let total_rules = grammar.len();
    let total_options: usize = grammar.rules().values().map(Vec::len).sum();
    let avg_options = total_options as f64 / total_rules as f64;

    println!("{}", "=".repeat(72));
    println!("GRAMMAR COMBINATION STATISTICS — {}", path);
    println!("{}", "=".repeat(72));
    println!();
    println!("Grammar:");
    println!("  - rule categories:       {}", total_rules);
    println!("  - individual options:    {}", total_options);
    println!("  - avg options per rule:  {:.1}", avg_options);
    println!();

    if let Ok(sentence) = grammar.lookup("sentence") {
        println!("Sentence formats: {}", sentence.len());
        println!();
    }

    let mut large: Vec<(&str, usize)> = grammar
        .rules()
        .iter()
        .filter(|(_, options)| options.len() >= 5)
        .map(|(name, options)| (name.as_str(), options.len()))
        .collect();
    large.sort_by(|a, b| b.1.cmp(&a.1));

    println!("Rules with 5+ options:");
    for (name, count) in &large {
        println!("  - {}: {} options", name, count);
    }
    println!();

    // Rough path count through the expansion tree. Recursion and the
    // DSL make this an estimate, not an exact census.
    let sentence_combos = estimate("sentence", &grammar, 0, &HashSet::new());
    println!("Estimated combinations (depth-limited, DSL ignored):");
    println!("  - single sentence:       ~{:.3e}", sentence_combos);
    println!("  - 5-sentence output:     ~{:.3e}", sentence_combos.powi(5));
    println!(
        "  - 4 to 10 sentences:     ~{:.3e} .. ~{:.3e}",
        sentence_combos.powi(4),
        sentence_combos.powi(10)
    );
}

/// Count unique expansion paths for `symbol`, cutting off on revisits
/// and at a fixed depth.
fn estimate(
    symbol: &str,
    grammar: &GrammarStore,
    depth: usize,
    visited: &HashSet<String>,
) -> f64 {
    if visited.contains(symbol) || depth > ESTIMATE_DEPTH {
        return 1.0;
    }
    let Ok(options) = grammar.lookup(symbol) else {
        return 1.0;
    };

    let mut visited = visited.clone();
    visited.insert(symbol.to_string());

    let mut total = 0.0;
    for option in options {
        let refs = rule_refs(&option.template);
        if refs.is_empty() {
            total += 1.0;
        } else {
            let mut combos = 1.0;
            for reference in refs {
                combos *= estimate(&reference, grammar, depth + 1, &visited);
            }
            total += combos;
        }
    }
    total
}

fn rule_refs(template: &str) -> Vec<String> {
    let mut refs = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('<') {
        let Some(offset) = rest[open + 1..].find('>') else {
            break;
        };
        let name = &rest[open + 1..open + 1 + offset];
        if !name.starts_with("random:") {
            refs.push(name.to_string());
        }
        rest = &rest[open + 1 + offset + 1..];
    }
    refs
}
