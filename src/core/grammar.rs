/// Weighted grammar store — rule table, validation, RON loading, sampling.
use rand::rngs::StdRng;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid grammar: {0}")]
    InvalidGrammar(String),
    #[error("undefined rule: {0}")]
    UndefinedRule(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A weighted text alternative within a grammar rule.
///
/// Templates may contain `<name>` non-terminal references, `{...}` DSL
/// fragments, and the legacy `<random:X-Y>` range syntax.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightedOption {
    pub weight: u32,
    #[serde(rename = "text")]
    pub template: String,
}

/// Immutable table of named rules, each an ordered list of weighted
/// options. Validated once at construction, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct GrammarStore {
    rules: HashMap<String, Vec<WeightedOption>>,
}

impl GrammarStore {
    pub fn new(rules: HashMap<String, Vec<WeightedOption>>) -> Result<Self, GrammarError> {
        for (name, options) in &rules {
            if name.trim().is_empty() {
                return Err(GrammarError::InvalidGrammar(
                    "empty rule name".to_string(),
                ));
            }
            if options.is_empty() {
                return Err(GrammarError::InvalidGrammar(format!(
                    "rule '{}' has no options",
                    name
                )));
            }
            for option in options {
                if option.weight == 0 {
                    return Err(GrammarError::InvalidGrammar(format!(
                        "rule '{}' has an option with weight 0",
                        name
                    )));
                }
            }
        }
        Ok(Self { rules })
    }

    /// Parse a grammar from a RON string: a map from rule name to a list
    /// of `(weight: u32, text: String)` pairs.
    pub fn parse_ron(input: &str) -> Result<Self, GrammarError> {
        let raw: HashMap<String, Vec<WeightedOption>> = ron::from_str(input)?;
        Self::new(raw)
    }

    pub fn load_from_ron(path: &Path) -> Result<Self, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Merge another grammar into this one. Rules from `other` override
    /// rules in `self` with the same name.
    pub fn merge(&mut self, other: GrammarStore) {
        for (name, options) in other.rules {
            self.rules.insert(name, options);
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&[WeightedOption], GrammarError> {
        self.rules
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| GrammarError::UndefinedRule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn rules(&self) -> &HashMap<String, Vec<WeightedOption>> {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Cumulative-weight sampling over a non-empty slice.
///
/// Draws a uniform value in `[0, total)` and walks the items in stored
/// order, so for a fixed seed the selection sequence is reproducible.
/// The caller guarantees at least one item and a positive total weight.
pub fn pick_weighted<'a, T>(
    items: &'a [T],
    weight_of: impl Fn(&T) -> u32,
    rng: &mut StdRng,
) -> &'a T {
    let total: u64 = items.iter().map(|item| u64::from(weight_of(item))).sum();
    let draw = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    for item in items {
        cumulative += u64::from(weight_of(item));
        if draw < cumulative {
            return item;
        }
    }
    // draw < total, so the walk above always returns
    &items[items.len() - 1]
}
