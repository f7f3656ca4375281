/// Mutation pass — urgency markers and domain-term capitalization.
///
/// Runs only on fully assembled sentences, never on raw templates, so
/// it cannot corrupt unresolved DSL syntax.
use rand::rngs::StdRng;
use rand::Rng;
use regex::Regex;

/// Terms that occasionally get shouted.
pub const DEFAULT_TERMS: &[&str] = &[
    "critical",
    "vulnerability",
    "exploit",
    "remote",
    "authentication",
];

/// Prefixes occasionally slapped onto a sentence.
pub const URGENCY_MARKERS: &[&str] = &["[URGENT] ", "[CRITICAL] ", "[ZERO-DAY] "];

const TERM_CHANCE: f64 = 0.3;
const MARKER_CHANCE: f64 = 0.15;

/// Optional post-expansion text transform. Purely a function of
/// (sentence, RNG state, lexicon).
#[derive(Debug)]
pub struct MutationPipeline {
    terms: Vec<(Regex, String)>,
    term_chance: f64,
    marker_chance: f64,
}

impl Default for MutationPipeline {
    fn default() -> Self {
        Self::with_terms(DEFAULT_TERMS)
    }
}

impl MutationPipeline {
    pub fn with_terms(terms: &[&str]) -> Self {
        let terms = terms
            .iter()
            .map(|term| {
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))
                    .expect("escaped term is a valid pattern");
                (pattern, term.to_uppercase())
            })
            .collect();
        Self {
            terms,
            term_chance: TERM_CHANCE,
            marker_chance: MARKER_CHANCE,
        }
    }

    /// Mutate one sentence. Each lexicon term present in the sentence
    /// upper-cases its first occurrence with probability `term_chance`;
    /// independently, one urgency marker is prefixed with probability
    /// `marker_chance`.
    pub fn apply(&self, sentence: &str, rng: &mut StdRng) -> String {
        let mut sentence = sentence.to_string();
        for (pattern, upper) in &self.terms {
            if pattern.is_match(&sentence) && rng.gen::<f64>() < self.term_chance {
                sentence = pattern.replace(&sentence, upper.as_str()).into_owned();
            }
        }
        if rng.gen::<f64>() < self.marker_chance {
            let marker = URGENCY_MARKERS[rng.gen_range(0..URGENCY_MARKERS.len())];
            sentence.insert_str(0, marker);
        }
        sentence
    }
}
