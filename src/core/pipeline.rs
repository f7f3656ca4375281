/// The assembly pipeline: grammar → finished technobabble.
///
/// Wires together rule expansion, DSL resolution, context memory,
/// sentence deduplication, and the mutation pass. One `generate` call
/// runs exactly one session; nothing carries over between calls.
use rand::Rng;
use rustc_hash::FxHashSet;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::expand::{ExpandError, Expander};
use crate::core::grammar::{GrammarError, GrammarStore};
use crate::core::mutate::MutationPipeline;
use crate::core::session::Session;

/// Redraw budget for a duplicate sentence. When exhausted the duplicate
/// is accepted, so an undersized grammar degrades instead of spinning.
pub const DEDUP_RETRIES: usize = 10;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("expansion error: {0}")]
    Expand(#[from] ExpandError),
}

/// What one `generate` call should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// N independent sentences from the sentence rule.
    Sentences,
    /// One structured post from the flat format template rule.
    Format,
    /// One structured post from the hierarchical post rule.
    Post,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Sentence count for `Sentences` mode; `None` samples the default
    /// range. Ignored by the structured modes.
    pub sentences: Option<usize>,
    pub mode: OutputMode,
    pub apply_mutations: bool,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        Self {
            sentences: None,
            mode: OutputMode::Sentences,
            apply_mutations: true,
        }
    }
}

/// Engine knobs. The defaults mirror the shipped technobabble grammar.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sentence_symbol: String,
    pub format_symbol: String,
    pub post_symbol: String,
    /// Categories whose first expansion is replayed for the rest of the
    /// session (same vendor/version across all sentences).
    pub tracked_slots: FxHashSet<String>,
    /// Inclusive sampling range when no sentence count is given.
    pub sentence_range: (usize, usize),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sentence_symbol: "sentence".to_string(),
            format_symbol: "format".to_string(),
            post_symbol: "POST".to_string(),
            tracked_slots: ["vendor", "os", "product", "version_number"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            sentence_range: (4, 10),
        }
    }
}

/// The top-level generator. Built via `BabbleEngine::builder()`.
pub struct BabbleEngine {
    grammar: GrammarStore,
    config: EngineConfig,
    mutations: MutationPipeline,
    seed: Option<u64>,
    last_context: HashMap<String, String>,
}

/// Builder for constructing a `BabbleEngine`.
pub struct BabbleEngineBuilder {
    seed: Option<u64>,
    grammar: Option<GrammarStore>,
    grammar_paths: Vec<PathBuf>,
    config: EngineConfig,
    mutations: MutationPipeline,
}

impl BabbleEngine {
    pub fn builder() -> BabbleEngineBuilder {
        BabbleEngineBuilder {
            seed: None,
            grammar: None,
            grammar_paths: Vec::new(),
            config: EngineConfig::default(),
            mutations: MutationPipeline::default(),
        }
    }

    /// Run one full generation session.
    pub fn generate(&mut self, request: &GenerateRequest) -> Result<String, PipelineError> {
        // Unseeded engines draw fresh entropy per session
        let seed = self.seed.unwrap_or_else(rand::random);
        let mut session = Session::new(seed);
        let expander = Expander::new(&self.grammar, &self.config.tracked_slots);
        let output = match request.mode {
            OutputMode::Sentences => self.assemble_sentences(request, &expander, &mut session)?,
            OutputMode::Format => {
                self.assemble_block(&self.config.format_symbol, request, &expander, &mut session)?
            }
            OutputMode::Post => {
                self.assemble_block(&self.config.post_symbol, request, &expander, &mut session)?
            }
        };
        self.last_context = session.context().snapshot();
        Ok(output)
    }

    /// Tracked slots of the just-completed session.
    pub fn last_context(&self) -> &HashMap<String, String> {
        &self.last_context
    }

    pub fn grammar(&self) -> &GrammarStore {
        &self.grammar
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn assemble_sentences(
        &self,
        request: &GenerateRequest,
        expander: &Expander<'_>,
        session: &mut Session,
    ) -> Result<String, PipelineError> {
        let count = match request.sentences {
            Some(count) => count,
            None => {
                let (lo, hi) = self.config.sentence_range;
                session.rng().gen_range(lo..=hi)
            }
        };
        let mut sentences = Vec::with_capacity(count);
        for _ in 0..count {
            let mut fallback = String::new();
            let mut accepted = None;
            for _ in 0..DEDUP_RETRIES {
                let sentence =
                    finish_sentence(&expander.expand(&self.config.sentence_symbol, 0, session)?);
                if !session.was_seen(&sentence) {
                    accepted = Some(sentence);
                    break;
                }
                fallback = sentence;
            }
            // Retry budget exhausted: accept the duplicate
            let mut sentence = accepted.unwrap_or(fallback);
            session.mark_seen(&sentence);
            if request.apply_mutations {
                sentence = self.mutations.apply(&sentence, session.rng());
            }
            sentences.push(sentence);
        }
        Ok(sentences.join(" "))
    }

    fn assemble_block(
        &self,
        root: &str,
        request: &GenerateRequest,
        expander: &Expander<'_>,
        session: &mut Session,
    ) -> Result<String, PipelineError> {
        let block = expander.expand(root, 0, session)?.trim().to_string();
        session.mark_seen(&block);
        if !request.apply_mutations {
            return Ok(block);
        }
        let mut lines = Vec::new();
        for line in block.lines() {
            if is_decorated_line(line) {
                lines.push(line.to_string());
            } else {
                lines.push(self.mutations.apply(line, session.rng()));
            }
        }
        Ok(lines.join("\n"))
    }
}

/// Trim and guarantee a terminal period.
fn finish_sentence(raw: &str) -> String {
    let mut sentence = raw.trim().to_string();
    if !sentence.ends_with('.') {
        sentence.push('.');
    }
    sentence
}

/// Headers, code fences, and emoji-decorated lines keep their exact
/// shape; mutations only touch prose lines.
fn is_decorated_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with("```") {
        return true;
    }
    trimmed.chars().next().is_some_and(|c| !c.is_ascii())
}

impl BabbleEngineBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide a grammar directly (for testing without files).
    pub fn with_grammar(mut self, grammar: GrammarStore) -> Self {
        self.grammar = Some(grammar);
        self
    }

    /// Load and merge a grammar file at build time. May be called
    /// several times; later files override earlier rules.
    pub fn grammar_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.grammar_paths.push(path.into());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mutations(mut self, mutations: MutationPipeline) -> Self {
        self.mutations = mutations;
        self
    }

    pub fn build(self) -> Result<BabbleEngine, PipelineError> {
        let mut grammar = self.grammar.unwrap_or_default();
        for path in &self.grammar_paths {
            grammar.merge(GrammarStore::load_from_ron(path)?);
        }
        Ok(BabbleEngine {
            grammar,
            config: self.config,
            mutations: self.mutations,
            seed: self.seed,
            last_context: HashMap::new(),
        })
    }
}
