/// Recursive non-terminal expansion with weighted selection.
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::dsl;
use crate::core::grammar::{pick_weighted, GrammarError, GrammarStore};
use crate::core::session::Session;

/// Hard ceiling on expansion depth. Indirect grammar cycles are not
/// detected up front; they are cut here and reported instead of hanging.
pub const MAX_DEPTH: usize = 200;

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error("recursion limit exceeded at depth {depth} while expanding '{symbol}'")]
    RecursionLimit { symbol: String, depth: usize },
    #[error("malformed DSL expression: {0}")]
    MalformedExpression(String),
    #[error("requested {requested} distinct options but only {available} exist")]
    InsufficientOptions { requested: usize, available: usize },
    #[error("variable '{0}' read before it was bound")]
    UnboundVariable(String),
}

/// Expands `<name>` references against a grammar, consulting the
/// session's context memory for tracked categories and handing terminal
/// text to the DSL interpreter.
pub struct Expander<'g> {
    grammar: &'g GrammarStore,
    tracked: &'g FxHashSet<String>,
}

impl<'g> Expander<'g> {
    pub fn new(grammar: &'g GrammarStore, tracked: &'g FxHashSet<String>) -> Self {
        Self { grammar, tracked }
    }

    pub fn grammar(&self) -> &GrammarStore {
        self.grammar
    }

    /// Fully expand one rule to terminal text.
    pub fn expand(
        &self,
        symbol: &str,
        depth: usize,
        session: &mut Session,
    ) -> Result<String, ExpandError> {
        if depth > MAX_DEPTH {
            return Err(ExpandError::RecursionLimit {
                symbol: symbol.to_string(),
                depth,
            });
        }
        if self.tracked.contains(symbol) {
            // Tracked categories are drawn once per session and replayed
            if let Some(value) = session.context().get(symbol) {
                return Ok(value.to_string());
            }
            let value = self.expand_fresh(symbol, depth, session)?;
            return Ok(session.context_mut().bind_first(symbol, value));
        }
        self.expand_fresh(symbol, depth, session)
    }

    fn expand_fresh(
        &self,
        symbol: &str,
        depth: usize,
        session: &mut Session,
    ) -> Result<String, ExpandError> {
        let options = self.grammar.lookup(symbol)?;
        let option = pick_weighted(options, |o| o.weight, session.rng());
        self.expand_template(&option.template, depth, session)
    }

    /// Expand one template: substitute `<name>` tokens left to right,
    /// then resolve `{...}` fragments. DSL output may itself introduce
    /// fresh non-terminals, so the pass repeats until none remain, each
    /// round charged against the depth guard.
    pub fn expand_template(
        &self,
        template: &str,
        depth: usize,
        session: &mut Session,
    ) -> Result<String, ExpandError> {
        if depth > MAX_DEPTH {
            return Err(ExpandError::RecursionLimit {
                symbol: template.to_string(),
                depth,
            });
        }
        let substituted = self.substitute_nonterminals(template, depth, session)?;
        let resolved = dsl::resolve(&substituted, self, session, depth)?;
        if has_nonterminal(&resolved) {
            return self.expand_template(&resolved, depth + 1, session);
        }
        Ok(resolved)
    }

    fn substitute_nonterminals(
        &self,
        text: &str,
        depth: usize,
        session: &mut Session,
    ) -> Result<String, ExpandError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find('<') {
            let Some(offset) = rest[open + 1..].find('>') else {
                // '<' with no closing '>' is literal text
                out.push_str(&rest[..=open]);
                rest = &rest[open + 1..];
                continue;
            };
            let close = open + 1 + offset;
            let name = &rest[open + 1..close];
            out.push_str(&rest[..open]);
            if let Some(range) = name.strip_prefix("random:") {
                out.push_str(&dsl::legacy_random(range, session)?);
            } else {
                out.push_str(&self.expand(name, depth + 1, session)?);
            }
            rest = &rest[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn has_nonterminal(text: &str) -> bool {
    match text.find('<') {
        Some(open) => text[open + 1..].contains('>'),
        None => false,
    }
}
