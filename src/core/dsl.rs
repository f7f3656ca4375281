/// Inline expression DSL — tokenizer and innermost-first evaluator.
///
/// Templates may embed `{...}` fragments for random numbers, choices,
/// weighted picks, category calls, and session variables. Evaluation is
/// innermost-first: the leaf-most brace pair is located, evaluated to a
/// plain string, spliced back, and the scan repeats until no braces
/// remain. Nesting of arbitrary depth therefore just works, and a
/// malformed fragment is reported with its exact text.
use rand::Rng;

use crate::core::expand::{ExpandError, Expander};
use crate::core::grammar::pick_weighted;
use crate::core::session::Session;

/// A parsed DSL expression. The token after the opening brace selects
/// the form.
#[derive(Debug, Clone, PartialEq)]
pub enum DslExpr {
    /// `{R a-b}` — uniform integer in `[a, b]`.
    Range { lo: i64, hi: i64 },
    /// `{R a-b SEED:name}` — deterministic per (session seed, name).
    SeededRange { lo: i64, hi: i64, name: String },
    /// `{O x|y|z}` — uniform pick.
    Or(Vec<String>),
    /// `{Mk x|y|z}` — k distinct options in randomized order.
    MultiPick { count: usize, items: Vec<String> },
    /// `{W x:w1|y:w2}` — cumulative-weight pick.
    Weighted(Vec<(String, u32)>),
    /// `{C name}` / `{Ck name}` — delegate to a grammar rule.
    Category { name: String, count: Option<usize> },
    /// `{VAR:name value}` — bind-if-absent, returns the stored value.
    VarBind { name: String, value: String },
    /// `{VAR:name}` — read a previously bound variable.
    VarRead { name: String },
}

/// Resolve every `{...}` fragment in `text`. On success the result
/// contains no braces; unresolved fragments never leak into output.
pub fn resolve(
    text: &str,
    expander: &Expander<'_>,
    session: &mut Session,
    depth: usize,
) -> Result<String, ExpandError> {
    let mut text = text.to_string();
    loop {
        let Some(close) = text.find('}') else {
            if let Some(open) = text.find('{') {
                return Err(ExpandError::MalformedExpression(format!(
                    "unclosed '{{' in \"{}\"",
                    &text[open..]
                )));
            }
            return Ok(text);
        };
        let Some(open) = text[..close].rfind('{') else {
            return Err(ExpandError::MalformedExpression(format!(
                "unmatched '}}' in \"{}\"",
                text
            )));
        };
        // open..close is leaf-most: no '{' survives between them
        let expr = parse(&text[open + 1..close])?;
        let value = eval(expr, expander, session, depth)?;
        text.replace_range(open..=close, &value);
    }
}

/// The legacy `<random:X-Y>` non-terminal, an alias for `{R X-Y}`.
pub(crate) fn legacy_random(
    range: &str,
    session: &mut Session,
) -> Result<String, ExpandError> {
    let (lo, hi) = parse_range(range)
        .ok_or_else(|| ExpandError::MalformedExpression(format!("random:{}", range)))?;
    Ok(session.rng().gen_range(lo..=hi).to_string())
}

/// Parse one brace-free fragment into a `DslExpr`.
pub fn parse(fragment: &str) -> Result<DslExpr, ExpandError> {
    let body = fragment.trim();
    let malformed = || ExpandError::MalformedExpression(fragment.to_string());

    if let Some(rest) = body.strip_prefix("VAR:") {
        let rest = rest.trim();
        let (name, value) = match rest.split_once(char::is_whitespace) {
            Some((name, value)) => (name, Some(value.trim())),
            None => (rest, None),
        };
        if name.is_empty() {
            return Err(malformed());
        }
        return Ok(match value {
            Some(value) => DslExpr::VarBind {
                name: name.to_string(),
                value: value.to_string(),
            },
            None => DslExpr::VarRead {
                name: name.to_string(),
            },
        });
    }

    if let Some(rest) = body.strip_prefix("R ") {
        let rest = rest.trim();
        let (range_part, seed_name) = match rest.split_once("SEED:") {
            Some((range, name)) => (range.trim(), Some(name.trim())),
            None => (rest, None),
        };
        let (lo, hi) = parse_range(range_part).ok_or_else(malformed)?;
        return Ok(match seed_name {
            Some(name) if !name.is_empty() => DslExpr::SeededRange {
                lo,
                hi,
                name: name.to_string(),
            },
            Some(_) => return Err(malformed()),
            None => DslExpr::Range { lo, hi },
        });
    }

    if let Some(rest) = body.strip_prefix("O ") {
        let options = split_options(rest).ok_or_else(malformed)?;
        return Ok(DslExpr::Or(options));
    }

    if let Some(rest) = body.strip_prefix("W ") {
        let mut entries = Vec::new();
        for part in rest.split('|') {
            let (text, weight) = part.trim().rsplit_once(':').ok_or_else(malformed)?;
            let weight: u32 = weight.trim().parse().map_err(|_| malformed())?;
            if weight == 0 || text.trim().is_empty() {
                return Err(malformed());
            }
            entries.push((text.trim().to_string(), weight));
        }
        return Ok(DslExpr::Weighted(entries));
    }

    if body.starts_with('M') {
        let (head, rest) = body.split_once(' ').ok_or_else(malformed)?;
        let count: usize = head[1..].parse().map_err(|_| malformed())?;
        if count == 0 {
            return Err(malformed());
        }
        let items = split_options(rest).ok_or_else(malformed)?;
        return Ok(DslExpr::MultiPick { count, items });
    }

    if body.starts_with('C') {
        let (head, name) = body.split_once(' ').ok_or_else(malformed)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(malformed());
        }
        let count = if head == "C" {
            None
        } else {
            let count: usize = head[1..].parse().map_err(|_| malformed())?;
            if count == 0 {
                return Err(malformed());
            }
            Some(count)
        };
        return Ok(DslExpr::Category {
            name: name.to_string(),
            count,
        });
    }

    Err(malformed())
}

fn parse_range(range: &str) -> Option<(i64, i64)> {
    let (lo, hi) = range.split_once('-')?;
    let lo: i64 = lo.trim().parse().ok()?;
    let hi: i64 = hi.trim().parse().ok()?;
    (lo <= hi).then_some((lo, hi))
}

fn split_options(rest: &str) -> Option<Vec<String>> {
    let options: Vec<String> = rest.split('|').map(|o| o.trim().to_string()).collect();
    if options.iter().all(String::is_empty) {
        return None;
    }
    Some(options)
}

fn eval(
    expr: DslExpr,
    expander: &Expander<'_>,
    session: &mut Session,
    depth: usize,
) -> Result<String, ExpandError> {
    match expr {
        DslExpr::Range { lo, hi } => Ok(session.rng().gen_range(lo..=hi).to_string()),
        DslExpr::SeededRange { lo, hi, name } => Ok(session.seeded_draw(&name, lo, hi)),
        DslExpr::Or(options) => {
            let index = session.rng().gen_range(0..options.len());
            Ok(options[index].clone())
        }
        DslExpr::MultiPick { count, items } => {
            let mut unique: Vec<&String> = Vec::with_capacity(items.len());
            for item in &items {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            if unique.len() < count {
                return Err(ExpandError::InsufficientOptions {
                    requested: count,
                    available: unique.len(),
                });
            }
            let picked = rand::seq::index::sample(session.rng(), unique.len(), count);
            let parts: Vec<&str> = picked.iter().map(|i| unique[i].as_str()).collect();
            Ok(parts.join(" "))
        }
        DslExpr::Weighted(entries) => {
            let entry = pick_weighted(&entries, |(_, weight)| *weight, session.rng());
            Ok(entry.0.clone())
        }
        DslExpr::Category { name, count: None } => expander.expand(&name, depth + 1, session),
        DslExpr::Category {
            name,
            count: Some(count),
        } => {
            let options = expander.grammar().lookup(&name)?;
            if options.len() < count {
                return Err(ExpandError::InsufficientOptions {
                    requested: count,
                    available: options.len(),
                });
            }
            let picked = rand::seq::index::sample(session.rng(), options.len(), count);
            let mut parts = Vec::with_capacity(count);
            for index in picked {
                parts.push(expander.expand_template(&options[index].template, depth + 1, session)?);
            }
            Ok(parts.join(" "))
        }
        DslExpr::VarBind { name, value } => {
            // Nested fragments in `value` were already resolved by the
            // innermost-first scan; only the first bind sticks.
            if let Some(existing) = session.variable(&name) {
                return Ok(existing.to_string());
            }
            session.bind_variable(&name, value.clone());
            Ok(value)
        }
        DslExpr::VarRead { name } => session
            .variable(&name)
            .map(str::to_string)
            .ok_or(ExpandError::UnboundVariable(name)),
    }
}
