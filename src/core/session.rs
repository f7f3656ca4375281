/// Session state — per-generation RNG, context memory, variables, seen set.
///
/// A `Session` is created at the start of one `generate` call and
/// discarded at the end. Nothing in it survives across calls, which is
/// what makes independent generations reproducible and non-interfering.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashSet, FxHasher};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Write-once slot store giving one session's output internal consistency.
///
/// The first resolution of a tracked category (vendor, os, ...) is
/// remembered; every later reference to the same slot in the session
/// returns the stored value instead of redrawing.
#[derive(Debug, Clone, Default)]
pub struct ContextMemory {
    slots: HashMap<String, String>,
}

impl ContextMemory {
    pub fn get(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    /// Store `value` under `slot` unless the slot is already filled.
    /// Returns the value that ends up stored. First write wins.
    pub fn bind_first(&mut self, slot: &str, value: String) -> String {
        self.slots
            .entry(slot.to_string())
            .or_insert(value)
            .clone()
    }

    /// Resolve a tracked slot: draw on first use, replay thereafter.
    pub fn resolve_tracked<E>(
        &mut self,
        slot: &str,
        draw: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        if let Some(value) = self.slots.get(slot) {
            return Ok(value.clone());
        }
        let value = draw()?;
        Ok(self.bind_first(slot, value))
    }

    /// Read-only copy of the tracked slots, for inspection and tests.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.slots.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// All mutable state owned by one generation call.
#[derive(Debug)]
pub struct Session {
    seed: u64,
    rng: StdRng,
    context: ContextMemory,
    variables: HashMap<String, String>,
    seeded_draws: HashMap<String, String>,
    seen: FxHashSet<String>,
}

impl Session {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            context: ContextMemory::default(),
            variables: HashMap::new(),
            seeded_draws: HashMap::new(),
            seen: FxHashSet::default(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn context(&self) -> &ContextMemory {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ContextMemory {
        &mut self.context
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn bind_variable(&mut self, name: &str, value: String) {
        self.variables.entry(name.to_string()).or_insert(value);
    }

    /// A deterministic draw keyed by a seed-multiplier name.
    ///
    /// The value is derived from (session seed, name, bounds) through a
    /// sub-RNG, so the same name always replays the same number within a
    /// session while different names stay independent. Cached per name.
    pub fn seeded_draw(&mut self, name: &str, lo: i64, hi: i64) -> String {
        if let Some(value) = self.seeded_draws.get(name) {
            return value.clone();
        }
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        name.hash(&mut hasher);
        lo.hash(&mut hasher);
        hi.hash(&mut hasher);
        let mut sub = StdRng::seed_from_u64(hasher.finish());
        let value = sub.gen_range(lo..=hi).to_string();
        self.seeded_draws.insert(name.to_string(), value.clone());
        value
    }

    /// Record an emitted sentence or block. Returns false if it was
    /// already present.
    pub fn mark_seen(&mut self, text: &str) -> bool {
        self.seen.insert(text.to_string())
    }

    pub fn was_seen(&self, text: &str) -> bool {
        self.seen.contains(text)
    }
}
