//! Babble Engine — grammar-driven security technobabble generation.
//!
//! Produces plausible-looking but meaningless hacker prose by expanding
//! a weighted context-free grammar with an inline expression DSL for
//! numbers, choices, and session-scoped variables. Context memory keeps
//! one generation internally consistent (same vendor, version, and CVE
//! across sentences) and a seen-set keeps sentences from repeating.

pub mod core;
