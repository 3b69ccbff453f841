//! Generic utility primitives with zero domain knowledge.
//!
//! - `shell` - Shell escaping and quoting
//! - `suggest` - Fuzzy suggestions for mistyped names

pub mod shell;
pub mod suggest;
