//! Build setting macro expansion

pub mod expander;

pub use expander::{contains_reference, Expand, MacroExpander, MAX_EXPANSION_DEPTH};
