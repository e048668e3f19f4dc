use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::types::BuildSettings;

/// Ceiling on nested substitutions below one top-level reference
pub const MAX_EXPANSION_DEPTH: usize = 32;

/// Substitutions allowed while expanding one input
pub const MAX_SUBSTITUTIONS: usize = 4096;

/// Bytes substitutions may insert while expanding one input
pub const MAX_EXPANDED_LEN: usize = 1 << 20;

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:\(([A-Za-z_][A-Za-z0-9_]*)\)|\{([A-Za-z_][A-Za-z0-9_]*)\})")
        .expect("macro reference pattern is valid")
});

/// Substitutes `$(NAME)` and `${NAME}` references with build setting values.
///
/// Substituted values are expanded again, so settings may refer to other
/// settings. References to unknown settings are kept verbatim: some of them
/// are meant for the environment of the launched test process. A reference
/// that would recurse into itself, nest deeper than [`MAX_EXPANSION_DEPTH`],
/// or go past [`MAX_SUBSTITUTIONS`] or [`MAX_EXPANDED_LEN`] is also kept
/// verbatim.
///
/// Without settings (the dump failed) the expander passes input through.
#[derive(Debug, Clone, Copy)]
pub struct MacroExpander<'a> {
    settings: Option<&'a BuildSettings>,
}

impl<'a> MacroExpander<'a> {
    pub fn new(settings: Option<&'a BuildSettings>) -> Self {
        Self { settings }
    }

    /// Expand a string, a list of strings, or the values of a string map
    pub fn expand<T: Expand + ?Sized>(&self, input: &T) -> T::Output {
        input.expand_with(self)
    }

    pub fn expand_str(&self, input: &str) -> String {
        match self.settings {
            Some(settings) => Expansion::new(settings).expand(input),
            None => input.to_string(),
        }
    }
}

/// Whether `input` contains anything that looks like a macro reference
pub fn contains_reference(input: &str) -> bool {
    REFERENCE.is_match(input)
}

/// State of one top-level expansion
struct Expansion<'s> {
    settings: &'s BuildSettings,
    /// Names being expanded above the current input
    chain: Vec<String>,
    /// Expanded values of names whose expansion hit no limit
    resolved: HashMap<String, String>,
    substitutions: usize,
    inserted: usize,
    /// Set when a limit left a reference unexpanded below the current name
    truncated: bool,
}

impl<'s> Expansion<'s> {
    fn new(settings: &'s BuildSettings) -> Self {
        Self {
            settings,
            chain: Vec::new(),
            resolved: HashMap::new(),
            substitutions: 0,
            inserted: 0,
            truncated: false,
        }
    }

    fn expand(&mut self, input: &str) -> String {
        let settings = self.settings;
        REFERENCE
            .replace_all(input, |caps: &Captures<'_>| {
                let reference = &caps[0];
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map_or("", |m| m.as_str());

                settings
                    .get(name)
                    .and_then(|value| self.substitute(reference, name, value))
                    .unwrap_or_else(|| reference.to_string())
            })
            .into_owned()
    }

    /// Expanded value of `name`, or `None` when a limit keeps `reference` as is
    fn substitute(&mut self, reference: &str, name: &str, value: &'s str) -> Option<String> {
        if self.substitutions >= MAX_SUBSTITUTIONS {
            return self.stop(reference, "substitution limit reached");
        }

        if let Some(len) = self.resolved.get(name).map(String::len) {
            self.claim(reference, len)?;
            return self.resolved.get(name).cloned();
        }

        if self.chain.len() >= MAX_EXPANSION_DEPTH || self.chain.iter().any(|n| n == name) {
            return self.stop(reference, "depth exceeded");
        }

        let outer = std::mem::replace(&mut self.truncated, false);
        self.chain.push(name.to_string());
        let expanded = self.expand(value);
        self.chain.pop();

        if !self.truncated {
            self.resolved.insert(name.to_string(), expanded.clone());
        }
        self.truncated |= outer;

        self.claim(reference, expanded.len())?;
        Some(expanded)
    }

    /// Count one substitution inserting `len` bytes against the limits
    fn claim(&mut self, reference: &str, len: usize) -> Option<()> {
        if self.inserted + len > MAX_EXPANDED_LEN {
            return self.stop(reference, "expanded length limit reached");
        }
        self.substitutions += 1;
        self.inserted += len;
        Some(())
    }

    fn stop<T>(&mut self, reference: &str, reason: &str) -> Option<T> {
        self.truncated = true;
        tracing::debug!(
            "Macro expansion stopped at {} ({}, via {})",
            reference,
            reason,
            self.chain.join(" -> ")
        );
        None
    }
}

/// Input shapes the expander accepts
pub trait Expand {
    type Output;

    fn expand_with(&self, expander: &MacroExpander<'_>) -> Self::Output;
}

impl Expand for str {
    type Output = String;

    fn expand_with(&self, expander: &MacroExpander<'_>) -> String {
        expander.expand_str(self)
    }
}

impl Expand for String {
    type Output = String;

    fn expand_with(&self, expander: &MacroExpander<'_>) -> String {
        expander.expand_str(self)
    }
}

impl Expand for [String] {
    type Output = Vec<String>;

    fn expand_with(&self, expander: &MacroExpander<'_>) -> Vec<String> {
        self.iter().map(|arg| expander.expand_str(arg)).collect()
    }
}

impl Expand for Vec<String> {
    type Output = Vec<String>;

    fn expand_with(&self, expander: &MacroExpander<'_>) -> Vec<String> {
        self.as_slice().expand_with(expander)
    }
}

/// Only values are expanded; keys are kept as written.
impl Expand for IndexMap<String, String> {
    type Output = IndexMap<String, String>;

    fn expand_with(&self, expander: &MacroExpander<'_>) -> IndexMap<String, String> {
        self.iter()
            .map(|(key, value)| (key.clone(), expander.expand_str(value)))
            .collect()
    }
}
