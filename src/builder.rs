//! Programmatic construction of grammar descriptors
//!
//! [`GrammarBuilder`] is the producer side of the descriptor ABI: it
//! registers symbols and states, records transitions, and serializes the
//! result into the binary layout defined in [`crate::descriptor`].
//!
//! The builder is a serializer, not a validator. It writes exactly what it
//! is told, which makes it equally useful for compiling real grammars and
//! for producing deliberately inconsistent tables in tests. The loader
//! remains the single authority on well-formedness.

use crate::descriptor::{action_codes, symbol_codes, ABI_VERSION, MAGIC};
use crate::error::Error;
use crate::language::Language;
use crate::loader;

#[derive(Debug, Clone, Copy)]
struct SymbolEntry {
    kind: u8,
    // Index into the builder's name arena
    name: usize,
}

#[derive(Debug, Clone, Copy)]
struct TransitionEntry {
    state: u32,
    symbol: u32,
    action: u8,
    target: u32,
}

/// Builder for serialized grammar descriptors
///
/// Symbols and states are identified by the ids the registration methods
/// return, in registration order starting from zero.
///
/// # Example
///
/// ```
/// use kql_grammar_tools::{load, GrammarBuilder};
///
/// let mut grammar = GrammarBuilder::new("greeting");
/// let end = grammar.terminal("end");
/// let hello = grammar.terminal("hello");
/// let doc = grammar.non_terminal("document");
/// let s0 = grammar.state();
/// let s1 = grammar.state();
/// grammar.shift(s0, hello, s1);
/// grammar.reduce(s1, end, doc);
/// grammar.start_state(s0);
///
/// let language = load(&grammar.build()).unwrap();
/// assert_eq!(language.name(), "greeting");
/// ```
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    name: String,
    abi_version: u16,
    names: Vec<String>,
    symbols: Vec<SymbolEntry>,
    state_count: u32,
    start_state: u32,
    transitions: Vec<TransitionEntry>,
}

impl GrammarBuilder {
    /// Create a builder for a grammar with the given name
    ///
    /// The descriptor's ABI version defaults to the current
    /// [`ABI_VERSION`](crate::descriptor::ABI_VERSION).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abi_version: ABI_VERSION,
            names: Vec::new(),
            symbols: Vec::new(),
            state_count: 0,
            start_state: 0,
            transitions: Vec::new(),
        }
    }

    /// Override the ABI version written into the descriptor header
    pub fn abi_version(&mut self, version: u16) -> &mut Self {
        self.abi_version = version;
        self
    }

    /// Register a terminal symbol, returning its id
    pub fn terminal(&mut self, name: impl Into<String>) -> u32 {
        self.symbol(symbol_codes::TERMINAL, name)
    }

    /// Register a non-terminal symbol, returning its id
    pub fn non_terminal(&mut self, name: impl Into<String>) -> u32 {
        self.symbol(symbol_codes::NON_TERMINAL, name)
    }

    /// Register an auxiliary symbol (whitespace, comments), returning its id
    pub fn auxiliary(&mut self, name: impl Into<String>) -> u32 {
        self.symbol(symbol_codes::AUXILIARY, name)
    }

    fn symbol(&mut self, kind: u8, name: impl Into<String>) -> u32 {
        let id = self.symbols.len() as u32;
        self.names.push(name.into());
        self.symbols.push(SymbolEntry {
            kind,
            name: self.names.len() - 1,
        });
        id
    }

    /// Allocate a new parse state, returning its id
    pub fn state(&mut self) -> u32 {
        let id = self.state_count;
        self.state_count += 1;
        id
    }

    /// Set the state a fresh parser instance starts in (defaults to 0)
    pub fn start_state(&mut self, state: u32) -> &mut Self {
        self.start_state = state;
        self
    }

    /// Record a shift action: in `state` on `symbol`, move to `target`
    pub fn shift(&mut self, state: u32, symbol: u32, target: u32) -> &mut Self {
        self.transition(state, symbol, action_codes::SHIFT, target)
    }

    /// Record a reduce action: in `state` on `symbol`, produce `non_terminal`
    pub fn reduce(&mut self, state: u32, symbol: u32, non_terminal: u32) -> &mut Self {
        self.transition(state, symbol, action_codes::REDUCE, non_terminal)
    }

    /// Record an accept action: in `state` on `symbol`, parsing is complete
    pub fn accept(&mut self, state: u32, symbol: u32) -> &mut Self {
        self.transition(state, symbol, action_codes::ACCEPT, 0)
    }

    /// Record a raw transition with an arbitrary action code and target
    pub fn transition(&mut self, state: u32, symbol: u32, action: u8, target: u32) -> &mut Self {
        self.transitions.push(TransitionEntry {
            state,
            symbol,
            action,
            target,
        });
        self
    }

    /// Serialize the descriptor into its binary layout
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(64 + self.symbols.len() * 16 + self.transitions.len() * 13);

        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&self.abi_version.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        write_string(&mut bytes, &self.name);

        bytes.extend_from_slice(&(self.symbols.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.state_count.to_le_bytes());
        bytes.extend_from_slice(&(self.transitions.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.start_state.to_le_bytes());

        for symbol in &self.symbols {
            bytes.push(symbol.kind);
            write_string(&mut bytes, &self.names[symbol.name]);
        }

        for transition in &self.transitions {
            bytes.extend_from_slice(&transition.state.to_le_bytes());
            bytes.extend_from_slice(&transition.symbol.to_le_bytes());
            bytes.push(transition.action);
            bytes.extend_from_slice(&transition.target.to_le_bytes());
        }

        bytes
    }

    /// Serialize and immediately load the descriptor
    ///
    /// # Errors
    ///
    /// Returns whatever the loader would return for the serialized bytes.
    pub fn build_language(&self) -> Result<Language, Error> {
        loader::load(&self.build())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn write_string(bytes: &mut Vec<u8>, value: &str) {
    bytes.extend_from_slice(&(value.len() as u16).to_le_bytes());
    bytes.extend_from_slice(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{ParseAction, SymbolKind};

    #[test]
    fn test_build_round_trips_through_loader() {
        let mut grammar = GrammarBuilder::new("sample");
        let end = grammar.terminal("end");
        let word = grammar.terminal("word");
        let doc = grammar.non_terminal("document");
        let comment = grammar.auxiliary("line_comment");
        let s0 = grammar.state();
        let s1 = grammar.state();
        grammar.shift(s0, word, s1);
        grammar.reduce(s1, end, doc);
        grammar.start_state(s0);

        let language = grammar.build_language().unwrap();
        assert_eq!(language.name(), "sample");
        assert_eq!(language.symbol_count(), 4);
        assert_eq!(language.state_count(), 2);
        assert_eq!(language.start_state(), s0);
        assert_eq!(language.symbol_kind(end), Some(SymbolKind::Terminal));
        assert_eq!(language.symbol_kind(comment), Some(SymbolKind::Auxiliary));
        assert_eq!(language.action(s0, word), Some(ParseAction::Shift { state: s1 }));
        assert_eq!(language.action(s1, end), Some(ParseAction::Reduce { symbol: doc }));
    }

    #[test]
    fn test_builds_are_byte_identical() {
        let mut grammar = GrammarBuilder::new("sample");
        let word = grammar.terminal("word");
        let s0 = grammar.state();
        grammar.shift(s0, word, s0);
        assert_eq!(grammar.build(), grammar.build());
    }

    #[test]
    fn test_abi_version_override() {
        let mut grammar = GrammarBuilder::new("old");
        let word = grammar.terminal("word");
        let s0 = grammar.state();
        grammar.shift(s0, word, s0);
        grammar.abi_version(1);
        let err = grammar.build_language().unwrap_err();
        assert!(matches!(err, crate::Error::VersionMismatch { found: 1, .. }));
    }

    #[test]
    fn test_builder_does_not_validate() {
        // A transition referencing a state that was never allocated still
        // serializes; only the loader rejects it.
        let mut grammar = GrammarBuilder::new("broken");
        let word = grammar.terminal("word");
        grammar.shift(99, word, 100);
        let bytes = grammar.build();
        assert!(!bytes.is_empty());
        assert!(crate::load(&bytes).is_err());
    }
}
