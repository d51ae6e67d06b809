//! The validated, immutable Language handle
//!
//! A [`Language`] wraps a fully validated grammar descriptor. It is cheap to
//! clone (the decoded tables sit behind an `Arc`) and safe to share read-only
//! across any number of parser instances and threads. There is no
//! partially-initialized handle: construction goes through the loader, which
//! either validates the whole descriptor or fails.

use std::sync::Arc;

use crate::error::Error;
use crate::loader;

/// Kind of a grammar symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A terminal (token) symbol produced by the lexer
    Terminal,
    /// A non-terminal (rule) symbol produced by reductions
    NonTerminal,
    /// An auxiliary symbol (extras such as whitespace and comments)
    Auxiliary,
}

/// A symbol in the grammar's symbol table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Symbol name, as declared by the grammar
    pub name: String,
    /// Symbol kind
    pub kind: SymbolKind,
}

/// A parse action looked up from the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAction {
    /// Consume the lookahead symbol and move to `state`
    Shift {
        /// Target parse state
        state: u32,
    },
    /// Pop and produce the non-terminal `symbol`
    Reduce {
        /// Non-terminal symbol id produced by the reduction
        symbol: u32,
    },
    /// Parsing is complete
    Accept,
}

/// Decoded, immutable grammar tables
///
/// Observable behavior of a `Language` is a pure function of this data, so
/// equality here gives behavioral equality of handles.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct LanguageData {
    pub(crate) name: String,
    pub(crate) abi_version: u16,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) state_count: u32,
    pub(crate) start_state: u32,
    /// Sorted by `(state, symbol)` for binary-search lookup
    pub(crate) transitions: Vec<(u32, u32, ParseAction)>,
}

/// A validated grammar, ready to hand to parser instances
///
/// # Example
///
/// ```
/// use kql_grammar_tools::kql;
///
/// fn main() -> Result<(), kql_grammar_tools::Error> {
///     let language = kql::language()?;
///     assert!(language.symbol_count() > 0);
///     assert_eq!(language.name(), "kql");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Language {
    inner: Arc<LanguageData>,
}

impl Language {
    pub(crate) fn new(data: LanguageData) -> Self {
        Self {
            inner: Arc::new(data),
        }
    }

    /// Load a language from serialized descriptor bytes
    ///
    /// Equivalent to [`crate::load`]. The descriptor is validated in full
    /// before any handle is observable.
    pub fn from_bytes(descriptor: &[u8]) -> Result<Self, Error> {
        loader::load(descriptor)
    }

    /// The grammar's declared name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// ABI version of the descriptor this language was loaded from
    #[must_use]
    pub fn abi_version(&self) -> u16 {
        self.inner.abi_version
    }

    /// Number of symbols in the grammar
    #[must_use]
    pub fn symbol_count(&self) -> u32 {
        self.inner.symbols.len() as u32
    }

    /// Number of parse states in the grammar
    #[must_use]
    pub fn state_count(&self) -> u32 {
        self.inner.state_count
    }

    /// The state a fresh parser instance starts in
    #[must_use]
    pub fn start_state(&self) -> u32 {
        self.inner.start_state
    }

    /// Name of the symbol with the given id
    #[must_use]
    pub fn symbol_name(&self, id: u32) -> Option<&str> {
        self.inner.symbols.get(id as usize).map(|s| s.name.as_str())
    }

    /// Kind of the symbol with the given id
    #[must_use]
    pub fn symbol_kind(&self, id: u32) -> Option<SymbolKind> {
        self.inner.symbols.get(id as usize).map(|s| s.kind)
    }

    /// Look up a symbol id by name
    ///
    /// If the grammar declares several symbols with the same name, the
    /// lowest id wins.
    #[must_use]
    pub fn symbol_for_name(&self, name: &str) -> Option<u32> {
        self.inner
            .symbols
            .iter()
            .position(|s| s.name == name)
            .map(|i| i as u32)
    }

    /// Iterate over all symbols in id order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.inner.symbols.iter()
    }

    /// Look up the parse action for a state and lookahead symbol
    ///
    /// Returns `None` when the table has no entry, which a parser treats
    /// as a syntax error at that position.
    #[must_use]
    pub fn action(&self, state: u32, symbol: u32) -> Option<ParseAction> {
        self.inner
            .transitions
            .binary_search_by_key(&(state, symbol), |&(s, sym, _)| (s, sym))
            .ok()
            .map(|i| self.inner.transitions[i].2)
    }

    /// Number of entries in the transition table
    #[must_use]
    pub fn transition_count(&self) -> u32 {
        self.inner.transitions.len() as u32
    }
}

impl PartialEq for Language {
    /// Behavioral equality: two handles compare equal when their decoded
    /// tables are identical, regardless of where each handle is stored.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || *self.inner == *other.inner
    }
}

impl Eq for Language {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GrammarBuilder;

    fn tiny_language() -> Language {
        let mut grammar = GrammarBuilder::new("tiny");
        let end = grammar.terminal("end");
        let word = grammar.terminal("word");
        let doc = grammar.non_terminal("document");
        let s0 = grammar.state();
        let s1 = grammar.state();
        grammar.shift(s0, word, s1);
        grammar.reduce(s1, end, doc);
        grammar.accept(s1, word);
        grammar.start_state(s0);
        grammar.build_language().expect("tiny grammar is well-formed")
    }

    #[test]
    fn test_symbol_lookup() {
        let language = tiny_language();
        assert_eq!(language.symbol_count(), 3);
        assert_eq!(language.symbol_name(1), Some("word"));
        assert_eq!(language.symbol_for_name("document"), Some(2));
        assert_eq!(language.symbol_kind(2), Some(SymbolKind::NonTerminal));
        assert_eq!(language.symbol_name(99), None);
        assert_eq!(language.symbol_for_name("missing"), None);
    }

    #[test]
    fn test_action_lookup() {
        let language = tiny_language();
        assert_eq!(language.action(0, 1), Some(ParseAction::Shift { state: 1 }));
        assert_eq!(language.action(1, 0), Some(ParseAction::Reduce { symbol: 2 }));
        assert_eq!(language.action(1, 1), Some(ParseAction::Accept));
        assert_eq!(language.action(0, 0), None);
    }

    #[test]
    fn test_clones_share_tables() {
        let language = tiny_language();
        let clone = language.clone();
        assert_eq!(language, clone);
        assert_eq!(language.action(0, 1), clone.action(0, 1));
    }

    #[test]
    fn test_handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Language>();
    }
}
