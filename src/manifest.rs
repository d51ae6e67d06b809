//! JSON grammar manifest format
//!
//! A manifest is the human-readable description a grammar author maintains;
//! compiling it lowers the description into the binary descriptor layout via
//! [`GrammarBuilder`]. Symbols are referenced by name in the manifest and
//! resolved to ids at compile time.
//!
//! ```json
//! {
//!   "name": "kql",
//!   "symbols": [
//!     { "name": "end" },
//!     { "name": "identifier" },
//!     { "name": "source_file", "kind": "non_terminal" }
//!   ],
//!   "states": 2,
//!   "transitions": [
//!     { "state": 0, "symbol": "identifier", "action": "shift", "target": 1 },
//!     { "state": 1, "symbol": "end", "action": "reduce", "produces": "source_file" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::builder::GrammarBuilder;
use crate::descriptor::ABI_VERSION;
use crate::error::Error;
use crate::language::Language;

/// A grammar described as data, compilable to a descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarManifest {
    /// Grammar name
    pub name: String,

    /// Descriptor ABI version to emit (defaults to the current version)
    #[serde(default = "default_abi_version")]
    pub abi_version: u16,

    /// Symbols in id order
    #[serde(default)]
    pub symbols: Vec<SymbolDef>,

    /// Number of parse states
    pub states: u32,

    /// State a fresh parser starts in
    #[serde(default)]
    pub start_state: u32,

    /// Transition table, with symbols referenced by name
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
}

fn default_abi_version() -> u16 {
    ABI_VERSION
}

impl GrammarManifest {
    /// Create an empty manifest with the given grammar name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abi_version: ABI_VERSION,
            symbols: Vec::new(),
            states: 0,
            start_state: 0,
            transitions: Vec::new(),
        }
    }

    /// Builder method to add a symbol
    #[must_use]
    pub fn symbol(mut self, symbol: SymbolDef) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// Builder method to set the state count
    #[must_use]
    pub fn states(mut self, states: u32) -> Self {
        self.states = states;
        self
    }

    /// Builder method to add a transition
    #[must_use]
    pub fn transition(mut self, transition: TransitionDef) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Parse a manifest from JSON
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the manifest to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Lower the manifest into serialized descriptor bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSymbol`] when a transition names a symbol the
    /// manifest never declared. Structural problems (out-of-range states,
    /// conflicting actions) are left for the loader to reject.
    pub fn compile(&self) -> Result<Vec<u8>, Error> {
        let mut grammar = GrammarBuilder::new(self.name.clone());
        grammar.abi_version(self.abi_version);

        let mut ids: HashMap<&str, u32> = HashMap::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            let id = match symbol.kind {
                SymbolDefKind::Terminal => grammar.terminal(symbol.name.clone()),
                SymbolDefKind::NonTerminal => grammar.non_terminal(symbol.name.clone()),
                SymbolDefKind::Auxiliary => grammar.auxiliary(symbol.name.clone()),
            };
            // First declaration wins for duplicate names, matching
            // Language::symbol_for_name.
            ids.entry(symbol.name.as_str()).or_insert(id);
        }

        for _ in 0..self.states {
            grammar.state();
        }
        grammar.start_state(self.start_state);

        for transition in &self.transitions {
            let symbol = resolve(&ids, &transition.symbol)?;
            match &transition.action {
                ActionDef::Shift { target } => {
                    grammar.shift(transition.state, symbol, *target);
                }
                ActionDef::Reduce { produces } => {
                    let non_terminal = resolve(&ids, produces)?;
                    grammar.reduce(transition.state, symbol, non_terminal);
                }
                ActionDef::Accept => {
                    grammar.accept(transition.state, symbol);
                }
            }
        }

        Ok(grammar.build())
    }

    /// Compile and load in one step
    pub fn compile_language(&self) -> Result<Language, Error> {
        crate::loader::load(&self.compile()?)
    }
}

fn resolve(ids: &HashMap<&str, u32>, name: &str) -> Result<u32, Error> {
    ids.get(name).copied().ok_or_else(|| Error::UnknownSymbol {
        name: name.to_string(),
    })
}

/// A symbol declaration in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDef {
    /// Symbol name
    pub name: String,

    /// Symbol kind (defaults to terminal)
    #[serde(default)]
    pub kind: SymbolDefKind,
}

impl SymbolDef {
    /// Declare a terminal symbol
    #[must_use]
    pub fn terminal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SymbolDefKind::Terminal,
        }
    }

    /// Declare a non-terminal symbol
    #[must_use]
    pub fn non_terminal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SymbolDefKind::NonTerminal,
        }
    }

    /// Declare an auxiliary symbol
    #[must_use]
    pub fn auxiliary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SymbolDefKind::Auxiliary,
        }
    }
}

/// Symbol kind in a manifest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolDefKind {
    /// A terminal (token) symbol
    #[default]
    Terminal,
    /// A non-terminal (rule) symbol
    NonTerminal,
    /// An auxiliary symbol (extras)
    Auxiliary,
}

/// A transition in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDef {
    /// Source parse state
    pub state: u32,

    /// Lookahead symbol, by name
    pub symbol: String,

    /// Action to take
    #[serde(flatten)]
    pub action: ActionDef,
}

impl TransitionDef {
    /// A shift transition
    #[must_use]
    pub fn shift(state: u32, symbol: impl Into<String>, target: u32) -> Self {
        Self {
            state,
            symbol: symbol.into(),
            action: ActionDef::Shift { target },
        }
    }

    /// A reduce transition
    #[must_use]
    pub fn reduce(state: u32, symbol: impl Into<String>, produces: impl Into<String>) -> Self {
        Self {
            state,
            symbol: symbol.into(),
            action: ActionDef::Reduce {
                produces: produces.into(),
            },
        }
    }

    /// An accept transition
    #[must_use]
    pub fn accept(state: u32, symbol: impl Into<String>) -> Self {
        Self {
            state,
            symbol: symbol.into(),
            action: ActionDef::Accept,
        }
    }
}

/// Action of a manifest transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDef {
    /// Consume the symbol and move to `target`
    Shift {
        /// Target parse state
        target: u32,
    },
    /// Produce the named non-terminal
    Reduce {
        /// Name of the non-terminal produced
        produces: String,
    },
    /// Parsing is complete
    Accept,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::ParseAction;

    fn sample_manifest() -> GrammarManifest {
        GrammarManifest::new("sample")
            .symbol(SymbolDef::terminal("end"))
            .symbol(SymbolDef::terminal("word"))
            .symbol(SymbolDef::non_terminal("document"))
            .states(2)
            .transition(TransitionDef::shift(0, "word", 1))
            .transition(TransitionDef::reduce(1, "end", "document"))
            .transition(TransitionDef::accept(1, "word"))
    }

    #[test]
    fn test_compile_and_load() {
        let language = sample_manifest().compile_language().unwrap();
        assert_eq!(language.name(), "sample");
        assert_eq!(language.symbol_count(), 3);
        assert_eq!(language.action(0, 1), Some(ParseAction::Shift { state: 1 }));
        assert_eq!(language.action(1, 0), Some(ParseAction::Reduce { symbol: 2 }));
    }

    #[test]
    fn test_json_round_trip() {
        let manifest = sample_manifest();
        let json = manifest.to_json().unwrap();
        let parsed = GrammarManifest::from_json(&json).unwrap();
        assert_eq!(parsed.name, "sample");
        assert_eq!(parsed.symbols.len(), 3);
        assert_eq!(parsed.transitions.len(), 3);
        assert_eq!(parsed.compile().unwrap(), manifest.compile().unwrap());
    }

    #[test]
    fn test_manifest_from_literal_json() {
        let json = r#"{
            "name": "mini",
            "symbols": [
                { "name": "end" },
                { "name": "identifier" },
                { "name": "source_file", "kind": "non_terminal" }
            ],
            "states": 2,
            "transitions": [
                { "state": 0, "symbol": "identifier", "action": "shift", "target": 1 },
                { "state": 1, "symbol": "end", "action": "reduce", "produces": "source_file" }
            ]
        }"#;
        let language = GrammarManifest::from_json(json)
            .unwrap()
            .compile_language()
            .unwrap();
        assert_eq!(language.name(), "mini");
        assert_eq!(language.symbol_for_name("source_file"), Some(2));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let manifest = GrammarManifest::new("broken")
            .symbol(SymbolDef::terminal("word"))
            .states(1)
            .transition(TransitionDef::shift(0, "missing", 0));
        let err = manifest.compile().unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol { ref name } if name == "missing"));
    }

    #[test]
    fn test_structural_problems_deferred_to_loader() {
        let manifest = GrammarManifest::new("broken")
            .symbol(SymbolDef::terminal("word"))
            .states(1)
            .transition(TransitionDef::shift(0, "word", 9));
        // The manifest compiles; the loader rejects the out-of-range target.
        let bytes = manifest.compile().unwrap();
        assert!(matches!(
            crate::load(&bytes),
            Err(Error::MalformedDescriptor { .. })
        ));
    }
}
