//! KQL Grammar Tools
//!
//! This crate is the grammar-loading front-end for a KQL incremental parser
//! runtime. It validates serialized grammar descriptors (compiled parse
//! tables) and produces immutable, shareable [`Language`] handles that
//! parser instances consume.
//!
//! ## Features
//!
//! - **Descriptor loading**: validate a compiled grammar table and obtain a
//!   `Language` handle, or fail deterministically
//! - **Built-in KQL grammar**: a compiled table for the KQL pipeline subset
//! - **Grammar construction**: build descriptors programmatically or compile
//!   them from a JSON manifest
//! - **Descriptor sources**: load grammars from files or from shared
//!   libraries exporting the standard C ABI accessors
//!
//! ## Usage
//!
//! ```
//! use kql_grammar_tools::kql;
//!
//! fn main() -> Result<(), kql_grammar_tools::Error> {
//!     let language = kql::language()?;
//!
//!     assert_eq!(language.name(), "kql");
//!     assert!(language.symbol_for_name("pipe_expression").is_some());
//!     Ok(())
//! }
//! ```
//!
//! Loading is a pure function of the descriptor bytes: no I/O, no logging,
//! no global state. A failed load never yields a partial handle, so a parser
//! can never be constructed on an inconsistent table.

mod builder;
pub mod descriptor;
mod error;
pub mod kql;
mod language;
mod loader;
mod manifest;
pub mod source;

pub use builder::GrammarBuilder;
pub use error::Error;
pub use language::{Language, ParseAction, Symbol, SymbolKind};
pub use loader::load;
pub use manifest::{ActionDef, GrammarManifest, SymbolDef, SymbolDefKind, TransitionDef};

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if an external grammar descriptor is available
///
/// Returns `true` if a descriptor file or grammar library can be found in
/// the standard search paths. This is a lightweight check that doesn't
/// load or validate anything.
#[must_use]
pub fn is_available() -> bool {
    source::find_grammar_path().is_some()
}

/// Get the path to the external grammar, if found
#[must_use]
pub fn grammar_path() -> Option<std::path::PathBuf> {
    source::find_grammar_path()
}
