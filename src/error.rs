//! Error types for KQL Grammar Tools

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or producing grammar descriptors
#[derive(Debug, Error)]
pub enum Error {
    /// The descriptor was absent or zero-length
    #[error("Grammar descriptor is empty")]
    NullOrEmptyDescriptor,

    /// The descriptor's ABI version is outside the supported range
    #[error("Grammar descriptor ABI version {found} is not supported (supported range: {min}..={max})")]
    VersionMismatch { found: u16, min: u16, max: u16 },

    /// The descriptor failed a structural consistency check
    #[error("Malformed grammar descriptor at byte {offset}: {message}")]
    MalformedDescriptor { offset: usize, message: String },

    /// No grammar descriptor could be found on disk
    #[error("Grammar descriptor not found. Searched paths: {searched_paths:?}. Set KQL_GRAMMAR_PATH to specify location.")]
    DescriptorNotFound { searched_paths: Vec<PathBuf> },

    /// A grammar shared library failed to load
    #[error("Failed to load grammar library from {path}: {message}")]
    LibraryLoadFailed { path: PathBuf, message: String },

    /// A required symbol was not found in a grammar shared library
    #[error("Symbol '{symbol}' not found in grammar library")]
    SymbolNotFound { symbol: String },

    /// A manifest transition referenced a symbol the manifest never declared
    #[error("Manifest references unknown symbol '{name}'")]
    UnknownSymbol { name: String },

    /// Reading a descriptor from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed-descriptor error at the given byte offset
    #[must_use]
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            offset,
            message: message.into(),
        }
    }

    /// Create a library load failure error
    #[must_use]
    pub fn library_load_failed(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::LibraryLoadFailed {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error is one of the three terminal loader failures
    ///
    /// Loader errors are pure functions of the descriptor bytes: retrying
    /// the same input yields the same result.
    #[must_use]
    pub fn is_loader_error(&self) -> bool {
        matches!(
            self,
            Self::NullOrEmptyDescriptor
                | Self::VersionMismatch { .. }
                | Self::MalformedDescriptor { .. }
        )
    }
}
