//! Descriptor sources: files and grammar shared libraries
//!
//! The loader itself is pure and knows nothing about where descriptor bytes
//! come from. This module supplies the two out-of-process sources a host
//! typically uses:
//!
//! - a descriptor file on disk, and
//! - a grammar shared library exporting the compiled table through a C ABI
//!   accessor (the convention grammar binding packages follow).
//!
//! Either way the bytes are copied out and handed to [`crate::load`]; the
//! resulting [`Language`] owns its data and outlives the source.

use crate::error::Error;
use crate::language::Language;
use crate::loader;
use libloading::Library;
use std::path::{Path, PathBuf};

/// Environment variable for specifying the grammar location
pub const GRAMMAR_PATH_ENV: &str = "KQL_GRAMMAR_PATH";

/// Default descriptor file name looked for in search directories
pub const DESCRIPTOR_FILE_NAME: &str = "kql.grammar";

/// Platform-specific grammar shared library name
#[cfg(target_os = "macos")]
pub const LIB_NAME: &str = "libkql_grammar.dylib";

#[cfg(target_os = "linux")]
pub const LIB_NAME: &str = "libkql_grammar.so";

#[cfg(target_os = "windows")]
pub const LIB_NAME: &str = "kql_grammar.dll";

/// Exported symbol names a grammar shared library must provide
pub mod symbols {
    /// Returns a pointer to the descriptor bytes
    pub const DESCRIPTOR_DATA: &str = "kql_grammar_descriptor";

    /// Returns the descriptor length in bytes
    pub const DESCRIPTOR_LEN: &str = "kql_grammar_descriptor_len";
}

/// Accessor returning a pointer to static descriptor data
type DescriptorDataFn = unsafe extern "C" fn() -> *const u8;

/// Accessor returning the descriptor length in bytes
type DescriptorLenFn = unsafe extern "C" fn() -> u32;

/// Find a grammar descriptor or grammar library on disk
///
/// Search order:
/// 1. `KQL_GRAMMAR_PATH` environment variable (file, or directory containing
///    the descriptor file or grammar library)
/// 2. Same directory as the current executable
/// 3. Current working directory
#[must_use]
pub fn find_grammar_path() -> Option<PathBuf> {
    // 1. Check environment variable
    if let Ok(path) = std::env::var(GRAMMAR_PATH_ENV) {
        let path = PathBuf::from(path);
        // If it's a file, use it directly
        if path.is_file() {
            log::debug!("Found grammar via {GRAMMAR_PATH_ENV}: {}", path.display());
            return Some(path);
        }
        // If it's a directory, look for known names in it
        if path.is_dir() {
            for name in [DESCRIPTOR_FILE_NAME, LIB_NAME] {
                let candidate = path.join(name);
                if candidate.exists() {
                    log::debug!(
                        "Found grammar in {GRAMMAR_PATH_ENV} directory: {}",
                        candidate.display()
                    );
                    return Some(candidate);
                }
            }
        }
    }

    // 2. Same directory as executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in [DESCRIPTOR_FILE_NAME, LIB_NAME] {
                let candidate = exe_dir.join(name);
                if candidate.exists() {
                    log::debug!("Found grammar next to executable: {}", candidate.display());
                    return Some(candidate);
                }
            }
        }
    }

    // 3. Current working directory
    for name in [DESCRIPTOR_FILE_NAME, LIB_NAME] {
        let candidate = PathBuf::from(name);
        if candidate.exists() {
            log::debug!("Found grammar in current directory: {}", candidate.display());
            return Some(candidate);
        }
    }

    log::debug!("Grammar descriptor not found");
    None
}

/// Get the list of paths that were searched
#[must_use]
pub fn searched_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // Environment variable
    if let Ok(path) = std::env::var(GRAMMAR_PATH_ENV) {
        paths.push(PathBuf::from(&path));
        for name in [DESCRIPTOR_FILE_NAME, LIB_NAME] {
            paths.push(PathBuf::from(&path).join(name));
        }
    }

    // Executable directory
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in [DESCRIPTOR_FILE_NAME, LIB_NAME] {
                paths.push(exe_dir.join(name));
            }
        }
    }

    // Current directory
    for name in [DESCRIPTOR_FILE_NAME, LIB_NAME] {
        paths.push(PathBuf::from(name));
    }

    paths
}

/// Load a language from a descriptor file
pub fn from_file(path: impl AsRef<Path>) -> Result<Language, Error> {
    let path = path.as_ref();
    log::info!("Loading grammar descriptor from {}", path.display());
    let bytes = std::fs::read(path)?;
    loader::load(&bytes)
}

/// Load a language from a grammar shared library
///
/// The library must export [`symbols::DESCRIPTOR_DATA`] and
/// [`symbols::DESCRIPTOR_LEN`]. The descriptor bytes are copied out before
/// validation, so the library handle does not need to outlive the returned
/// [`Language`].
pub fn from_shared_library(path: impl AsRef<Path>) -> Result<Language, Error> {
    let path = path.as_ref();
    log::info!("Loading grammar library from {}", path.display());

    // SAFETY: Library::new loads a dynamic library from the filesystem.
    // The caller chose this path; libloading handles the platform-specific
    // loading correctly.
    let library =
        unsafe { Library::new(path) }.map_err(|e| Error::library_load_failed(path, e))?;

    // SAFETY for both symbol loads: the symbol names are compile-time
    // constants matching the C ABI grammar libraries export, and the
    // function pointer types match those exports. The library stays loaded
    // until after the bytes are copied out below.
    let descriptor_len: DescriptorLenFn = unsafe {
        *library
            .get(symbols::DESCRIPTOR_LEN.as_bytes())
            .map_err(|_| Error::SymbolNotFound {
                symbol: symbols::DESCRIPTOR_LEN.to_string(),
            })?
    };

    let descriptor_data: DescriptorDataFn = unsafe {
        *library
            .get(symbols::DESCRIPTOR_DATA.as_bytes())
            .map_err(|_| Error::SymbolNotFound {
                symbol: symbols::DESCRIPTOR_DATA.to_string(),
            })?
    };

    // SAFETY: both accessors are plain reads of static data inside the
    // library and take no arguments.
    let len = unsafe { descriptor_len() } as usize;
    let data = unsafe { descriptor_data() };

    if len == 0 || data.is_null() {
        return Err(Error::NullOrEmptyDescriptor);
    }

    // SAFETY: the export contract guarantees `data` points at `len` bytes of
    // descriptor data that live as long as the library is loaded. The copy
    // completes before `library` is dropped at the end of this function.
    let bytes = unsafe { std::slice::from_raw_parts(data, len) }.to_vec();

    log::debug!("Copied {len} descriptor bytes from {}", path.display());
    loader::load(&bytes)
}

/// Discover and load a grammar from the standard search paths
///
/// Shared libraries are recognized by extension; anything else is treated
/// as a descriptor file.
pub fn discover() -> Result<Language, Error> {
    let path = find_grammar_path().ok_or_else(|| Error::DescriptorNotFound {
        searched_paths: searched_paths(),
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("so" | "dylib" | "dll") => from_shared_library(&path),
        _ => from_file(&path),
    }
}
