//! Binary layout of compiled grammar descriptors
//!
//! This module defines the on-the-wire ABI a compiled grammar table must
//! follow, plus a bounds-checked reader over raw descriptor bytes.
//!
//! The layout should not be decoded directly - use [`crate::load`] to obtain
//! a validated [`crate::Language`] handle instead.
//!
//! All multi-byte fields are little-endian:
//!
//! ```text
//! magic               4 bytes, b"KQLG"
//! abi_version         u16
//! reserved            u16, must be zero
//! name_len            u16, followed by UTF-8 grammar name
//! symbol_count        u32
//! state_count         u32
//! transition_count    u32
//! start_state         u32
//! symbols             symbol_count entries:
//!                       kind u8, name_len u16, UTF-8 name
//! transitions         transition_count entries:
//!                       state u32, symbol u32, action u8, target u32
//! ```

use crate::error::Error;

/// Magic bytes at the start of every descriptor
pub const MAGIC: [u8; 4] = *b"KQLG";

/// ABI version emitted by this crate's descriptor builder
pub const ABI_VERSION: u16 = 15;

/// Oldest descriptor ABI version the runtime can still consume
pub const ABI_VERSION_MIN: u16 = 13;

/// Newest descriptor ABI version the runtime understands
pub const ABI_VERSION_MAX: u16 = ABI_VERSION;

/// Check whether a descriptor ABI version is loadable by this runtime
#[must_use]
pub fn version_is_compatible(version: u16) -> bool {
    (ABI_VERSION_MIN..=ABI_VERSION_MAX).contains(&version)
}

/// Symbol kind codes in the symbol table
pub mod symbol_codes {
    /// A terminal (token) symbol
    pub const TERMINAL: u8 = 0;

    /// A non-terminal (rule) symbol
    pub const NON_TERMINAL: u8 = 1;

    /// An auxiliary symbol (extras such as whitespace and comments)
    pub const AUXILIARY: u8 = 2;
}

/// Action codes in the transition table
pub mod action_codes {
    /// Shift: consume the symbol and move to the target state
    pub const SHIFT: u8 = 0;

    /// Reduce: pop and produce the target non-terminal symbol
    pub const REDUCE: u8 = 1;

    /// Accept: parsing is complete (target must be zero)
    pub const ACCEPT: u8 = 2;
}

/// Bounds-checked little-endian reader over descriptor bytes
///
/// Every read failure carries the byte offset at which the descriptor ran
/// out, so malformed-descriptor errors point at the truncation site.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current byte offset into the descriptor
    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    /// Number of bytes left unread
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], Error> {
        if self.remaining() < len {
            return Err(Error::malformed(
                self.pos,
                format!("descriptor truncated while reading {what}"),
            ));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn read_u8(&mut self, what: &str) -> Result<u8, Error> {
        Ok(self.read_bytes(1, what)?[0])
    }

    pub(crate) fn read_u16(&mut self, what: &str) -> Result<u16, Error> {
        let bytes = self.read_bytes(2, what)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u32(&mut self, what: &str) -> Result<u32, Error> {
        let bytes = self.read_bytes(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a length-prefixed UTF-8 string (u16 length)
    pub(crate) fn read_string(&mut self, what: &str) -> Result<&'a str, Error> {
        let len = self.read_u16(what)? as usize;
        let start = self.pos;
        let bytes = self.read_bytes(len, what)?;
        std::str::from_utf8(bytes)
            .map_err(|_| Error::malformed(start, format!("{what} is not valid UTF-8")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_range_is_sane() {
        assert!(ABI_VERSION_MIN <= ABI_VERSION_MAX);
        assert!(version_is_compatible(ABI_VERSION));
        assert!(!version_is_compatible(0));
        assert!(!version_is_compatible(ABI_VERSION_MAX + 1));
    }

    #[test]
    fn test_reader_truncation_reports_offset() {
        let mut reader = Reader::new(&[0xAB, 0xCD]);
        assert_eq!(reader.read_u16("field").unwrap(), 0xCDAB);
        let err = reader.read_u32("next field").unwrap_err();
        match err {
            Error::MalformedDescriptor { offset, .. } => assert_eq!(offset, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reader_string() {
        let mut bytes = vec![3, 0];
        bytes.extend_from_slice(b"kql");
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_string("name").unwrap(), "kql");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_rejects_invalid_utf8() {
        let bytes = vec![2, 0, 0xFF, 0xFE];
        let mut reader = Reader::new(&bytes);
        let err = reader.read_string("name").unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { .. }));
    }
}
