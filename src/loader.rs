//! Grammar descriptor loading and validation
//!
//! [`load`] is the whole loader contract: a pure, synchronous pass over
//! serialized descriptor bytes that either produces a fully validated
//! [`Language`] or fails with one of three terminal errors
//! ([`Error::NullOrEmptyDescriptor`], [`Error::VersionMismatch`],
//! [`Error::MalformedDescriptor`]). There is no partial handle, no fallback
//! grammar, and no retained state between calls.
//!
//! A parser built on an inconsistent table can corrupt parses silently, so
//! every table reference is checked: symbol ids against the symbol table,
//! state ids against the declared state count, reduce targets against
//! non-terminal symbols. Any inconsistency is a hard failure.

use crate::descriptor::{
    action_codes, symbol_codes, version_is_compatible, Reader, ABI_VERSION_MAX, ABI_VERSION_MIN,
    MAGIC,
};
use crate::error::Error;
use crate::language::{Language, LanguageData, ParseAction, Symbol, SymbolKind};

/// Minimum serialized size of one symbol table entry (kind + name length)
const MIN_SYMBOL_ENTRY_LEN: usize = 3;

/// Serialized size of one transition table entry
const TRANSITION_ENTRY_LEN: usize = 13;

/// Load and validate a serialized grammar descriptor
///
/// On success the returned [`Language`] is immutable and safe to share
/// across threads. Repeated loads of identical bytes yield behaviorally
/// identical handles.
///
/// # Errors
///
/// - [`Error::NullOrEmptyDescriptor`] for zero-length input
/// - [`Error::VersionMismatch`] when the descriptor's ABI version falls
///   outside the supported range
/// - [`Error::MalformedDescriptor`] when any structural consistency check
///   fails
pub fn load(descriptor: &[u8]) -> Result<Language, Error> {
    if descriptor.is_empty() {
        return Err(Error::NullOrEmptyDescriptor);
    }

    let mut reader = Reader::new(descriptor);

    let magic = reader.read_bytes(MAGIC.len(), "magic")?;
    if magic != MAGIC {
        return Err(Error::malformed(0, "bad magic (expected \"KQLG\")"));
    }

    // The version gate runs before any table decoding so that a descriptor
    // from an incompatible producer reports VersionMismatch rather than
    // whatever layout drift happens to trip first.
    let abi_version = reader.read_u16("ABI version")?;
    if !version_is_compatible(abi_version) {
        return Err(Error::VersionMismatch {
            found: abi_version,
            min: ABI_VERSION_MIN,
            max: ABI_VERSION_MAX,
        });
    }

    let reserved_at = reader.offset();
    let reserved = reader.read_u16("reserved word")?;
    if reserved != 0 {
        return Err(Error::malformed(reserved_at, "reserved word is not zero"));
    }

    let name_at = reader.offset();
    let name = reader.read_string("grammar name")?;
    if name.is_empty() {
        return Err(Error::malformed(name_at, "grammar name is empty"));
    }
    let name = name.to_string();

    let counts_at = reader.offset();
    let symbol_count = reader.read_u32("symbol count")?;
    let state_count = reader.read_u32("state count")?;
    let transition_count = reader.read_u32("transition count")?;
    let start_state = reader.read_u32("start state")?;

    if symbol_count == 0 {
        return Err(Error::malformed(counts_at, "symbol table is empty"));
    }
    if state_count == 0 {
        return Err(Error::malformed(counts_at, "state count is zero"));
    }
    if start_state >= state_count {
        return Err(Error::malformed(
            counts_at,
            format!("start state {start_state} is outside state count {state_count}"),
        ));
    }

    // Cheap bound before allocating: the declared counts cannot describe
    // more entries than the remaining bytes can hold.
    let min_table_len = (symbol_count as usize)
        .saturating_mul(MIN_SYMBOL_ENTRY_LEN)
        .saturating_add((transition_count as usize).saturating_mul(TRANSITION_ENTRY_LEN));
    if min_table_len > reader.remaining() {
        return Err(Error::malformed(
            reader.offset(),
            "declared table sizes exceed descriptor length",
        ));
    }

    let symbols = read_symbol_table(&mut reader, symbol_count)?;
    let transitions =
        read_transition_table(&mut reader, transition_count, state_count, &symbols)?;

    if reader.remaining() != 0 {
        return Err(Error::malformed(
            reader.offset(),
            format!("{} trailing bytes after transition table", reader.remaining()),
        ));
    }

    Ok(Language::new(LanguageData {
        name,
        abi_version,
        symbols,
        state_count,
        start_state,
        transitions,
    }))
}

fn read_symbol_table(reader: &mut Reader<'_>, count: u32) -> Result<Vec<Symbol>, Error> {
    let mut symbols = Vec::with_capacity(count as usize);
    for index in 0..count {
        let entry_at = reader.offset();
        let kind_code = reader.read_u8("symbol kind")?;
        let kind = match kind_code {
            symbol_codes::TERMINAL => SymbolKind::Terminal,
            symbol_codes::NON_TERMINAL => SymbolKind::NonTerminal,
            symbol_codes::AUXILIARY => SymbolKind::Auxiliary,
            other => {
                return Err(Error::malformed(
                    entry_at,
                    format!("symbol {index} has unknown kind code {other}"),
                ))
            }
        };
        let name = reader.read_string("symbol name")?;
        if name.is_empty() {
            return Err(Error::malformed(
                entry_at,
                format!("symbol {index} has an empty name"),
            ));
        }
        symbols.push(Symbol {
            name: name.to_string(),
            kind,
        });
    }
    Ok(symbols)
}

fn read_transition_table(
    reader: &mut Reader<'_>,
    count: u32,
    state_count: u32,
    symbols: &[Symbol],
) -> Result<Vec<(u32, u32, ParseAction)>, Error> {
    let symbol_count = symbols.len() as u32;
    let mut transitions = Vec::with_capacity(count as usize);

    for index in 0..count {
        let entry_at = reader.offset();
        let state = reader.read_u32("transition state")?;
        let symbol = reader.read_u32("transition symbol")?;
        let action_code = reader.read_u8("transition action")?;
        let target = reader.read_u32("transition target")?;

        if state >= state_count {
            return Err(Error::malformed(
                entry_at,
                format!("transition {index} references state {state} outside state count {state_count}"),
            ));
        }
        if symbol >= symbol_count {
            return Err(Error::malformed(
                entry_at,
                format!("transition {index} references symbol {symbol} outside symbol count {symbol_count}"),
            ));
        }

        let action = match action_code {
            action_codes::SHIFT => {
                if target >= state_count {
                    return Err(Error::malformed(
                        entry_at,
                        format!("transition {index} shifts to state {target} outside state count {state_count}"),
                    ));
                }
                ParseAction::Shift { state: target }
            }
            action_codes::REDUCE => {
                if target >= symbol_count {
                    return Err(Error::malformed(
                        entry_at,
                        format!("transition {index} reduces to symbol {target} outside symbol count {symbol_count}"),
                    ));
                }
                if symbols[target as usize].kind != SymbolKind::NonTerminal {
                    return Err(Error::malformed(
                        entry_at,
                        format!(
                            "transition {index} reduces to '{}', which is not a non-terminal",
                            symbols[target as usize].name
                        ),
                    ));
                }
                ParseAction::Reduce { symbol: target }
            }
            action_codes::ACCEPT => {
                if target != 0 {
                    return Err(Error::malformed(
                        entry_at,
                        format!("transition {index} is an accept with nonzero target {target}"),
                    ));
                }
                ParseAction::Accept
            }
            other => {
                return Err(Error::malformed(
                    entry_at,
                    format!("transition {index} has unknown action code {other}"),
                ))
            }
        };

        transitions.push((state, symbol, action));
    }

    // One action per (state, symbol) pair; a table that disagrees with
    // itself cannot drive a deterministic parser.
    transitions.sort_by_key(|&(state, symbol, _)| (state, symbol));
    for pair in transitions.windows(2) {
        if (pair[0].0, pair[0].1) == (pair[1].0, pair[1].1) {
            return Err(Error::malformed(
                reader.offset(),
                format!(
                    "conflicting actions for state {} on symbol {}",
                    pair[0].0, pair[0].1
                ),
            ));
        }
    }

    Ok(transitions)
}
