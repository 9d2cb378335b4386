// src/external/mod.rs
//! Plug-in scanners for tokens the lex automaton cannot express
//! (indentation, heredocs, anything that needs memory between tokens).
//!
//! A scanner is created once per parse, scanned any number of times, and
//! dropped when the parse is done. Its state can be snapshotted into at most
//! [`SERIALIZATION_BUFFER_SIZE`] bytes so the engine can resume from any
//! earlier token during incremental reparsing.

pub mod heredoc;

pub use heredoc::HeredocScanner;

use std::fmt;

use anyhow::{Result, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::{lexer::Lexer, symbol::Symbol};

/// Hard limit on a serialized scanner state.
pub const SERIALIZATION_BUFFER_SIZE: usize = 1024;

pub trait ExternalScanner {
    /// Tries to recognise one of the external tokens that `valid_symbols`
    /// enables (indexed by external token id). On success the scanner must
    /// have called `mark_end` and set the result symbol to the external
    /// token id, exactly like an internal lex function accepting.
    fn scan(&mut self, lexer: &mut dyn Lexer, valid_symbols: &[bool]) -> bool;

    /// Writes the state into `buffer`, returning the number of bytes used.
    fn serialize(&self, buffer: &mut [u8; SERIALIZATION_BUFFER_SIZE]) -> usize;

    /// Restores a state written by `serialize`. An empty slice means the
    /// initial state.
    fn deserialize(&mut self, data: &[u8]);
}

/// Allocates a fresh scanner state.
pub type ScannerFactory = fn() -> Box<dyn ExternalScanner>;

/// The external-token part of a language.
#[derive(Clone, Default)]
pub struct ExternalScannerDef {
    /// `external_lex_state_count * token_count` validity matrix.
    pub states: Vec<bool>,
    /// External token id -> grammar symbol.
    pub symbol_map: Vec<Symbol>,
    pub create: Option<ScannerFactory>,
}

impl ExternalScannerDef {
    pub fn token_count(&self) -> usize {
        self.symbol_map.len()
    }

    /// Which external tokens are valid in an external lex state. State 0
    /// enables none of them.
    pub fn enabled_tokens(&self, external_lex_state: u16) -> &[bool] {
        let n = self.token_count();
        if external_lex_state == 0 || n == 0 {
            return &[];
        }
        let start = external_lex_state as usize * n;
        self.states.get(start..start + n).unwrap_or(&[])
    }

    pub fn symbol_for(&self, token: Symbol) -> Option<Symbol> {
        self.symbol_map.get(token as usize).copied()
    }

    pub fn validate(&self, external_token_count: u32) -> Result<()> {
        let n = external_token_count as usize;
        ensure!(
            self.symbol_map.len() == n,
            "external symbol map has {} entries, expected {n}",
            self.symbol_map.len()
        );
        if n > 0 && self.states.len() % n != 0 {
            bail!(
                "external lex state matrix ({} cells) is not a multiple of {n}",
                self.states.len()
            );
        }
        Ok(())
    }
}

impl fmt::Debug for ExternalScannerDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalScannerDef")
            .field("states", &self.states)
            .field("symbol_map", &self.symbol_map)
            .field("has_scanner", &self.create.is_some())
            .finish()
    }
}

/// Serialized scanner state. Plain data; copy it freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScannerSnapshot {
    bytes: Vec<u8>,
}

impl ScannerSnapshot {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() <= SERIALIZATION_BUFFER_SIZE,
            "scanner snapshot of {} bytes exceeds {SERIALIZATION_BUFFER_SIZE}",
            bytes.len()
        );
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A live scanner, owned by exactly one parse.
///
/// Creating the session creates the scanner state; dropping it (on success
/// or on any error path) destroys it.
pub struct ScannerSession {
    scanner: Box<dyn ExternalScanner>,
    buffer: Box<[u8; SERIALIZATION_BUFFER_SIZE]>,
}

impl ScannerSession {
    pub fn create(factory: ScannerFactory) -> Self {
        log::debug!("external scanner created");
        Self::from_scanner(factory())
    }

    pub fn from_scanner(scanner: Box<dyn ExternalScanner>) -> Self {
        Self {
            scanner,
            buffer: Box::new([0u8; SERIALIZATION_BUFFER_SIZE]),
        }
    }

    pub fn scan(&mut self, lexer: &mut dyn Lexer, valid_symbols: &[bool]) -> bool {
        if !valid_symbols.iter().any(|&v| v) {
            return false;
        }
        let found = self.scanner.scan(lexer, valid_symbols);
        log::trace!("external scan -> {found}");
        found
    }

    pub fn serialize(&mut self) -> Result<ScannerSnapshot> {
        let len = self.scanner.serialize(&mut self.buffer);
        if len > SERIALIZATION_BUFFER_SIZE {
            log::warn!("external scanner reported {len} serialized bytes");
            bail!("external scanner state of {len} bytes exceeds {SERIALIZATION_BUFFER_SIZE}");
        }
        ScannerSnapshot::from_bytes(&self.buffer[..len])
    }

    pub fn deserialize(&mut self, snapshot: &ScannerSnapshot) {
        self.scanner.deserialize(snapshot.as_bytes());
    }

    /// Explicit end of life; same as dropping the session.
    pub fn destroy(self) {}
}

impl Drop for ScannerSession {
    fn drop(&mut self) {
        log::debug!("external scanner destroyed");
    }
}
