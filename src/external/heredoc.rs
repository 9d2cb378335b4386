// src/external/heredoc.rs
//! Heredoc scanner.
//!
//! `<<EOF` is the start token; the body token runs from the end of that line
//! through the first line consisting of exactly `EOF`. Several heredocs may
//! be opened on one line; their bodies follow in order.

use std::collections::VecDeque;

use super::{ExternalScanner, SERIALIZATION_BUFFER_SIZE};
use crate::{lexer::Lexer, string::CompactString, symbol::Symbol};

/// External token ids.
pub const HEREDOC_START: Symbol = 0;
pub const HEREDOC_BODY: Symbol = 1;

/// Delimiter length is stored in one byte.
pub const MAX_DELIMITER_LEN: usize = 255;

/// So is the number of pending delimiters.
pub const MAX_PENDING: usize = u8::MAX as usize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeredocScanner {
    pending: VecDeque<CompactString>,
}

fn is_delimiter_char(c: char, first: bool) -> bool {
    c == '_' || c.is_ascii_alphabetic() || (!first && c.is_ascii_digit())
}

impl HeredocScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// [`ScannerFactory`](super::ScannerFactory) for this scanner.
    pub fn boxed() -> Box<dyn ExternalScanner> {
        Box::new(Self::new())
    }

    /// Delimiters whose bodies have not been scanned yet, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &CompactString> {
        self.pending.iter()
    }

    /// Size of the serialized state.
    pub fn snapshot_len(&self) -> usize {
        1 + self.pending.iter().map(|d| 1 + d.len()).sum::<usize>()
    }

    /// Opening one more heredoc must keep the state serializable.
    fn has_room_for(&self, delimiter: &CompactString) -> bool {
        self.pending.len() < MAX_PENDING
            && self.snapshot_len() + 1 + delimiter.len() <= SERIALIZATION_BUFFER_SIZE
    }

    fn scan_start(&mut self, lexer: &mut dyn Lexer) -> bool {
        while matches!(lexer.lookahead(), ' ' | '\t') {
            lexer.advance(true);
        }
        for _ in 0..2 {
            if lexer.lookahead() != '<' {
                return false;
            }
            lexer.advance(false);
        }

        let mut delimiter = CompactString::new();
        while !lexer.eof() && is_delimiter_char(lexer.lookahead(), delimiter.is_empty()) {
            delimiter.push(lexer.lookahead());
            if delimiter.len() > MAX_DELIMITER_LEN {
                return false;
            }
            lexer.advance(false);
        }
        if delimiter.is_empty() {
            return false;
        }
        if !self.has_room_for(&delimiter) {
            log::debug!(
                "heredoc scanner: no room for delimiter of {} bytes ({} pending)",
                delimiter.len(),
                self.pending.len()
            );
            return false;
        }

        lexer.mark_end();
        lexer.set_result_symbol(HEREDOC_START);
        self.pending.push_back(delimiter);
        true
    }

    fn scan_body(&mut self, lexer: &mut dyn Lexer) -> bool {
        let Some(delimiter) = self.pending.front().cloned() else {
            return false;
        };
        if lexer.lookahead() != '\n' {
            return false;
        }

        loop {
            // consume the newline ending the previous line
            lexer.advance(false);

            let mut index = 0;
            let mut matches = true;
            while !lexer.eof() && lexer.lookahead() != '\n' {
                match delimiter.char_at(index) {
                    Some((c, next)) if matches && c == lexer.lookahead() => index = next,
                    _ => matches = false,
                }
                lexer.advance(false);
            }

            if matches && index == delimiter.len() {
                lexer.mark_end();
                lexer.set_result_symbol(HEREDOC_BODY);
                self.pending.pop_front();
                return true;
            }
            if lexer.eof() {
                // unterminated
                return false;
            }
        }
    }
}

impl ExternalScanner for HeredocScanner {
    fn scan(&mut self, lexer: &mut dyn Lexer, valid_symbols: &[bool]) -> bool {
        let valid = |t: Symbol| valid_symbols.get(t as usize).copied().unwrap_or(false);
        if valid(HEREDOC_BODY) && !self.pending.is_empty() {
            return self.scan_body(lexer);
        }
        if valid(HEREDOC_START) {
            return self.scan_start(lexer);
        }
        false
    }

    // [count u8] then count × [len u8][bytes]. `scan_start` keeps this
    // within the buffer.
    fn serialize(&self, buffer: &mut [u8; SERIALIZATION_BUFFER_SIZE]) -> usize {
        buffer[0] = self.pending.len() as u8;
        let mut len = 1;
        for delimiter in &self.pending {
            let bytes = delimiter.as_bytes();
            buffer[len] = bytes.len() as u8;
            buffer[len + 1..len + 1 + bytes.len()].copy_from_slice(bytes);
            len += 1 + bytes.len();
        }
        len
    }

    fn deserialize(&mut self, data: &[u8]) {
        self.pending.clear();
        let Some((&count, mut rest)) = data.split_first() else {
            return;
        };
        for _ in 0..count {
            let Some((&n, tail)) = rest.split_first() else {
                break;
            };
            let n = (n as usize).min(tail.len());
            self.pending.push_back(CompactString::from_bytes(&tail[..n]));
            rest = &tail[n..];
        }
    }
}
