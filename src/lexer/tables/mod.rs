// src/lexer/tables/mod.rs
//! Table-driven lex automaton.
//!
//! Each lex state has an optional accepted symbol, a dense row for ASCII
//! lookaheads, ordered range edges for everything else, and an optional
//! end-of-input edge. Running it goes through the same protocol a generated
//! lex function uses, so it can back a [`LexFn`](crate::lexer::LexFn).

pub mod io;

pub use io::{load_lex_table_json_bytes, save_lex_table_json};

use anyhow::{Result, bail};

use super::{
    context::Lexer,
    protocol::{Step, drive},
};
use crate::symbol::{StateId, Symbol};

/// A transition target; `skip` marks the consumed unit as trivia.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Next {
    pub state: StateId,
    pub skip: bool,
}

/// Edge for a codepoint range outside ASCII.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RangeEdge {
    pub lo: char,
    pub hi: char,
    pub next: Next,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexStateRow {
    pub accept: Option<Symbol>,
    pub ascii: [Option<Next>; 128],
    pub ranges: Vec<RangeEdge>,
    pub on_eof: Option<Next>,
}

impl Default for LexStateRow {
    fn default() -> Self {
        Self {
            accept: None,
            ascii: [None; 128],
            ranges: Vec::new(),
            on_eof: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LexTable {
    pub states: Vec<LexStateRow>,
}

impl LexTable {
    pub fn new(n_states: usize) -> Self {
        Self {
            states: vec![LexStateRow::default(); n_states],
        }
    }

    pub fn set_accept(&mut self, state: StateId, symbol: Symbol) {
        self.states[state as usize].accept = Some(symbol);
    }

    /// Edges on the given ASCII bytes.
    pub fn set(&mut self, from: StateId, bytes: &[u8], to: StateId) {
        self.set_next(from, bytes, Next { state: to, skip: false });
    }

    pub fn set_skip(&mut self, from: StateId, bytes: &[u8], to: StateId) {
        self.set_next(from, bytes, Next { state: to, skip: true });
    }

    fn set_next(&mut self, from: StateId, bytes: &[u8], next: Next) {
        let row = &mut self.states[from as usize];
        for &b in bytes {
            debug_assert!(b.is_ascii(), "use set_range for non-ASCII");
            row.ascii[(b & 0x7f) as usize] = Some(next);
        }
    }

    /// Edge on every codepoint in `lo..=hi`.
    pub fn set_range(&mut self, from: StateId, lo: char, hi: char, to: StateId) {
        let next = Next { state: to, skip: false };
        let row = &mut self.states[from as usize];
        for c in lo..=hi.min('\x7f') {
            row.ascii[c as usize] = Some(next);
        }
        let lo = lo.max('\u{80}');
        if lo <= hi {
            row.ranges.push(RangeEdge { lo, hi, next });
        }
    }

    /// Edge on every codepoint except the listed ASCII bytes.
    pub fn set_all_except(&mut self, from: StateId, except: &[u8], to: StateId) {
        let next = Next { state: to, skip: false };
        let row = &mut self.states[from as usize];
        for b in 0u8..0x80 {
            if !except.contains(&b) {
                row.ascii[b as usize] = Some(next);
            }
        }
        row.ranges.push(RangeEdge {
            lo: '\u{80}',
            hi: char::MAX,
            next,
        });
    }

    pub fn set_eof(&mut self, from: StateId, to: StateId) {
        self.states[from as usize].on_eof = Some(Next { state: to, skip: false });
    }

    /// Transition for a lookahead codepoint.
    pub fn next(&self, state: StateId, c: char) -> Option<Next> {
        let row = self.states.get(state as usize)?;
        if c.is_ascii() {
            row.ascii[c as usize]
        } else {
            row.ranges
                .iter()
                .find(|e| e.lo <= c && c <= e.hi)
                .map(|e| e.next)
        }
    }

    /// Scans one token starting in lex state `start`.
    pub fn lex<L: Lexer + ?Sized>(&self, lexer: &mut L, start: StateId) -> bool {
        drive(lexer, start, |run, lexer| {
            let Some(row) = self.states.get(run.state() as usize) else {
                return Step::End;
            };
            if let Some(symbol) = row.accept {
                run.accept(lexer, symbol);
            }
            let next = if run.eof() {
                row.on_eof
            } else {
                self.next(run.state(), run.lookahead())
            };
            match next {
                Some(Next { state, skip: true }) => Step::Skip(state),
                Some(Next { state, skip: false }) => Step::Advance(state),
                None => Step::End,
            }
        })
    }

    /// Every transition must land on an existing state, and an end-of-input
    /// edge must not lead to another end-of-input edge (the cursor cannot
    /// move past the end, so that would never terminate).
    pub fn validate(&self) -> Result<()> {
        let n = self.states.len();
        for (s, row) in self.states.iter().enumerate() {
            let targets = row
                .ascii
                .iter()
                .flatten()
                .chain(row.ranges.iter().map(|e| &e.next))
                .chain(row.on_eof.iter());
            for next in targets {
                if next.state as usize >= n {
                    bail!("lex state {s} has an edge to missing state {}", next.state);
                }
            }
            if let Some(eof) = row.on_eof {
                if self.states[eof.state as usize].on_eof.is_some() {
                    bail!("lex state {s}: end-of-input edge chains into another one");
                }
            }
            for e in &row.ranges {
                if e.lo > e.hi {
                    bail!("lex state {s}: empty range {:?}..={:?}", e.lo, e.hi);
                }
            }
        }
        Ok(())
    }
}
