// src/sample/lex.rs
// Internal lexer of the sample grammar, built as a LexTable.

use std::sync::OnceLock;

use super::symbols::SampleSymbol;
use crate::{
    lexer::{LexTable, Lexer},
    symbol::StateId,
};

// Lex states (small hand-built automaton).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S {
    Start,
    Number,
    AfterPlus,
    Comment,
    End,
}

impl S {
    #[inline]
    pub fn id(self) -> StateId {
        self as StateId
    }
}

pub const N_STATES: usize = 5;
pub const START: S = S::Start;

#[inline]
fn is_white(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

pub fn build_lex_table() -> LexTable {
    let mut t = LexTable::new(N_STATES);

    // Start: trivia is skipped in place, end of input yields `end`.
    let white: Vec<u8> = (0u8..0x80).filter(|&b| is_white(b)).collect();
    t.set_skip(S::Start.id(), &white, S::Start.id());
    t.set_range(S::Start.id(), '0', '9', S::Number.id());
    t.set(S::Start.id(), b"+", S::AfterPlus.id());
    t.set(S::Start.id(), b"#", S::Comment.id());
    t.set_eof(S::Start.id(), S::End.id());

    // Number
    t.set_range(S::Number.id(), '0', '9', S::Number.id());
    t.set_accept(S::Number.id(), SampleSymbol::Number.id());

    t.set_accept(S::AfterPlus.id(), SampleSymbol::Plus.id());

    // Comment: runs to the end of the line, newline excluded.
    t.set_all_except(S::Comment.id(), b"\n", S::Comment.id());
    t.set_accept(S::Comment.id(), SampleSymbol::Comment.id());

    t.set_accept(S::End.id(), SampleSymbol::End.id());
    t
}

static LEX_TABLE: OnceLock<LexTable> = OnceLock::new();

pub fn lex_table() -> &'static LexTable {
    LEX_TABLE.get_or_init(build_lex_table)
}

/// The sample grammar's [`LexFn`](crate::lexer::LexFn).
pub fn lex(lexer: &mut dyn Lexer, state: StateId) -> bool {
    lex_table().lex(lexer, state)
}
