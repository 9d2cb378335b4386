// src/lexer/protocol.rs
//! The scanning convention every lex function follows.
//!
//! A scan keeps three locals: whether anything was accepted, whether the unit
//! being consumed is skipped, and the automaton state. Each iteration looks at
//! the lookahead and either moves on (`Advance`/`Skip`) or stops (`End`).
//! `accept` only records a candidate: it sets the result symbol and marks the
//! token end, and the automaton keeps running. A later `accept` overwrites
//! both, so the last one before `End` is the longest match and no
//! backtracking is ever needed.

use super::context::Lexer;
use crate::symbol::{StateId, Symbol};

/// Signature of generated (or hand-written) lex functions.
pub type LexFn = fn(&mut dyn Lexer, StateId) -> bool;

/// What the automaton does after looking at the current lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Consume the lookahead as part of the token and go to the state.
    Advance(StateId),
    /// Consume the lookahead as trivia and go to the state.
    Skip(StateId),
    /// No transition: the last accepted candidate (if any) is final.
    End,
}

/// Locals of one scan.
#[derive(Debug, Clone)]
pub struct LexRun {
    state: StateId,
    result: bool,
    skip: bool,
    lookahead: char,
    eof: bool,
}

impl LexRun {
    pub fn start<L: Lexer + ?Sized>(lexer: &L, state: StateId) -> Self {
        let mut run = Self {
            state,
            result: false,
            skip: false,
            lookahead: '\0',
            eof: false,
        };
        run.observe(lexer);
        run
    }

    fn observe<L: Lexer + ?Sized>(&mut self, lexer: &L) {
        self.skip = false;
        self.lookahead = lexer.lookahead();
        self.eof = lexer.eof();
    }

    #[inline]
    pub fn state(&self) -> StateId {
        self.state
    }

    #[inline]
    pub fn lookahead(&self) -> char {
        self.lookahead
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Whether some candidate has been accepted so far.
    #[inline]
    pub fn accepted(&self) -> bool {
        self.result
    }

    /// Records a tentative token; scanning continues.
    pub fn accept<L: Lexer + ?Sized>(&mut self, lexer: &mut L, symbol: Symbol) {
        self.result = true;
        lexer.set_result_symbol(symbol);
        lexer.mark_end();
    }

    pub fn advance<L: Lexer + ?Sized>(&mut self, lexer: &mut L, state: StateId) {
        self.state = state;
        lexer.advance(self.skip);
        self.observe(lexer);
    }

    pub fn skip<L: Lexer + ?Sized>(&mut self, lexer: &mut L, state: StateId) {
        self.skip = true;
        self.advance(lexer, state);
    }

    /// False means nothing was recognised at the starting position.
    pub fn end(self) -> bool {
        self.result
    }
}

/// Runs an automaton from `state` until it reports [`Step::End`].
///
/// `step` sees the run (state, lookahead, eof, `accept`) and the lexer, and
/// answers with the next move. The suspension points are the calls into
/// `lexer.advance`, which belong to the caller.
pub fn drive<L, F>(lexer: &mut L, state: StateId, mut step: F) -> bool
where
    L: Lexer + ?Sized,
    F: FnMut(&mut LexRun, &mut L) -> Step,
{
    let mut run = LexRun::start(lexer, state);
    loop {
        match step(&mut run, lexer) {
            Step::Advance(next) => run.advance(lexer, next),
            Step::Skip(next) => run.skip(lexer, next),
            Step::End => {
                log::trace!(
                    "lex run ended in state {} (accepted = {})",
                    run.state,
                    run.result
                );
                return run.end();
            }
        }
    }
}
