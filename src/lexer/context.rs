// src/lexer/context.rs
use std::ops::Range;

use crate::symbol::{SYM_END, Symbol};

/// The cursor a scanning routine drives.
///
/// Owned by the caller (normally the parse engine). All operations are plain
/// synchronous calls; `advance` is where the caller may pull in more text.
pub trait Lexer {
    /// Current lookahead codepoint, `'\0'` at end of input.
    fn lookahead(&self) -> char;

    fn set_result_symbol(&mut self, symbol: Symbol);

    fn result_symbol(&self) -> Symbol;

    /// Consume the lookahead. With `skip` the consumed text is excluded from
    /// the token (whitespace and other trivia).
    fn advance(&mut self, skip: bool);

    /// Snapshot the current position as the end of the token being scanned.
    fn mark_end(&mut self);

    /// Codepoints between the start of the current line and the lookahead.
    fn column(&self) -> u32;

    fn is_at_included_range_start(&self) -> bool;

    fn eof(&self) -> bool;
}

/// A recognised token: symbol plus byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    pub start: usize,
    pub len: usize,
}

impl Token {
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end()]
    }
}

/// [`Lexer`] over an in-memory `&str`, optionally restricted to a set of
/// included byte ranges (e.g. the code blocks of a template document).
#[derive(Debug, Clone)]
pub struct SourceLexer<'a> {
    text: &'a str,
    ranges: Vec<Range<usize>>,
    range_index: usize,
    position: usize,
    lookahead: char,
    token_start: usize,
    token_end: usize,
    did_mark_end: bool,
    result_symbol: Symbol,
}

impl<'a> SourceLexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_ranges(text, vec![0..text.len()])
    }

    /// Ranges must be sorted, non-overlapping and fall on char boundaries.
    /// Empty ranges are dropped; an empty list means "nothing to lex".
    pub fn with_ranges(text: &'a str, ranges: Vec<Range<usize>>) -> Self {
        let ranges: Vec<Range<usize>> = ranges
            .into_iter()
            .filter(|r| r.start < r.end && r.end <= text.len())
            .collect();
        let start = ranges.first().map_or(text.len(), |r| r.start);
        let mut lexer = Self {
            text,
            ranges,
            range_index: 0,
            position: start,
            lookahead: '\0',
            token_start: start,
            token_end: start,
            did_mark_end: false,
            result_symbol: SYM_END,
        };
        lexer.load_lookahead();
        lexer
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Moves the cursor to `position` and starts a fresh token there.
    /// Positions between included ranges snap forward to the next range.
    pub fn reset(&mut self, position: usize) {
        self.range_index = self
            .ranges
            .iter()
            .position(|r| position < r.end)
            .unwrap_or(self.ranges.len());
        self.position = match self.ranges.get(self.range_index) {
            Some(r) => position.max(r.start),
            None => self.text.len(),
        };
        self.load_lookahead();
        self.start_token();
    }

    /// Starts a new token at the current position.
    pub fn start_token(&mut self) {
        self.token_start = self.position;
        self.token_end = self.position;
        self.did_mark_end = false;
        self.result_symbol = SYM_END;
    }

    /// Closes the token after a successful scan. Without an explicit
    /// `mark_end` the token ends at the current position.
    pub fn finish_token(&mut self) -> Token {
        if !self.did_mark_end {
            self.mark_end();
        }
        Token {
            symbol: self.result_symbol,
            start: self.token_start,
            len: self.token_end.saturating_sub(self.token_start),
        }
    }

    fn load_lookahead(&mut self) {
        self.lookahead = if self.eof() {
            '\0'
        } else {
            self.text[self.position..].chars().next().unwrap_or('\0')
        };
    }
}

impl Lexer for SourceLexer<'_> {
    #[inline]
    fn lookahead(&self) -> char {
        self.lookahead
    }

    fn set_result_symbol(&mut self, symbol: Symbol) {
        self.result_symbol = symbol;
    }

    fn result_symbol(&self) -> Symbol {
        self.result_symbol
    }

    fn advance(&mut self, skip: bool) {
        if self.eof() {
            return;
        }
        self.position += self.lookahead.len_utf8();
        if let Some(range) = self.ranges.get(self.range_index) {
            if self.position >= range.end {
                self.range_index += 1;
                self.position = match self.ranges.get(self.range_index) {
                    Some(next) => next.start,
                    None => self.text.len(),
                };
            }
        }
        if skip {
            self.token_start = self.position;
        }
        self.load_lookahead();
    }

    fn mark_end(&mut self) {
        self.did_mark_end = true;
        self.token_end = self.position;
    }

    fn column(&self) -> u32 {
        let line_start = self.text[..self.position]
            .rfind('\n')
            .map_or(0, |i| i + 1);
        self.text[line_start..self.position].chars().count() as u32
    }

    fn is_at_included_range_start(&self) -> bool {
        self.ranges
            .get(self.range_index)
            .is_some_and(|r| r.start == self.position)
    }

    #[inline]
    fn eof(&self) -> bool {
        self.range_index >= self.ranges.len()
    }
}
