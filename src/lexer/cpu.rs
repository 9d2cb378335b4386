// src/lexer/cpu.rs
// Token-stream driver: runs a lex function repeatedly over a whole input.
// The parse engine normally picks the lex state per parse state; this helper
// uses one fixed lex state, which is what the demo binary and tests need.

use anyhow::{Result, bail};

use super::{
    context::{Lexer, SourceLexer, Token},
    protocol::LexFn,
};
use crate::symbol::{SYM_END, StateId};

fn slice_dbg(src: &str, i: usize) -> (usize, String) {
    let bytes = src.as_bytes();
    let lo = i.saturating_sub(16);
    let hi = (i + 16).min(bytes.len());
    let mut s = String::new();
    for &b in &bytes[lo..hi] {
        s.push(
            if b.is_ascii_graphic() || b == b' ' || b == b'\n' || b == b'\t' || b == b'\r' {
                b as char
            } else {
                '·'
            },
        );
    }
    (lo, s)
}

/// Lexes `input` from start to end in `lex_state`.
///
/// Returns every token up to (not including) end of input. Fails on the
/// first position where the lex function accepts nothing, unless only
/// skipped trivia remained.
pub fn tokenize(lex_fn: LexFn, input: &str, lex_state: StateId) -> Result<Vec<Token>> {
    let mut lexer = SourceLexer::new(input);
    let mut out: Vec<Token> = Vec::new();

    while !lexer.eof() {
        lexer.start_token();
        if !lex_fn(&mut lexer, lex_state) {
            if lexer.token_start() >= input.len() {
                // only trivia was left
                break;
            }
            let at = lexer.token_start();
            let c = input[at..].chars().next().unwrap_or('\0');
            let (ctx_lo, ctx) = slice_dbg(input, at);
            bail!(
                "no token at byte {at} (char {c:?}) in lex state {lex_state}; \
                 context [{}..{}):\n{}",
                ctx_lo,
                ctx_lo + ctx.len(),
                ctx
            );
        }

        let tok = lexer.finish_token();
        if tok.symbol == SYM_END {
            break;
        }
        if tok.len == 0 {
            bail!(
                "lex function accepted empty token {} at byte {}",
                tok.symbol,
                tok.start
            );
        }
        log::trace!("token {} at {}..{}", tok.symbol, tok.start, tok.end());
        out.push(tok);

        // The automaton may have looked past the accepted end.
        lexer.reset(tok.end());
    }

    Ok(out)
}
