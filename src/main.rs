// src/main.rs
// Demo: lex a program with the bundled sample grammar and print its tokens,
// then run the heredoc scanner over a heredoc.
// Usage:
//   cargo run                      # built-in sample
//   cargo run -- /path/to/input    # lex a file instead

use std::{env, fs};

use anyhow::{Context, Result, bail};
use sitter_runtime::{Language, SourceLexer, sample, tokenize};

fn main() {
    if let Err(e) = run() {
        eprintln!("lex error: {e:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let language = sample::language()?;

    let src = match env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("read {path}"))?,
        None => "1 + 22 # a comment\n  + 333\n".to_string(),
    };

    let lex_state = language.lex_mode(1).lex_state;
    let tokens = tokenize(language.lex_fn(), &src, lex_state)?;
    println!("TOKENS:");
    for t in tokens {
        let name = language.symbol_name(t.symbol).unwrap_or("?");
        println!("{name:<10} {:?}", t.text(&src));
    }

    heredoc_demo(&language)
}

fn heredoc_demo(language: &Language) -> Result<()> {
    let src = "<<EOF\nhello\nworld\nEOF";
    let Some(mut scanner) = language.external_scanner() else {
        bail!("sample grammar has no external scanner");
    };
    let mut lexer = SourceLexer::new(src);

    println!("HEREDOC:");
    // parse states 1 and 7 expect the start and the body respectively
    for state in [1, 7] {
        let valid = language.enabled_external_tokens(language.lex_mode(state).external_lex_state);
        if !scanner.scan(&mut lexer, valid) {
            bail!("external scanner found nothing in state {state}");
        }
        let mut t = lexer.finish_token();
        t.symbol = language
            .external_symbol(t.symbol)
            .context("external token without a symbol")?;
        let name = language.symbol_name(t.symbol).unwrap_or("?");
        println!("{name:<14} {:?}", t.text(src));
        lexer.reset(t.end());
    }
    let snapshot = scanner.serialize()?;
    println!("[demo] scanner state after the body: {} bytes", snapshot.len());
    Ok(())
}
