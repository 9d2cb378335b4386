//! Negative lexer tests: inputs the sample lexer must reject.

use sitter_runtime::{sample::lex, tokenize};

fn lex_all(src: &str) -> anyhow::Result<Vec<sitter_runtime::Token>> {
    tokenize(lex::lex, src, lex::START.id())
}

#[test]
fn unknown_character() {
    let src = "1 + x";
    let err = lex_all(src).expect_err("'x' is not a token");
    assert!(format!("{err}").contains("byte 4"), "{err}");
}

#[test]
fn minus_is_not_an_operator() {
    assert!(lex_all("1 - 2").is_err(), "no '-' in the grammar");
}

#[test]
fn heredoc_needs_the_external_scanner() {
    assert!(lex_all("<<EOF\nx\nEOF").is_err(), "'<' is only an external token");
}

#[test]
fn non_ascii_outside_comments() {
    assert!(lex_all("1 + ２").is_err(), "fullwidth digit is not a number");
}

#[test]
fn nul_byte_mid_input() {
    assert!(lex_all("1\0+2").is_err(), "NUL is not end of input");
}

#[test]
fn trailing_trivia_is_fine() {
    let tokens = lex_all("1 +\t2 \n\n").expect("valid input");
    assert_eq!(tokens.len(), 3);
}

#[test]
fn comment_may_hold_anything_but_newline() {
    let src = "# ünïcödé 中 😀 <<EOF\n7";
    let tokens = lex_all(src).expect("valid input");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].text(src), "# ünïcödé 中 😀 <<EOF");
    assert_eq!(tokens[1].text(src), "7");
}
