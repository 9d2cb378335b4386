//! Drives the sample grammar end to end with a minimal LR loop: lex modes,
//! external lex states, extras, fields and aliases all take part.

use anyhow::{Context, Result, bail};
use sitter_runtime::{
    FieldId,
    Language,
    ParseAction,
    ScannerSession,
    SourceLexer,
    StateId,
    Symbol,
    Token,
    sample,
};

#[derive(Debug, Clone)]
struct Node {
    symbol: Symbol,
    field: Option<FieldId>,
    extra: bool,
    children: Vec<Node>,
}

fn next_token(
    language: &Language,
    scanner: &mut Option<ScannerSession>,
    lexer: &mut SourceLexer<'_>,
    state: StateId,
) -> Result<Token> {
    let start = lexer.position();
    let mode = language.lex_mode(state);
    if let Some(scanner) = scanner.as_mut() {
        let valid = language.enabled_external_tokens(mode.external_lex_state);
        if scanner.scan(lexer, valid) {
            let mut t = lexer.finish_token();
            t.symbol = language
                .external_symbol(t.symbol)
                .context("unknown external token")?;
            lexer.reset(t.end());
            return Ok(t);
        }
        lexer.reset(start);
    }
    if !(language.lex_fn())(lexer, mode.lex_state) {
        bail!("lex error at byte {}", lexer.token_start());
    }
    let t = lexer.finish_token();
    lexer.reset(t.end());
    Ok(t)
}

fn parse(language: &Language, src: &str) -> Result<Vec<Node>> {
    let mut scanner = language.external_scanner();
    let mut lexer = SourceLexer::new(src);
    let mut states: Vec<StateId> = vec![1];
    let mut nodes: Vec<Node> = Vec::new();

    let mut token = next_token(language, &mut scanner, &mut lexer, 1)?;
    loop {
        let state = *states.last().context("empty stack")?;
        let Some(&action) = language.lookup(state, token.symbol).iter().next() else {
            bail!(
                "syntax error: {:?} in state {state}",
                language.symbol_name(token.symbol)
            );
        };
        match action {
            ParseAction::Shift { state: to, extra, .. } => {
                nodes.push(Node {
                    symbol: token.symbol,
                    field: None,
                    extra,
                    children: Vec::new(),
                });
                let next = if extra { state } else { to };
                states.push(next);
                token = next_token(language, &mut scanner, &mut lexer, next)?;
            }
            ParseAction::Reduce {
                symbol,
                child_count,
                production_id,
                ..
            } => {
                let mut trailing = Vec::new();
                while nodes.last().is_some_and(|n| n.extra) {
                    trailing.extend(nodes.pop());
                    states.pop();
                }
                let mut children = Vec::new();
                let mut structural = 0;
                while structural < child_count as usize {
                    let node = nodes.pop().context("stack underflow")?;
                    states.pop();
                    if !node.extra {
                        structural += 1;
                    }
                    children.push(node);
                }
                children.reverse();

                let mut index = 0u16;
                for child in children.iter_mut().filter(|c| !c.extra) {
                    if let Some(alias) = language.alias_for(production_id, index) {
                        child.symbol = alias;
                    }
                    child.field = language
                        .fields_for(production_id)
                        .iter()
                        .find(|e| e.child_index as u16 == index)
                        .map(|e| e.field_id);
                    index += 1;
                }

                let below = *states.last().context("empty stack")?;
                let goto = language.next_state(below, symbol);
                nodes.push(Node {
                    symbol,
                    field: None,
                    extra: false,
                    children,
                });
                states.push(goto);
                for extra in trailing.into_iter().rev() {
                    nodes.push(extra);
                    states.push(goto);
                }
            }
            ParseAction::Accept => return Ok(nodes),
            ParseAction::Recover => bail!("recover requested in state {state}"),
        }
    }
}

fn write_sexp(language: &Language, node: &Node, out: &mut String) {
    let meta = language.symbol_metadata(node.symbol);
    if !(meta.visible && meta.named) {
        return;
    }
    if !out.is_empty() {
        out.push(' ');
    }
    if let Some(f) = node.field {
        out.push_str(language.field_name(f).unwrap_or("?"));
        out.push_str(": ");
    }
    out.push('(');
    out.push_str(language.symbol_name(node.symbol).unwrap_or("?"));
    for child in &node.children {
        write_sexp(language, child, out);
    }
    out.push(')');
}

fn sexp(src: &str) -> Result<String> {
    let language = sample::language()?;
    let mut out = String::new();
    for node in parse(&language, src)? {
        write_sexp(&language, &node, &mut out);
    }
    Ok(out)
}

#[test]
fn single_sum() {
    assert_eq!(
        sexp("1 + 2").expect("parse"),
        "(source_file (expression left: (expression (literal)) right: (number)))"
    );
}

#[test]
fn lone_number_is_aliased() {
    assert_eq!(
        sexp("  42\n").expect("parse"),
        "(source_file (expression (literal)))"
    );
}

#[test]
fn comments_are_extras() {
    assert_eq!(
        sexp("1 + 22 # c\n + 333").expect("parse"),
        "(source_file (expression left: (expression left: (expression (literal)) \
         right: (number)) (comment) right: (number)))"
    );
}

#[test]
fn heredoc_goes_through_the_external_scanner() {
    assert_eq!(
        sexp("<<EOF\nhi\nEOF\n+ 1 # done\n").expect("parse"),
        "(source_file (expression left: (expression (heredoc_start) body: (heredoc_body)) \
         right: (number))) (comment)"
    );
}

#[test]
fn syntax_errors() {
    assert!(sexp("1 2").is_err());
    assert!(sexp("+ 1").is_err());
    assert!(sexp("1 +").is_err());
    assert!(sexp("<<EOF\nnever closed").is_err());
    assert!(sexp("").is_err());
}
