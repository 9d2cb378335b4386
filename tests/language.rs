//! Language aggregate: name lookups, metadata and cross-table validation.

use sitter_runtime::{
    Language,
    LanguageDef,
    SYM_ERROR,
    language::LexMode,
    sample::{self, SampleSymbol as Sym, symbols::*},
};

fn def() -> LanguageDef {
    sample::language_def().expect("sample definition")
}

fn language() -> Language {
    Language::new(def()).expect("sample language validates")
}

#[test]
fn symbol_names_and_metadata() {
    let l = language();
    assert_eq!(l.symbol_name(Sym::Expression.id()), Some("expression"));
    assert_eq!(l.symbol_name(Sym::Literal.id()), Some("literal"));
    assert_eq!(l.symbol_name(SYM_ERROR), Some("ERROR"));
    assert_eq!(l.symbol_name(100), None);

    assert!(l.symbol_metadata(Sym::Number.id()).named);
    assert!(!l.symbol_metadata(Sym::Plus.id()).named);
    assert!(l.symbol_metadata(Sym::Plus.id()).visible);
    assert!(!l.symbol_metadata(Sym::End.id()).visible);
    assert!(!l.symbol_metadata(100).visible);
}

#[test]
fn symbol_for_name_respects_namedness() {
    let l = language();
    assert_eq!(l.symbol_for_name("number", true), Some(Sym::Number.id()));
    assert_eq!(l.symbol_for_name("number", false), None);
    assert_eq!(l.symbol_for_name("+", false), Some(Sym::Plus.id()));
    assert_eq!(l.symbol_for_name("+", true), None);
    assert_eq!(l.symbol_for_name("literal", true), Some(Sym::Literal.id()));
    assert_eq!(l.symbol_for_name("ERROR", true), Some(SYM_ERROR));
    // hidden symbols cannot be looked up by name
    assert_eq!(l.symbol_for_name("end", true), None);
    assert_eq!(l.symbol_for_name("nope", true), None);
}

#[test]
fn public_symbols_collapse_duplicates() {
    let mut d = def();
    // make `literal` a second spelling of `number`
    d.symbol_names[Sym::Literal.id() as usize] = "number".to_string();
    d.public_symbol_map[Sym::Literal.id() as usize] = Sym::Number.id();
    let l = Language::new(d).expect("valid");
    assert_eq!(l.public_symbol(Sym::Literal.id()), Sym::Number.id());
    assert_eq!(l.symbol_for_name("number", true), Some(Sym::Number.id()));
    assert_eq!(l.public_symbol(SYM_ERROR), SYM_ERROR);
}

#[test]
fn fields() {
    let l = language();
    assert_eq!(l.field_count(), 4);
    assert_eq!(l.field_name(0), None);
    assert_eq!(l.field_name(FIELD_LEFT), Some("left"));
    assert_eq!(l.field_name(9), None);
    assert_eq!(l.field_id_for_name("right"), Some(FIELD_RIGHT));
    assert_eq!(l.field_id_for_name("middle"), None);

    let binary: Vec<_> = l
        .fields_for(PROD_BINARY)
        .iter()
        .map(|e| (e.field_id, e.child_index))
        .collect();
    assert_eq!(binary, [(FIELD_LEFT, 0), (FIELD_OPERATOR, 1), (FIELD_RIGHT, 2)]);
    assert!(l.fields_for(PROD_LITERAL).is_empty());
    assert!(l.fields_for(99).is_empty());
}

#[test]
fn aliases() {
    let l = language();
    assert_eq!(l.alias_for(PROD_LITERAL, 0), Some(Sym::Literal.id()));
    assert_eq!(l.alias_for(PROD_LITERAL, 1), None);
    assert_eq!(l.alias_for(PROD_BINARY, 0), None);
    assert_eq!(l.alias_for(PROD_LITERAL, 3), None);
    assert_eq!(
        l.aliases_for_symbol(Sym::Number.id()),
        [Sym::Number.id(), Sym::Literal.id()]
    );
    assert_eq!(l.aliases_for_symbol(Sym::Plus.id()), [Sym::Plus.id()]);
}

#[test]
fn states_and_modes() {
    let l = language();
    assert_eq!(l.state_count(), sample::STATE_COUNT);
    assert_eq!(l.primary_state(5), 5);
    assert_eq!(l.primary_state(500), 500);
    assert_eq!(l.lex_mode(1).external_lex_state, 1);
    assert_eq!(l.lex_mode(500), LexMode::default());
    assert_eq!(l.keyword_capture_token(), None);
    assert!(l.keyword_lex_fn().is_none());
    assert!(l.has_actions(1, Sym::Number.id()));
    assert!(l.has_reduce_action(6, Sym::Plus.id()));
    assert_eq!(l.next_state(1, Sym::HeredocStart.id()), 7);
}

fn rejects(edit: impl FnOnce(&mut LanguageDef)) -> String {
    let mut d = def();
    edit(&mut d);
    match Language::new(d) {
        Ok(_) => panic!("definition should be rejected"),
        Err(e) => format!("{e:#}"),
    }
}

#[test]
fn version_range() {
    assert!(rejects(|d| d.version = 12).contains("version"));
    assert!(rejects(|d| d.version = 15).contains("version"));
    let mut d = def();
    d.version = 13;
    assert!(Language::new(d).is_ok());
}

#[test]
fn count_mismatches_are_rejected() {
    rejects(|d| d.state_count += 1);
    rejects(|d| d.token_count -= 1);
    rejects(|d| d.external_token_count = TOKEN_COUNT + 1);
    rejects(|d| {
        d.symbol_names.pop();
    });
    rejects(|d| {
        d.field_names.push(Some("extra".into()));
    });
    rejects(|d| d.field_names[0] = Some("zero".into()));
    rejects(|d| {
        d.lex_modes.pop();
    });
    rejects(|d| d.max_alias_sequence_length = 2);
    rejects(|d| d.public_symbol_map[0] = 200);
    rejects(|d| {
        d.primary_state_ids.pop();
    });
}

#[test]
fn nested_table_errors_carry_context() {
    let msg = rejects(|d| d.field_map.entries[0].field_id = 9);
    assert!(msg.contains("field map"), "{msg}");
    let msg = rejects(|d| d.alias_sequences.symbols[0] = 300);
    assert!(msg.contains("aliases"), "{msg}");
    let msg = rejects(|d| {
        d.external_scanner.symbol_map.pop();
    });
    assert!(msg.contains("external scanner"), "{msg}");
}

#[test]
fn external_and_keyword_consistency() {
    // external token mapped to a nonterminal
    rejects(|d| d.external_scanner.symbol_map[0] = Sym::Expression.id());
    // a state pointing past the validity matrix
    rejects(|d| d.lex_modes[3].external_lex_state = 3);
    // keyword capture without a keyword lexer
    rejects(|d| d.keyword_capture_token = Sym::Number.id());
}
